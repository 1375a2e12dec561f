use anyhow::Context;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::info;

use super::providers;
use crate::config::AppConfig;

pub async fn connect(cfg: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    let db_cfg = cfg
        .database
        .as_ref()
        .context("database config missing (set APP_DATABASE__URL)")?;

    let registry = providers::default_registry()?;
    let provider = registry.provider_for_url(&db_cfg.url)?;
    let db = provider.connect(db_cfg).await?;
    provider.post_connect(&db, db_cfg).await?;

    info!("syncing database schema from entities");
    db.get_schema_registry("viewvault::db::entities::*")
        .sync(&db)
        .await?;
    ensure_list_item_indexes(&db).await?;
    Ok(db)
}

/// Applied after schema sync: the membership lookup index and the
/// active-row uniqueness constraint on list_items are required physical
/// design, and entity-level `indexed` attributes cannot express composite
/// or partial indexes.
pub async fn ensure_list_item_indexes(db: &DatabaseConnection) -> anyhow::Result<()> {
    db.execute_unprepared(
        "CREATE INDEX IF NOT EXISTS idx_list_items_membership \
         ON list_items (list_id, item_id, item_kind, deleted)",
    )
    .await?;
    db.execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS uq_list_items_active \
         ON list_items (list_id, item_id, item_kind) WHERE deleted = false",
    )
    .await?;
    Ok(())
}
