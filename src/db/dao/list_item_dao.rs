use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::ItemKind;
use crate::db::entities::list_item::{self, Entity as ListItem};

#[derive(Clone)]
pub struct ListItemDao {
    db: DatabaseConnection,
}

impl DaoBase for ListItemDao {
    type Entity = ListItem;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// OR of (item_id, item_kind) equality pairs, used to match a candidate
/// set against stored rows in one query.
fn pair_condition(pairs: &[(Uuid, ItemKind)]) -> Condition {
    pairs.iter().fold(Condition::any(), |cond, (item_id, kind)| {
        cond.add(
            Condition::all()
                .add(list_item::Column::ItemId.eq(*item_id))
                .add(list_item::Column::ItemKind.eq(kind.as_str())),
        )
    })
}

impl ListItemDao {
    /// Duplicate probe: does the target list already hold a live entry for
    /// this item? Bounded by the (list_id, item_id, item_kind, deleted)
    /// index.
    pub async fn exists_in_list(
        &self,
        list_id: &Uuid,
        item_id: &Uuid,
        kind: ItemKind,
    ) -> DaoResult<bool> {
        let count = ListItem::find()
            .filter(list_item::Column::ListId.eq(*list_id))
            .filter(list_item::Column::ItemId.eq(*item_id))
            .filter(list_item::Column::ItemKind.eq(kind.as_str()))
            .filter(list_item::Column::Deleted.eq(false))
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    /// All live rows of `list_id` matching any of the candidate pairs, in
    /// one round trip.
    pub async fn find_active_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        list_id: &Uuid,
        pairs: &[(Uuid, ItemKind)],
    ) -> DaoResult<Vec<list_item::Model>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        ListItem::find()
            .filter(list_item::Column::ListId.eq(*list_id))
            .filter(list_item::Column::Deleted.eq(false))
            .filter(pair_condition(pairs))
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_active_entry(
        &self,
        list_id: &Uuid,
        entry_id: &Uuid,
    ) -> DaoResult<Option<list_item::Model>> {
        self.find(1, 1, None, |query| {
            query
                .filter(list_item::Column::Id.eq(*entry_id))
                .filter(list_item::Column::ListId.eq(*list_id))
                .filter(list_item::Column::Deleted.eq(false))
        })
        .await
        .map(|response| response.data.into_iter().next())
    }

    pub async fn list_page(
        &self,
        list_id: &Uuid,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<list_item::Model>> {
        let list_id = *list_id;
        self.find(page, page_size, None, move |query| {
            query
                .filter(list_item::Column::ListId.eq(list_id))
                .filter(list_item::Column::Deleted.eq(false))
        })
        .await
    }

    pub async fn count_active(&self, list_id: &Uuid) -> DaoResult<u64> {
        ListItem::find()
            .filter(list_item::Column::ListId.eq(*list_id))
            .filter(list_item::Column::Deleted.eq(false))
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Fully-populated row for insertion; ids and timestamps are assigned
    /// here so batches can be built ahead of the owning transaction.
    pub fn new_entry(
        list_id: &Uuid,
        item_id: &Uuid,
        kind: ItemKind,
        watched: bool,
        notes: Option<String>,
    ) -> list_item::ActiveModel {
        let now = Utc::now().fixed_offset();
        list_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            list_id: Set(*list_id),
            item_id: Set(*item_id),
            item_kind: Set(kind.as_str().to_string()),
            watched: Set(watched),
            notes: Set(notes),
            deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    pub async fn insert_entry<C: ConnectionTrait>(
        &self,
        conn: &C,
        entry: list_item::ActiveModel,
    ) -> DaoResult<list_item::Model> {
        use sea_orm::ActiveModelTrait;
        entry.insert(conn).await.map_err(DaoLayerError::Db)
    }

    /// Batched insert; one statement regardless of batch size. Returns the
    /// number of rows written.
    pub async fn insert_entries<C: ConnectionTrait>(
        &self,
        conn: &C,
        entries: Vec<list_item::ActiveModel>,
    ) -> DaoResult<u64> {
        if entries.is_empty() {
            return Ok(0);
        }
        ListItem::insert_many(entries)
            .exec_without_returning(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Batched soft delete of live rows matching the candidate pairs.
    /// Returns the number of rows actually flagged.
    pub async fn soft_delete_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        list_id: &Uuid,
        pairs: &[(Uuid, ItemKind)],
    ) -> DaoResult<u64> {
        if pairs.is_empty() {
            return Ok(0);
        }
        let result = ListItem::update_many()
            .col_expr(list_item::Column::Deleted, Expr::value(true))
            .col_expr(
                list_item::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(list_item::Column::ListId.eq(*list_id))
            .filter(list_item::Column::Deleted.eq(false))
            .filter(pair_condition(pairs))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }

    pub async fn soft_delete_entry(&self, list_id: &Uuid, entry_id: &Uuid) -> DaoResult<bool> {
        let result = ListItem::update_many()
            .col_expr(list_item::Column::Deleted, Expr::value(true))
            .col_expr(
                list_item::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(list_item::Column::Id.eq(*entry_id))
            .filter(list_item::Column::ListId.eq(*list_id))
            .filter(list_item::Column::Deleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected > 0)
    }

    pub async fn update_entry(
        &self,
        list_id: &Uuid,
        entry_id: &Uuid,
        watched: Option<bool>,
        notes: Option<String>,
    ) -> DaoResult<Option<list_item::Model>> {
        let Some(_) = self.find_active_entry(list_id, entry_id).await? else {
            return Ok(None);
        };
        let model = self
            .update(*entry_id, move |active| {
                if let Some(watched) = watched {
                    active.watched = Set(watched);
                }
                if let Some(notes) = notes {
                    active.notes = Set(Some(notes));
                }
            })
            .await?;
        Ok(Some(model))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::ListItemDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::ItemKind;
    use crate::db::entities::list_item;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn entry_model(list_id: Uuid, item_id: Uuid, kind: ItemKind) -> list_item::Model {
        let now = ts();
        list_item::Model {
            id: Uuid::new_v4(),
            list_id,
            item_id,
            item_kind: kind.as_str().to_string(),
            watched: false,
            notes: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn count_row(count: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        std::collections::BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(count)))])
    }

    #[tokio::test]
    async fn exists_in_list_is_true_when_a_live_row_matches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .into_connection();
        let dao = ListItemDao::new(&db);

        let exists = dao
            .exists_in_list(&Uuid::new_v4(), &Uuid::new_v4(), ItemKind::Movie)
            .await
            .expect("probe should succeed");
        assert!(exists);
    }

    #[tokio::test]
    async fn exists_in_list_is_false_without_matches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .into_connection();
        let dao = ListItemDao::new(&db);

        let exists = dao
            .exists_in_list(&Uuid::new_v4(), &Uuid::new_v4(), ItemKind::Episode)
            .await
            .expect("probe should succeed");
        assert!(!exists);
    }

    #[tokio::test]
    async fn find_active_many_short_circuits_on_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = ListItemDao::new(&db);

        let rows = dao
            .find_active_many(&db, &Uuid::new_v4(), &[])
            .await
            .expect("empty candidate set should not touch the database");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn find_active_many_returns_matching_rows() {
        let list_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[entry_model(list_id, item_id, ItemKind::Movie)]])
            .into_connection();
        let dao = ListItemDao::new(&db);

        let rows = dao
            .find_active_many(&db, &list_id, &[(item_id, ItemKind::Movie)])
            .await
            .expect("query should succeed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, item_id);
    }

    #[tokio::test]
    async fn insert_entries_short_circuits_on_empty_batch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = ListItemDao::new(&db);

        let inserted = dao
            .insert_entries(&db, Vec::new())
            .await
            .expect("empty batch should be a no-op");
        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn soft_delete_many_reports_affected_rows() {
        let list_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let dao = ListItemDao::new(&db);

        let removed = dao
            .soft_delete_many(
                &db,
                &list_id,
                &[
                    (Uuid::new_v4(), ItemKind::Episode),
                    (Uuid::new_v4(), ItemKind::Episode),
                ],
            )
            .await
            .expect("update should succeed");
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn update_entry_returns_none_when_entry_is_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<list_item::Model>::new()])
            .into_connection();
        let dao = ListItemDao::new(&db);

        let result = dao
            .update_entry(&Uuid::new_v4(), &Uuid::new_v4(), Some(true), None)
            .await
            .expect("query should succeed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn count_active_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("count failed".to_string())])
            .into_connection();
        let dao = ListItemDao::new(&db);

        let err = dao
            .count_active(&Uuid::new_v4())
            .await
            .expect_err("count should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
