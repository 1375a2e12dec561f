use std::sync::Arc;

use axum::{Router, middleware};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

use crate::{
    config::AppConfig,
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    state::AppState,
};

pub fn router_for_db(db: DatabaseConnection) -> Router {
    let cfg = AppConfig::default();
    let state = AppState::new(cfg, db);
    router(Arc::clone(&state))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
}

/// Router over an empty mock database; useful for exercising validation
/// paths that must reject before any storage access.
pub fn mock_router() -> Router {
    router_for_db(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}
