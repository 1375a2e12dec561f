use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{catalog, lists, public, transfer};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public::router())
        .merge(lists::router(state.clone()))
        .merge(transfer::router(state.clone()))
        .merge(catalog::router(state))
}
