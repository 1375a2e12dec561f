use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::entities::ItemKind,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        transfer_service::{
            BulkTransferReport, BulkTransferRequest, DuplicatePolicy, ItemRef, TransferOp,
            TransferReport, TransferRequest,
        },
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub item_id: Uuid,
    pub item_type: ItemKind,
    pub source_list_id: Uuid,
    pub target_list_id: Uuid,
    pub operation: TransferOp,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Deserialize)]
pub struct BulkTransferBody {
    pub items: Vec<ItemRef>,
    pub source_list_id: Uuid,
    pub target_list_id: Uuid,
    pub operation: TransferOp,
    pub on_duplicate: DuplicatePolicy,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lists/transfer", post(transfer))
        .route("/lists/bulk-transfer", post(bulk_transfer))
        .with_state(state)
}

async fn transfer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TransferBody>,
) -> ApiResult<TransferReport> {
    let service = ServiceContext::from_state(state.as_ref()).transfer();
    let report = service
        .transfer(&TransferRequest {
            item: ItemRef {
                item_id: body.item_id,
                item_kind: body.item_type,
            },
            source_list_id: body.source_list_id,
            target_list_id: body.target_list_id,
            operation: body.operation,
            on_duplicate: body.on_duplicate,
        })
        .await?;
    JsonApiResponse::ok(report)
}

async fn bulk_transfer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BulkTransferBody>,
) -> ApiResult<BulkTransferReport> {
    let service = ServiceContext::from_state(state.as_ref()).transfer();
    let report = service
        .bulk_transfer(&BulkTransferRequest {
            items: body.items,
            source_list_id: body.source_list_id,
            target_list_id: body.target_list_id,
            operation: body.operation,
            on_duplicate: body.on_duplicate,
        })
        .await?;
    JsonApiResponse::ok(report)
}
