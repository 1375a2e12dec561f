use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::entities::{ItemKind, ListKind, list, list_item},
    error::AppError,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        list_service::{AddItemOutcome, ListUpdate, NewList},
        transfer_service::DuplicatePolicy,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub kind: ListKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item_id: Uuid,
    pub item_type: ItemKind,
    #[serde(default)]
    pub watched: bool,
    pub notes: Option<String>,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub watched: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct ListItemResponse {
    pub id: Uuid,
    pub list_id: Uuid,
    pub item_id: Uuid,
    pub item_type: String,
    pub watched: bool,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct ListItemsPageResponse {
    pub items: Vec<ListItemResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub status: String,
    pub entry: Option<ListItemResponse>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lists", post(create_list).get(list_lists))
        .route(
            "/lists/{list_id}",
            get(get_list).patch(update_list).delete(delete_list),
        )
        .route("/lists/{list_id}/items", post(add_item).get(list_items))
        .route(
            "/lists/{list_id}/items/{entry_id}",
            patch(update_entry).delete(remove_entry),
        )
        .with_state(state)
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateListRequest>,
) -> ApiResult<ListResponse> {
    let name = normalize_name(&body.name)?;
    let service = ServiceContext::from_state(state.as_ref()).lists();
    let created = service
        .create_list(NewList {
            owner_id: body.owner_id,
            name: name.to_string(),
            description: body.description,
            kind: body.kind,
            icon: body.icon,
            color: body.color,
            is_default: body.is_default,
        })
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", created.into())
}

async fn list_lists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Vec<ListResponse>> {
    let service = ServiceContext::from_state(state.as_ref()).lists();
    let lists = service.lists_by_owner(&query.owner_id).await?;
    JsonApiResponse::ok(lists.into_iter().map(ListResponse::from).collect())
}

async fn get_list(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<Uuid>,
) -> ApiResult<ListResponse> {
    let service = ServiceContext::from_state(state.as_ref()).lists();
    let list = service.require_list(&list_id).await?;
    JsonApiResponse::ok(list.into())
}

async fn update_list(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<Uuid>,
    Json(body): Json<UpdateListRequest>,
) -> ApiResult<ListResponse> {
    let name = match body.name {
        Some(value) => Some(normalize_name(&value)?.to_string()),
        None => None,
    };
    if name.is_none() && body.description.is_none() && body.icon.is_none() && body.color.is_none()
    {
        return Err(AppError::bad_request("Nothing to update"));
    }
    let service = ServiceContext::from_state(state.as_ref()).lists();
    let updated = service
        .update_list(
            &list_id,
            ListUpdate {
                name,
                description: body.description,
                icon: body.icon,
                color: body.color,
            },
        )
        .await?;
    JsonApiResponse::ok(updated.into())
}

async fn delete_list(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let service = ServiceContext::from_state(state.as_ref()).lists();
    service.delete_list(&list_id).await?;
    JsonApiResponse::with_status(StatusCode::NO_CONTENT, "deleted", serde_json::Value::Null)
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<Uuid>,
    Json(body): Json<AddItemRequest>,
) -> ApiResult<AddItemResponse> {
    let service = ServiceContext::from_state(state.as_ref()).lists();
    let outcome = service
        .add_item(
            &list_id,
            &body.item_id,
            body.item_type,
            body.watched,
            body.notes,
            body.on_duplicate,
        )
        .await?;
    match outcome {
        AddItemOutcome::Added(entry) => JsonApiResponse::with_status(
            StatusCode::CREATED,
            "created",
            AddItemResponse {
                status: "ok".to_string(),
                entry: Some(entry.into()),
            },
        ),
        AddItemOutcome::SkippedDuplicate => JsonApiResponse::with_status(
            StatusCode::OK,
            "skipped duplicate",
            AddItemResponse {
                status: "ok".to_string(),
                entry: None,
            },
        ),
        AddItemOutcome::DuplicateFound => JsonApiResponse::with_status(
            StatusCode::OK,
            "duplicate_found",
            AddItemResponse {
                status: "duplicate_found".to_string(),
                entry: None,
            },
        ),
    }
}

async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<ListItemsPageResponse> {
    let page = query.page.unwrap_or(1);
    let page_size = query
        .page_size
        .unwrap_or(state.config.general.default_page_size);
    let service = ServiceContext::from_state(state.as_ref()).lists();
    let response = service.items_page(&list_id, page, page_size).await?;

    let total_items = response.total.unwrap_or(response.data.len() as u64);
    let total_pages = total_items.div_ceil(page_size);
    let pagination = PaginationMeta {
        page: response.page,
        page_size: response.page_size,
        total_items,
        total_pages,
        has_more: response.has_next,
    };
    JsonApiResponse::ok(ListItemsPageResponse {
        items: response
            .data
            .into_iter()
            .map(ListItemResponse::from)
            .collect(),
        pagination,
    })
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    Path((list_id, entry_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateEntryRequest>,
) -> ApiResult<ListItemResponse> {
    if body.watched.is_none() && body.notes.is_none() {
        return Err(AppError::bad_request("Watched or notes required"));
    }
    let service = ServiceContext::from_state(state.as_ref()).lists();
    let entry = service
        .update_entry(&list_id, &entry_id, body.watched, body.notes)
        .await?;
    JsonApiResponse::ok(entry.into())
}

async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Path((list_id, entry_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<serde_json::Value> {
    let service = ServiceContext::from_state(state.as_ref()).lists();
    service.remove_entry(&list_id, &entry_id).await?;
    JsonApiResponse::with_status(StatusCode::NO_CONTENT, "deleted", serde_json::Value::Null)
}

fn normalize_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Name required"));
    }
    Ok(trimmed)
}

impl From<list::Model> for ListResponse {
    fn from(model: list::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            description: model.description,
            kind: model.kind,
            icon: model.icon,
            color: model.color,
            is_default: model.is_default,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<list_item::Model> for ListItemResponse {
    fn from(model: list_item::Model) -> Self {
        Self {
            id: model.id,
            list_id: model.list_id,
            item_id: model.item_id,
            item_type: model.item_kind,
            watched: model.watched,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
