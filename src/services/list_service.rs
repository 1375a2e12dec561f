use sea_orm::Set;
use uuid::Uuid;

use crate::{
    db::dao::{CatalogDao, DaoBase, DaoLayerError, ListDao, ListItemDao, PaginatedResponse},
    db::entities::{ItemKind, ListKind, list, list_item},
    error::AppError,
    services::transfer_service::DuplicatePolicy,
};

#[derive(Debug, Clone)]
pub struct NewList {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: ListKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Result of a single-item add against a target list. `DuplicateFound`
/// carries no row: the caller is expected to re-invoke with a resolved
/// policy.
#[derive(Debug)]
pub enum AddItemOutcome {
    Added(list_item::Model),
    SkippedDuplicate,
    DuplicateFound,
}

#[derive(Clone)]
pub struct ListService {
    list_dao: ListDao,
    item_dao: ListItemDao,
    catalog_dao: CatalogDao,
}

impl ListService {
    pub fn new(list_dao: ListDao, item_dao: ListItemDao, catalog_dao: CatalogDao) -> Self {
        Self {
            list_dao,
            item_dao,
            catalog_dao,
        }
    }

    pub async fn create_list(&self, new: NewList) -> Result<list::Model, AppError> {
        let model = list::ActiveModel {
            owner_id: Set(new.owner_id),
            name: Set(new.name),
            description: Set(new.description),
            kind: Set(new.kind.as_str().to_string()),
            icon: Set(new.icon),
            color: Set(new.color),
            is_default: Set(new.is_default),
            ..Default::default()
        };
        Ok(self.list_dao.create(model).await?)
    }

    pub async fn require_list(&self, list_id: &Uuid) -> Result<list::Model, AppError> {
        self.list_dao
            .find_by_id(*list_id)
            .await
            .map_err(|err| match err {
                DaoLayerError::NotFound { .. } => AppError::not_found("List not found"),
                other => other.into(),
            })
    }

    pub async fn lists_by_owner(&self, owner_id: &Uuid) -> Result<Vec<list::Model>, AppError> {
        Ok(self.list_dao.lists_by_owner(owner_id).await?)
    }

    pub async fn update_list(
        &self,
        list_id: &Uuid,
        update: ListUpdate,
    ) -> Result<list::Model, AppError> {
        self.require_list(list_id).await?;
        let ListUpdate {
            name,
            description,
            icon,
            color,
        } = update;
        let model = self
            .list_dao
            .update(*list_id, move |active| {
                if let Some(name) = name {
                    active.name = Set(name);
                }
                if let Some(description) = description {
                    active.description = Set(Some(description));
                }
                if let Some(icon) = icon {
                    active.icon = Set(Some(icon));
                }
                if let Some(color) = color {
                    active.color = Set(Some(color));
                }
            })
            .await?;
        Ok(model)
    }

    pub async fn delete_list(&self, list_id: &Uuid) -> Result<(), AppError> {
        let list = self.require_list(list_id).await?;
        if list.is_default {
            return Err(AppError::conflict("Default list cannot be deleted"));
        }
        self.list_dao.delete(*list_id).await?;
        Ok(())
    }

    pub async fn items_page(
        &self,
        list_id: &Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<list_item::Model>, AppError> {
        self.require_list(list_id).await?;
        let mut response = self.item_dao.list_page(list_id, page, page_size).await?;
        let total = self.item_dao.count_active(list_id).await?;
        response.total = Some(total);
        Ok(response)
    }

    pub async fn add_item(
        &self,
        list_id: &Uuid,
        item_id: &Uuid,
        kind: ItemKind,
        watched: bool,
        notes: Option<String>,
        on_duplicate: DuplicatePolicy,
    ) -> Result<AddItemOutcome, AppError> {
        if !kind.is_storable() {
            return Err(AppError::bad_request(
                "A collection cannot be added directly; transfer it to add its movies",
            ));
        }
        if on_duplicate == DuplicatePolicy::RemoveSourceOnly {
            return Err(AppError::bad_request(
                "remove_source_only applies to move operations only",
            ));
        }
        self.require_list(list_id).await?;
        if !self.catalog_dao.content_exists(item_id, kind).await? {
            return Err(AppError::not_found("Item not found"));
        }

        // Advisory probe. A failed read never blocks the add itself.
        let duplicate = match self.item_dao.exists_in_list(list_id, item_id, kind).await {
            Ok(duplicate) => duplicate,
            Err(err) => {
                tracing::warn!(error = %err, "duplicate check failed; continuing without it");
                false
            }
        };
        if duplicate {
            // With the active-row unique index a second live row can never
            // land, so every non-block policy degrades to a skip here.
            return match on_duplicate {
                DuplicatePolicy::Block => Ok(AddItemOutcome::DuplicateFound),
                _ => Ok(AddItemOutcome::SkippedDuplicate),
            };
        }

        let entry = ListItemDao::new_entry(list_id, item_id, kind, watched, notes);
        match self.item_dao.insert_entry(self.item_dao.db(), entry).await {
            Ok(model) => Ok(AddItemOutcome::Added(model)),
            // The unique index is the authority on races the probe missed.
            Err(err) if err.is_unique_violation() => match on_duplicate {
                DuplicatePolicy::Block => Ok(AddItemOutcome::DuplicateFound),
                _ => Ok(AddItemOutcome::SkippedDuplicate),
            },
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update_entry(
        &self,
        list_id: &Uuid,
        entry_id: &Uuid,
        watched: Option<bool>,
        notes: Option<String>,
    ) -> Result<list_item::Model, AppError> {
        self.item_dao
            .update_entry(list_id, entry_id, watched, notes)
            .await?
            .ok_or_else(|| AppError::not_found("List entry not found"))
    }

    pub async fn remove_entry(&self, list_id: &Uuid, entry_id: &Uuid) -> Result<(), AppError> {
        let removed = self.item_dao.soft_delete_entry(list_id, entry_id).await?;
        if !removed {
            return Err(AppError::not_found("List entry not found"));
        }
        Ok(())
    }
}
