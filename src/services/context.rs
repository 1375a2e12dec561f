use sea_orm::DatabaseConnection;

use crate::{
    db::dao::DaoContext,
    services::{
        catalog_service::CatalogService, list_service::ListService,
        transfer_service::TransferService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn lists(&self) -> ListService {
        ListService::new(self.daos.list(), self.daos.list_item(), self.daos.catalog())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.daos.catalog())
    }

    pub fn transfer(&self) -> TransferService {
        TransferService::new(
            self.daos.db().clone(),
            self.daos.list(),
            self.daos.list_item(),
            self.daos.catalog(),
        )
    }
}
