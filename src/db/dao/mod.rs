pub mod base;
pub mod base_traits;
pub mod catalog_dao;
mod context;
pub mod error;
pub mod list_dao;
pub mod list_item_dao;

pub use base::{DaoBase, DaoPager, PaginatedResponse};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use catalog_dao::CatalogDao;
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use list_dao::ListDao;
pub use list_item_dao::ListItemDao;
