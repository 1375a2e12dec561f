use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::list::{self, Entity as List};

#[derive(Clone)]
pub struct ListDao {
    db: DatabaseConnection,
}

impl DaoBase for ListDao {
    type Entity = List;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl ListDao {
    pub async fn lists_by_owner(&self, owner_id: &Uuid) -> DaoResult<Vec<list::Model>> {
        let owner_id = *owner_id;
        let mut pager = self.find_iter(None, None, move |query| {
            query.filter(list::Column::OwnerId.eq(owner_id))
        });
        let mut lists = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            lists.append(&mut response.data);
        }
        Ok(lists)
    }
}
