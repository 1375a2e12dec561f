use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::ItemKind;
use crate::db::entities::prelude::{Episode, Movie, Series};
use crate::db::entities::{episode, movie, series};

/// Read/write access to the shared content catalog. The primary entity is
/// the movie table; series and episodes are reached through the private
/// sub-DAOs below.
#[derive(Clone)]
pub struct CatalogDao {
    db: DatabaseConnection,
}

impl DaoBase for CatalogDao {
    type Entity = Movie;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Clone)]
struct SeriesDao {
    db: DatabaseConnection,
}

impl DaoBase for SeriesDao {
    type Entity = Series;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Clone)]
struct EpisodeDao {
    db: DatabaseConnection,
}

impl DaoBase for EpisodeDao {
    type Entity = Episode;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl CatalogDao {
    fn series_dao(&self) -> SeriesDao {
        SeriesDao::new(&self.db)
    }

    fn episode_dao(&self) -> EpisodeDao {
        EpisodeDao::new(&self.db)
    }

    pub async fn create_movie(&self, model: movie::ActiveModel) -> DaoResult<movie::Model> {
        self.create(model).await
    }

    pub async fn find_movie(&self, id: &Uuid) -> DaoResult<movie::Model> {
        self.find_by_id(*id).await
    }

    pub async fn create_series(&self, model: series::ActiveModel) -> DaoResult<series::Model> {
        self.series_dao().create(model).await
    }

    pub async fn find_series(&self, id: &Uuid) -> DaoResult<series::Model> {
        self.series_dao().find_by_id(*id).await
    }

    pub async fn create_episode(&self, model: episode::ActiveModel) -> DaoResult<episode::Model> {
        self.episode_dao().create(model).await
    }

    pub async fn find_episode(&self, id: &Uuid) -> DaoResult<episode::Model> {
        self.episode_dao().find_by_id(*id).await
    }

    pub async fn movies_in_collection(&self, collection_id: &Uuid) -> DaoResult<Vec<movie::Model>> {
        Movie::find()
            .filter(movie::Column::CollectionId.eq(*collection_id))
            .order_by(movie::Column::ReleaseDate, Order::Asc)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Id-only projection: collection expansion does not need full rows.
    pub async fn movie_ids_in_collection(&self, collection_id: &Uuid) -> DaoResult<Vec<Uuid>> {
        Movie::find()
            .select_only()
            .column(movie::Column::Id)
            .filter(movie::Column::CollectionId.eq(*collection_id))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn episodes_of_series(&self, series_id: &Uuid) -> DaoResult<Vec<episode::Model>> {
        Episode::find()
            .filter(episode::Column::SeriesId.eq(*series_id))
            .order_by(episode::Column::Season, Order::Asc)
            .order_by(episode::Column::Number, Order::Asc)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Id-only projection: series expansion does not need full rows.
    pub async fn episode_ids_of_series(&self, series_id: &Uuid) -> DaoResult<Vec<Uuid>> {
        Episode::find()
            .select_only()
            .column(episode::Column::Id)
            .filter(episode::Column::SeriesId.eq(*series_id))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Does a catalog row of the given kind exist? `collection` resolves
    /// through its member movies and is answered by expansion instead.
    pub async fn content_exists(&self, id: &Uuid, kind: ItemKind) -> DaoResult<bool> {
        let count = match kind {
            ItemKind::Movie => Movie::find_by_id(*id).count(&self.db).await,
            ItemKind::Series => Series::find_by_id(*id).count(&self.db).await,
            ItemKind::Episode => Episode::find_by_id(*id).count(&self.db).await,
            ItemKind::Collection => {
                Movie::find()
                    .filter(movie::Column::CollectionId.eq(*id))
                    .count(&self.db)
                    .await
            }
        }
        .map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }
}
