use chrono::NaiveDate;
use sea_orm::Set;
use uuid::Uuid;

use crate::{
    db::dao::{CatalogDao, DaoLayerError},
    db::entities::{episode, movie, series},
    error::AppError,
};

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub poster_url: Option<String>,
    pub quality: Option<String>,
    pub overview: Option<String>,
    pub collection_id: Option<Uuid>,
    pub collection_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSeries {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub season: i32,
    pub number: i32,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub overview: Option<String>,
}

#[derive(Clone)]
pub struct CatalogService {
    catalog_dao: CatalogDao,
}

impl CatalogService {
    pub fn new(catalog_dao: CatalogDao) -> Self {
        Self { catalog_dao }
    }

    pub async fn create_movie(&self, new: NewMovie) -> Result<movie::Model, AppError> {
        let model = movie::ActiveModel {
            title: Set(new.title),
            release_date: Set(new.release_date),
            runtime_minutes: Set(new.runtime_minutes),
            poster_url: Set(new.poster_url),
            quality: Set(new.quality),
            overview: Set(new.overview),
            collection_id: Set(new.collection_id),
            collection_name: Set(new.collection_name),
            ..Default::default()
        };
        Ok(self.catalog_dao.create_movie(model).await?)
    }

    pub async fn require_movie(&self, id: &Uuid) -> Result<movie::Model, AppError> {
        self.catalog_dao.find_movie(id).await.map_err(|err| match err {
            DaoLayerError::NotFound { .. } => AppError::not_found("Movie not found"),
            other => other.into(),
        })
    }

    pub async fn movies_in_collection(
        &self,
        collection_id: &Uuid,
    ) -> Result<Vec<movie::Model>, AppError> {
        Ok(self.catalog_dao.movies_in_collection(collection_id).await?)
    }

    pub async fn create_series(&self, new: NewSeries) -> Result<series::Model, AppError> {
        let model = series::ActiveModel {
            title: Set(new.title),
            release_date: Set(new.release_date),
            poster_url: Set(new.poster_url),
            overview: Set(new.overview),
            ..Default::default()
        };
        Ok(self.catalog_dao.create_series(model).await?)
    }

    pub async fn require_series(&self, id: &Uuid) -> Result<series::Model, AppError> {
        self.catalog_dao.find_series(id).await.map_err(|err| match err {
            DaoLayerError::NotFound { .. } => AppError::not_found("Series not found"),
            other => other.into(),
        })
    }

    pub async fn create_episode(
        &self,
        series_id: &Uuid,
        new: NewEpisode,
    ) -> Result<episode::Model, AppError> {
        self.require_series(series_id).await?;
        let model = episode::ActiveModel {
            series_id: Set(*series_id),
            season: Set(new.season),
            number: Set(new.number),
            title: Set(new.title),
            release_date: Set(new.release_date),
            runtime_minutes: Set(new.runtime_minutes),
            overview: Set(new.overview),
            ..Default::default()
        };
        Ok(self.catalog_dao.create_episode(model).await?)
    }

    pub async fn episodes_of_series(
        &self,
        series_id: &Uuid,
    ) -> Result<Vec<episode::Model>, AppError> {
        self.require_series(series_id).await?;
        Ok(self.catalog_dao.episodes_of_series(series_id).await?)
    }
}
