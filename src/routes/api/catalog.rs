use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::entities::{episode, movie, series},
    error::AppError,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        catalog_service::{NewEpisode, NewMovie, NewSeries},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub poster_url: Option<String>,
    pub quality: Option<String>,
    pub overview: Option<String>,
    pub collection_id: Option<Uuid>,
    pub collection_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSeriesRequest {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEpisodeRequest {
    pub season: i32,
    pub number: i32,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub overview: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    pub collection_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: Uuid,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub poster_url: Option<String>,
    pub quality: Option<String>,
    pub overview: Option<String>,
    pub collection_id: Option<Uuid>,
    pub collection_name: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub id: Uuid,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct EpisodeResponse {
    pub id: Uuid,
    pub series_id: Uuid,
    pub season: i32,
    pub number: i32,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub overview: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/movies", post(create_movie).get(list_movies))
        .route("/movies/{movie_id}", get(get_movie))
        .route("/series", post(create_series))
        .route("/series/{series_id}", get(get_series))
        .route(
            "/series/{series_id}/episodes",
            post(create_episode).get(list_episodes),
        )
        .with_state(state)
}

async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMovieRequest>,
) -> ApiResult<MovieResponse> {
    let title = normalize_title(&body.title)?;
    let service = ServiceContext::from_state(state.as_ref()).catalog();
    let movie = service
        .create_movie(NewMovie {
            title: title.to_string(),
            release_date: body.release_date,
            runtime_minutes: body.runtime_minutes,
            poster_url: body.poster_url,
            quality: body.quality,
            overview: body.overview,
            collection_id: body.collection_id,
            collection_name: body.collection_name,
        })
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", movie.into())
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<Uuid>,
) -> ApiResult<MovieResponse> {
    let service = ServiceContext::from_state(state.as_ref()).catalog();
    let movie = service.require_movie(&movie_id).await?;
    JsonApiResponse::ok(movie.into())
}

async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Vec<MovieResponse>> {
    let Some(collection_id) = query.collection_id else {
        return Err(AppError::bad_request("collection_id required"));
    };
    let service = ServiceContext::from_state(state.as_ref()).catalog();
    let movies = service.movies_in_collection(&collection_id).await?;
    JsonApiResponse::ok(movies.into_iter().map(MovieResponse::from).collect())
}

async fn create_series(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSeriesRequest>,
) -> ApiResult<SeriesResponse> {
    let title = normalize_title(&body.title)?;
    let service = ServiceContext::from_state(state.as_ref()).catalog();
    let series = service
        .create_series(NewSeries {
            title: title.to_string(),
            release_date: body.release_date,
            poster_url: body.poster_url,
            overview: body.overview,
        })
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", series.into())
}

async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<Uuid>,
) -> ApiResult<SeriesResponse> {
    let service = ServiceContext::from_state(state.as_ref()).catalog();
    let series = service.require_series(&series_id).await?;
    JsonApiResponse::ok(series.into())
}

async fn create_episode(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<Uuid>,
    Json(body): Json<CreateEpisodeRequest>,
) -> ApiResult<EpisodeResponse> {
    let title = normalize_title(&body.title)?;
    if body.season < 0 || body.number < 1 {
        return Err(AppError::bad_request("Invalid season or episode number"));
    }
    let service = ServiceContext::from_state(state.as_ref()).catalog();
    let episode = service
        .create_episode(
            &series_id,
            NewEpisode {
                season: body.season,
                number: body.number,
                title: title.to_string(),
                release_date: body.release_date,
                runtime_minutes: body.runtime_minutes,
                overview: body.overview,
            },
        )
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", episode.into())
}

async fn list_episodes(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<Uuid>,
) -> ApiResult<Vec<EpisodeResponse>> {
    let service = ServiceContext::from_state(state.as_ref()).catalog();
    let episodes = service.episodes_of_series(&series_id).await?;
    JsonApiResponse::ok(episodes.into_iter().map(EpisodeResponse::from).collect())
}

fn normalize_title(title: &str) -> Result<&str, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Title required"));
    }
    Ok(trimmed)
}

impl From<movie::Model> for MovieResponse {
    fn from(model: movie::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            release_date: model.release_date,
            runtime_minutes: model.runtime_minutes,
            poster_url: model.poster_url,
            quality: model.quality,
            overview: model.overview,
            collection_id: model.collection_id,
            collection_name: model.collection_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<series::Model> for SeriesResponse {
    fn from(model: series::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            release_date: model.release_date,
            poster_url: model.poster_url,
            overview: model.overview,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<episode::Model> for EpisodeResponse {
    fn from(model: episode::Model) -> Self {
        Self {
            id: model.id,
            series_id: model.series_id,
            season: model.season,
            number: model.number,
            title: model.title,
            release_date: model.release_date,
            runtime_minutes: model.runtime_minutes,
            overview: model.overview,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
