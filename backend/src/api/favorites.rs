use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use tokio::task;

use crate::{
    api::{ApiError, ApiResponse, ApiResult},
    routes::AppState,
    titles::SummaryRecord,
};

#[derive(Debug, Serialize)]
pub struct FavoritesList {
    pub favorites: Vec<SummaryRecord>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteAdded {
    pub favorites: Vec<SummaryRecord>,
    pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteRemoved {
    pub favorites: Vec<SummaryRecord>,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub id: String,
    pub favorite: bool,
}

pub async fn list_favorites(State(state): State<AppState>) -> ApiResult<FavoritesList> {
    Ok(Json(FavoritesList {
        favorites: state.favorites.list(),
    }))
}

/// Insert a title; 201 when it was new, 200 when already present.
pub async fn add_favorite(
    State(state): State<AppState>,
    body: Result<Json<SummaryRecord>, JsonRejection>,
) -> ApiResponse<FavoriteAdded> {
    let Json(record) = body.map_err(|err| ApiError::bad_request(err.body_text()))?;
    if record.id.trim().is_empty() {
        return Err(ApiError::bad_request("favorite id must not be empty"));
    }

    let favorites = state.favorites.clone();
    let id = record.id.clone();
    let added = task::spawn_blocking(move || favorites.add(record))
        .await
        .map_err(ApiError::internal_with_source)?
        .map_err(ApiError::internal_with_source)?;
    tracing::info!(id = %id, added, "favorite saved");

    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(FavoriteAdded {
            favorites: state.favorites.list(),
            added,
        }),
    ))
}

pub async fn favorite_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FavoriteStatus> {
    let favorite = state.favorites.contains(&id);
    Ok(Json(FavoriteStatus { id, favorite }))
}

/// Removing an id that is not saved still succeeds with `removed: false`.
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FavoriteRemoved> {
    let favorites = state.favorites.clone();
    let target = id.clone();
    let removed = task::spawn_blocking(move || favorites.remove(&target))
        .await
        .map_err(ApiError::internal_with_source)?
        .map_err(ApiError::internal_with_source)?;
    tracing::info!(id = %id, removed, "favorite removed");

    Ok(Json(FavoriteRemoved {
        favorites: state.favorites.list(),
        removed,
    }))
}
