use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    api::{ApiError, ApiResult},
    routes::AppState,
    services::pages::DetailPage,
    titles::DetailRecord,
};

const TITLE_NOT_FOUND: &str = "Movie not found";

/// Full record for one title.
pub async fn title_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DetailRecord> {
    state
        .pages
        .title(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(TITLE_NOT_FOUND))
}

/// Detail page: record, HD poster, trailer, recommendations and favorite flag.
pub async fn title_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DetailPage> {
    let mut page = state
        .pages
        .detail_page(&id)
        .await
        .ok_or_else(|| ApiError::not_found(TITLE_NOT_FOUND))?;
    page.favorite = state.favorites.contains(page.title.id());
    Ok(Json(page))
}
