use axum::{Json, extract::State};

use crate::{api::ApiResult, routes::AppState, services::pages::HomePage};

/// Landing page: hero, featured movies and series.
pub async fn home_page(State(state): State<AppState>) -> ApiResult<HomePage> {
    Ok(Json(state.pages.home().await))
}
