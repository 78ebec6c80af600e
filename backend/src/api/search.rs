use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::{
    api::{ApiError, ApiResult},
    providers::TitleQuery,
    routes::AppState,
    services::{filter::TitleFilter, pages::SearchResults},
    titles::MediaType,
};

/// Header naming the client view a search belongs to. A newer search under
/// the same value supersedes an older one still in flight.
pub const SEARCH_SESSION_HEADER: &str = "x-search-session";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub y: Option<String>,
    pub genre: Option<String>,
    pub min_rating: Option<String>,
}

pub async fn title_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<RawSearchParams>, QueryRejection>,
) -> ApiResult<SearchResults> {
    let Query(params) = params.map_err(|err| ApiError::bad_request(err.body_text()))?;
    let query = parse_query(&params)?;
    let filter = TitleFilter::new(params.genre.as_deref(), params.min_rating.as_deref())
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let ticket = session_of(&headers).map(|session| state.generations.begin(session));
    let results = state.pages.search(&query, &filter).await;

    if let Some(ticket) = ticket {
        let (session, generation) = (ticket.session().to_string(), ticket.generation());
        if !ticket.settle() {
            tracing::debug!(
                session = session.as_str(),
                generation,
                "dropping superseded search result"
            );
            return Err(ApiError::superseded(
                "a newer search for this session has started",
            ));
        }
    }

    Ok(Json(results))
}

fn parse_query(params: &RawSearchParams) -> Result<TitleQuery, ApiError> {
    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::bad_request(
            "page must be greater than or equal to 1",
        ));
    }

    let media_type = params
        .media_type
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<MediaType>)
        .transpose()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    Ok(TitleQuery::new(params.q.clone().unwrap_or_default())
        .page(page)
        .media_type(media_type)
        .year(params.y.clone()))
}

fn session_of(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SEARCH_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
