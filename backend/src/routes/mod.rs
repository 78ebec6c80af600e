use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{MatchedPath, State},
    http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE},
    middleware,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::{Span, field, instrument};

use crate::{
    api::{self, ApiResult, search::SEARCH_SESSION_HEADER},
    config::AppConfig,
    providers::{OmdbClient, YoutubeClient},
    services::{
        enrich::DetailAggregator,
        favorites::{FavoritesStore, FileStorage},
        generation::SearchGenerations,
        pages::PageService,
    },
};

/// Shared application state cloned into each request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pages: Arc<PageService>,
    pub favorites: Arc<FavoritesStore>,
    pub generations: Arc<SearchGenerations>,
    pub boot_instant: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        pages: Arc<PageService>,
        favorites: Arc<FavoritesStore>,
    ) -> Self {
        Self {
            config,
            pages,
            favorites,
            generations: Arc::new(SearchGenerations::new()),
            boot_instant: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Wire the OMDb/YouTube clients and the file-backed favorites store.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self> {
        let titles = OmdbClient::new(config.upstream.omdb_settings())?;
        let trailers = YoutubeClient::new(config.upstream.youtube_settings())?;
        let pages = PageService::new(
            Arc::new(titles),
            Arc::new(trailers),
            DetailAggregator::new(config.upstream.detail_concurrency),
        );

        let storage = FileStorage::new(&config.data_dir);
        tracing::info!(path = %storage.path().display(), "loading favorites");
        let favorites = FavoritesStore::load(Arc::new(storage));

        Ok(Self::new(config, Arc::new(pages), Arc::new(favorites)))
    }
}

/// Build the Axum router with shared layers and routes.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/home", get(api::home::home_page))
        .route("/api/v1/search", get(api::search::title_search))
        .route("/api/v1/movie/{id}", get(api::titles::title_detail))
        .route("/api/v1/movie/{id}/page", get(api::titles::title_page))
        .route(
            "/api/v1/favorites",
            get(api::favorites::list_favorites).post(api::favorites::add_favorite),
        )
        .route(
            "/api/v1/favorites/{id}",
            get(api::favorites::favorite_status).delete(api::favorites::remove_favorite),
        )
        .with_state(state)
        .fallback(api::fallback_handler)
        .layer(middleware::from_fn(api::ensure_error_envelope))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(HttpMakeSpan)
                .on_request(LogOnRequest)
                .on_response(LogOnResponse),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = origin.as_str(), error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(SEARCH_SESSION_HEADER)])
}

/// JSON payload returned by `/healthz`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: f64,
    started_at: String,
    favorites: usize,
    omdb_key_configured: bool,
    youtube_key_configured: bool,
}

#[instrument(skip(state))]
async fn healthz(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.boot_instant.elapsed().as_secs_f64(),
        started_at: state.started_at.to_rfc3339(),
        favorites: state.favorites.len(),
        omdb_key_configured: state.config.upstream.omdb_api_key.is_some(),
        youtube_key_configured: state.config.upstream.youtube_api_key.is_some(),
    }))
}

#[derive(Clone)]
struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let method = request.method().clone();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str())
            .unwrap_or_else(|| request.uri().path());

        let span = tracing::info_span!(
            "http_request",
            http.request.method = %method,
            http.route = %matched_path,
            url.path = request.uri().path(),
            url.query = field::Empty,
            http.response.status_code = field::Empty,
            http.latency_ms = field::Empty
        );

        // Query strings never carry API keys here; those are added upstream.
        if let Some(query) = request.uri().query() {
            span.record("url.query", field::display(query));
        }

        span
    }
}

#[derive(Clone)]
struct LogOnRequest;

impl<B> OnRequest<B> for LogOnRequest {
    fn on_request(&mut self, request: &axum::http::Request<B>, span: &Span) {
        tracing::info!(
            parent: span,
            "HTTP request received: {} {}",
            request.method(),
            request.uri().path()
        );
    }
}

#[derive(Clone)]
struct LogOnResponse;

impl<B> OnResponse<B> for LogOnResponse {
    fn on_response(self, response: &axum::http::Response<B>, latency: Duration, span: &Span) {
        let status_code = response.status().as_u16();

        span.record("http.response.status_code", field::display(status_code));
        span.record("http.latency_ms", field::display(latency.as_millis()));

        tracing::info!(
            parent: span,
            "HTTP request completed with status {} in {} ms",
            status_code,
            latency.as_millis()
        );
    }
}
