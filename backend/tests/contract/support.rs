use std::{
    collections::HashMap,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use cinefind_backend::{
    config::{AppConfig, LogConfig, OtelConfig, UpstreamConfig},
    routes::{self, AppState},
    services::generation::SearchGenerations,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Query that the stub upstream answers only after a delay.
pub const SLOW_QUERY: &str = "Slow";
pub const SLOW_DELAY: Duration = Duration::from_millis(300);

/// Query the stub upstream answers with HTTP 500.
pub const BROKEN_QUERY: &str = "Broken";
/// Query the stub upstream answers with a non-JSON body.
pub const GARBLED_QUERY: &str = "Garbled";
/// Title id whose detail lookup answers with HTTP 500.
pub const BROKEN_DETAIL_ID: &str = "tt5000000";
/// Title id whose trailer lookup answers with HTTP 500.
pub const BROKEN_TRAILER_ID: &str = "tt0000500";

/// Router of the real application wired to an in-process OMDb/YouTube stub.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    pub upstream: Arc<UpstreamHits>,
    pub generations: Arc<SearchGenerations>,
}

#[derive(Debug, Default)]
pub struct UpstreamHits {
    searches: AtomicUsize,
    details: AtomicUsize,
    trailers: AtomicUsize,
}

impl UpstreamHits {
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn details(&self) -> usize {
        self.details.load(Ordering::SeqCst)
    }

    pub fn trailers(&self) -> usize {
        self.trailers.load(Ordering::SeqCst)
    }
}

impl TestApp {
    pub async fn spawn(data_dir: &Path) -> Self {
        let upstream = Arc::new(UpstreamHits::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub upstream");
        let addr = listener.local_addr().expect("stub address");
        let stub = Router::new()
            .route("/omdb/", get(omdb))
            .route("/youtube/search", get(youtube))
            .with_state(upstream.clone());
        tokio::spawn(async move {
            axum::serve(listener, stub).await.expect("stub upstream");
        });

        let config = AppConfig {
            data_dir: data_dir.to_path_buf(),
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            upstream: UpstreamConfig {
                omdb_api_key: Some("omdb-secret".into()),
                omdb_base_url: format!("http://{addr}/omdb/"),
                youtube_api_key: Some("yt-secret".into()),
                youtube_base_url: format!("http://{addr}/youtube/search"),
                timeout: Duration::from_secs(5),
                detail_concurrency: 4,
                search_cache_ttl: Duration::from_secs(60),
                detail_cache_ttl: Duration::from_secs(60),
            },
            otel: OtelConfig {
                endpoint: None,
                service_name: "contract-tests".into(),
                disable_traces: true,
                disable_logs: true,
            },
            log: LogConfig {
                level: "warn".into(),
            },
            environment: "test".into(),
            cors_allowed_origins: Vec::new(),
        };
        let state = AppState::from_config(Arc::new(config)).expect("app state");

        Self {
            generations: state.generations.clone(),
            router: routes::router(state),
            upstream,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router to respond")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Response {
        self.request(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.request(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body bytes")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("valid json payload")
}

async fn omdb(
    State(hits): State<Arc<UpstreamHits>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("apikey").map(String::as_str) != Some("omdb-secret") {
        return Json(json!({"Response": "False", "Error": "Invalid API key!"})).into_response();
    }

    if let Some(id) = params.get("i") {
        hits.details.fetch_add(1, Ordering::SeqCst);
        if id == BROKEN_DETAIL_ID {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        return Json(detail(id)).into_response();
    }

    let query = params.get("s").cloned().unwrap_or_default();
    let page: u32 = params
        .get("page")
        .and_then(|page| page.parse().ok())
        .unwrap_or(1);
    hits.searches.fetch_add(1, Ordering::SeqCst);
    match query.as_str() {
        SLOW_QUERY => tokio::time::sleep(SLOW_DELAY).await,
        BROKEN_QUERY => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        GARBLED_QUERY => return "<html>maintenance</html>".into_response(),
        _ => {}
    }
    Json(search(&query, page)).into_response()
}

async fn youtube(
    State(hits): State<Arc<UpstreamHits>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.trailers.fetch_add(1, Ordering::SeqCst);
    let query = params.get("q").cloned().unwrap_or_default();
    match query.as_str() {
        "Batman Begins Official Trailer" => Json(
            json!({"items": [{"id": {"kind": "youtube#video", "videoId": "neY2xVmOfUM"}}]}),
        )
        .into_response(),
        "Glitch Official Trailer" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => Json(json!({"items": []})).into_response(),
    }
}

fn summary(id: &str, title: &str, year: &str, kind: &str) -> Value {
    json!({
        "imdbID": id,
        "Title": title,
        "Year": year,
        "Type": kind,
        "Poster": format!("https://img.example/{id}_SX300.jpg"),
    })
}

fn found(items: Vec<Value>, total: &str) -> Value {
    json!({"Search": items, "totalResults": total, "Response": "True"})
}

fn search(query: &str, page: u32) -> Value {
    match (query, page) {
        ("Batman", 1) => found(
            vec![
                summary("tt0372784", "Batman Begins", "2005", "movie"),
                summary("tt0468569", "The Dark Knight", "2008", "movie"),
                summary("tt0096895", "Batman", "1989", "movie"),
                summary("tt9999999", "Batman: Lost", "2020", "movie"),
            ],
            "23",
        ),
        ("Action", 1) => found(
            vec![
                summary("tt0372784", "Batman Begins", "2005", "movie"),
                summary("tt0468569", "The Dark Knight", "2008", "movie"),
                summary("tt0096895", "Batman", "1989", "movie"),
                summary("tt0133093", "The Matrix", "1999", "movie"),
                summary("tt0088247", "The Terminator", "1984", "movie"),
                summary("tt0095016", "Die Hard", "1988", "movie"),
                summary("tt0103064", "Terminator 2", "1991", "movie"),
            ],
            "1,204",
        ),
        ("Flaky", 1) => found(
            vec![
                summary("tt0372784", "Batman Begins", "2005", "movie"),
                summary(BROKEN_DETAIL_ID, "Broken Arrow", "1996", "movie"),
            ],
            "2",
        ),
        (SLOW_QUERY, 1) => found(
            vec![summary("tt0096895", "Batman", "1989", "movie")],
            "1",
        ),
        ("movie", 1) => found(
            vec![
                summary("tt0133093", "The Matrix", "1999", "movie"),
                summary("tt0088247", "The Terminator", "1984", "movie"),
            ],
            "40",
        ),
        ("movie", 2) => found(
            vec![
                summary("tt0088247", "The Terminator", "1984", "movie"),
                summary("tt0095016", "Die Hard", "1988", "movie"),
            ],
            "40",
        ),
        ("Star Wars", 1) => found(
            vec![summary("tt8111088", "The Mandalorian", "2019–2023", "series")],
            "12",
        ),
        ("Star Wars", 2) => found(
            vec![summary("tt13622776", "Ahsoka", "2023–", "series")],
            "12",
        ),
        ("zootopia 2", 1) => found(
            vec![summary("tt26443597", "Zootopia 2", "2025", "movie")],
            "1",
        ),
        _ => json!({"Response": "False", "Error": "Movie not found!"}),
    }
}

fn detail(id: &str) -> Value {
    let (title, year, genre, rating) = match id {
        "tt0372784" => ("Batman Begins", "2005", "Action, Drama", "8.2"),
        "tt0468569" => ("The Dark Knight", "2008", "Action, Crime, Drama", "9.0"),
        "tt0096895" => ("Batman", "1989", "Action, Adventure", "N/A"),
        "tt0133093" => ("The Matrix", "1999", "Action, Sci-Fi", "8.7"),
        BROKEN_TRAILER_ID => ("Glitch", "2021", "Thriller", "5.1"),
        _ => return json!({"Response": "False", "Error": "Incorrect IMDb ID."}),
    };

    json!({
        "imdbID": id,
        "Title": title,
        "Year": year,
        "Type": "movie",
        "Poster": format!("https://img.example/{id}_SX300.jpg"),
        "Plot": "N/A",
        "Genre": genre,
        "Director": "Christopher Nolan",
        "Actors": "Christian Bale, Michael Caine",
        "Writer": "N/A",
        "Awards": "N/A",
        "Rated": "PG-13",
        "Runtime": "140 min",
        "imdbRating": rating,
        "imdbVotes": "1,600,000",
        "Metascore": "N/A",
        "Response": "True",
    })
}
