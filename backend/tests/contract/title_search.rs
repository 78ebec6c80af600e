use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tempfile::tempdir;

use crate::support::{BROKEN_QUERY, GARBLED_QUERY, SLOW_QUERY, TestApp, response_json};

fn ids(json: &Value) -> Vec<&str> {
    json["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_str().expect("id"))
        .collect()
}

fn search_in_session(query: &str, session: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/v1/search?q={query}"))
        .header("x-search-session", session)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn search_enriches_hits_in_order_and_drops_failed_lookups() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let response = app.get("/api/v1/search?q=Batman").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;

    assert_eq!(ids(&json), vec!["tt0372784", "tt0468569", "tt0096895"]);
    assert_eq!(json["totalResults"], 23);
    assert_eq!(json["totalPages"], 3);
    assert_eq!(json["page"], 1);
    assert_eq!(json["error"], Value::Null);
    assert_eq!(
        json["availableGenres"],
        serde_json::json!(["Action", "Adventure", "Crime", "Drama"])
    );
    assert_eq!(json["items"][0]["genreList"], serde_json::json!(["Action", "Drama"]));
    assert_eq!(json["items"][0]["plot"], Value::Null);
}

#[tokio::test]
async fn search_applies_genre_and_min_rating_together() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let json = response_json(
        app.get("/api/v1/search?q=Batman&genre=Drama&minRating=8.5")
            .await,
    )
    .await;
    assert_eq!(ids(&json), vec!["tt0468569"]);

    let json = response_json(app.get("/api/v1/search?q=Batman&minRating=1").await).await;
    assert_eq!(
        ids(&json),
        vec!["tt0372784", "tt0468569"],
        "unrated titles never pass a rating threshold"
    );

    let json = response_json(app.get("/api/v1/search?q=Batman&genre=Horror").await).await;
    assert!(ids(&json).is_empty());
    assert_eq!(json["availableGenres"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn blank_query_short_circuits_without_upstream_calls() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let json = response_json(app.get("/api/v1/search?q=%20%20").await).await;
    assert_eq!(json["error"], "No query provided");
    assert!(ids(&json).is_empty());
    assert_eq!(app.upstream.searches(), 0);
}

#[tokio::test]
async fn upstream_query_error_is_surfaced() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let response = app.get("/api/v1/search?q=zzzzqqq").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["error"], "Movie not found!");
    assert_eq!(json["totalResults"], 0);
    assert_eq!(app.upstream.details(), 0);
}

#[tokio::test]
async fn debug_entries_mask_the_api_key() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let json = response_json(app.get("/api/v1/search?q=Batman&page=1").await).await;
    let url = json["debug"][0]["url"].as_str().expect("debug url");
    assert!(url.contains("apikey=*****"), "{url}");
    assert!(!url.contains("omdb-secret"));
    assert_eq!(json["debug"][0]["source"], "OMDb Search (Batman, Page 1)");
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let first = response_json(app.get("/api/v1/search?q=Batman").await).await;
    let searches = app.upstream.searches();
    let details = app.upstream.details();
    let second = response_json(app.get("/api/v1/search?q=Batman").await).await;

    assert_eq!(ids(&first), ids(&second));
    assert_eq!(app.upstream.searches(), searches);
    // Misses are not cached, so only the unknown id is fetched again.
    assert_eq!(app.upstream.details(), details + 1);
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    for uri in [
        "/api/v1/search?q=Batman&page=0",
        "/api/v1/search?q=Batman&page=abc",
        "/api/v1/search?q=Batman&type=game",
        "/api/v1/search?q=Batman&minRating=high",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = response_json(response).await;
        assert_eq!(json["code"], "VALIDATION_FAILED", "{uri}");
    }
}

#[tokio::test]
async fn newer_search_in_same_session_supersedes_older_one() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let slow_app = app.clone();
    let slow = tokio::spawn(async move {
        slow_app
            .request(search_in_session(SLOW_QUERY, "tab-1"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fresh = app.request(search_in_session("Batman", "tab-1")).await;
    assert_eq!(fresh.status(), StatusCode::OK);
    assert_eq!(ids(&response_json(fresh).await).len(), 3);

    let stale = slow.await.unwrap();
    assert_eq!(stale.status(), StatusCode::CONFLICT);
    let json = response_json(stale).await;
    assert_eq!(json["code"], "SEARCH_SUPERSEDED");
}

#[tokio::test]
async fn searches_in_different_sessions_do_not_interfere() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let slow_app = app.clone();
    let slow = tokio::spawn(async move {
        slow_app
            .request(search_in_session(SLOW_QUERY, "tab-1"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let other = app.request(search_in_session("Batman", "tab-2")).await;
    assert_eq!(other.status(), StatusCode::OK);
    assert_eq!(slow.await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn abandoned_searches_release_their_sessions() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    for n in 0..20 {
        let request = search_in_session(SLOW_QUERY, &format!("tab-{n}"));
        let outcome = tokio::time::timeout(Duration::from_millis(10), app.request(request)).await;
        assert!(outcome.is_err(), "slow search should still be in flight");
    }

    assert_eq!(app.generations.active_sessions(), 0);
}

#[tokio::test]
async fn upstream_server_error_becomes_fetch_failure() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    for _ in 0..2 {
        let response = app.get(&format!("/api/v1/search?q={BROKEN_QUERY}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Failed to fetch data");
        assert!(ids(&json).is_empty());
        assert_eq!(json["totalResults"], 0);
    }
    // Failures are not cached.
    assert_eq!(app.upstream.searches(), 2);
}

#[tokio::test]
async fn malformed_upstream_body_becomes_fetch_failure() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let json = response_json(app.get(&format!("/api/v1/search?q={GARBLED_QUERY}")).await).await;
    assert_eq!(json["error"], "Failed to fetch data");
    assert!(ids(&json).is_empty());
}

#[tokio::test]
async fn failing_detail_lookup_is_dropped_and_retried() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let json = response_json(app.get("/api/v1/search?q=Flaky").await).await;
    assert_eq!(ids(&json), vec!["tt0372784"]);
    assert_eq!(json["totalResults"], 2);
    assert_eq!(app.upstream.details(), 2);

    let again = response_json(app.get("/api/v1/search?q=Flaky").await).await;
    assert_eq!(ids(&again), vec!["tt0372784"]);
    // Only the failed lookup goes upstream again.
    assert_eq!(app.upstream.details(), 3);
}
