use axum::http::StatusCode;
use serde_json::{Value, json};
use tempfile::tempdir;

use crate::support::{BROKEN_DETAIL_ID, BROKEN_TRAILER_ID, TestApp, response_json};

#[tokio::test]
async fn detail_returns_normalized_record() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let response = app.get("/api/v1/movie/tt0372784").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;

    assert_eq!(json["id"], "tt0372784");
    assert_eq!(json["title"], "Batman Begins");
    assert_eq!(json["mediaType"], "movie");
    assert_eq!(json["genreList"], json!(["Action", "Drama"]));
    assert_eq!(json["imdbRating"], "8.2");
    assert_eq!(json["writers"], Value::Null);
    assert_eq!(json["metascore"], Value::Null);
}

#[tokio::test]
async fn unknown_title_is_not_found() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    for uri in ["/api/v1/movie/tt404", "/api/v1/movie/tt404/page"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            response_json(response).await,
            json!({"error": "Movie not found", "code": "RESOURCE_NOT_FOUND"})
        );
    }
}

#[tokio::test]
async fn detail_page_bundles_trailer_and_recommendations() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let response = app.get("/api/v1/movie/tt0372784/page").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;

    assert_eq!(json["title"]["id"], "tt0372784");
    assert_eq!(
        json["posterHdUrl"],
        "https://img.example/tt0372784_SX1000.jpg"
    );
    assert_eq!(
        json["trailer"],
        json!({
            "videoId": "neY2xVmOfUM",
            "embedUrl": "https://www.youtube.com/embed/neY2xVmOfUM"
        })
    );
    assert_eq!(json["favorite"], false);

    let recommended: Vec<&str> = json["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        recommended,
        vec![
            "tt0468569",
            "tt0096895",
            "tt0133093",
            "tt0088247",
            "tt0095016"
        ]
    );

    let debug = json["debug"].as_array().unwrap();
    assert_eq!(debug.len(), 3);
    let trailer_url = debug[2]["url"].as_str().unwrap();
    assert!(trailer_url.contains("key=*****"), "{trailer_url}");
    assert!(!trailer_url.contains("yt-secret"));
}

#[tokio::test]
async fn detail_page_without_trailer_reports_none() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let json = response_json(app.get("/api/v1/movie/tt0133093/page").await).await;
    assert_eq!(json["trailer"], Value::Null);
    assert_eq!(json["debug"][2]["response"], "No trailer found");
    assert_eq!(app.upstream.trailers(), 1);

    // The empty lookup is cached as well.
    response_json(app.get("/api/v1/movie/tt0133093/page").await).await;
    assert_eq!(app.upstream.trailers(), 1);
}

#[tokio::test]
async fn detail_page_reflects_favorite_state() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let created = app
        .post_json(
            "/api/v1/favorites",
            &json!({
                "id": "tt0372784",
                "title": "Batman Begins",
                "year": "2005",
                "posterUrl": "https://img.example/tt0372784_SX300.jpg",
                "mediaType": "movie"
            }),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let json = response_json(app.get("/api/v1/movie/tt0372784/page").await).await;
    assert_eq!(json["favorite"], true);
}

#[tokio::test]
async fn detail_server_error_is_reported_as_not_found() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;

    let response = app.get(&format!("/api/v1/movie/{BROKEN_DETAIL_ID}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await,
        json!({"error": "Movie not found", "code": "RESOURCE_NOT_FOUND"})
    );
}

#[tokio::test]
async fn trailer_server_error_leaves_page_without_trailer() {
    let dir = tempdir().unwrap();
    let app = TestApp::spawn(dir.path()).await;
    let uri = format!("/api/v1/movie/{BROKEN_TRAILER_ID}/page");

    let response = app.get(&uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["title"]["title"], "Glitch");
    assert_eq!(json["trailer"], Value::Null);
    assert_eq!(json["debug"][2]["response"], "No trailer found");

    // Failed trailer lookups are retried rather than cached.
    response_json(app.get(&uri).await).await;
    assert_eq!(app.upstream.trailers(), 2);
}
