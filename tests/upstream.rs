//! Proxy endpoint tests against a fake third-party server bound to an
//! ephemeral local port.

mod common;

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use common::TestApp;
use studyhall::config::UpstreamConfig;

async fn fake_cat(Path(code): Path<u16>) -> StatusCode {
    if code == 200 || code == 404 {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn fake_weather(Query(params): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    let ok = params.get("q").map(String::as_str) == Some("London")
        && params.get("appid").map(String::as_str) == Some("test-key")
        && params.get("units").map(String::as_str) == Some("metric");
    if ok {
        Ok(Json(json!({"name": "London", "main": {"temp": 12.5}})))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Starts the fake upstream and returns its base URL.
async fn start_fake_upstream() -> String {
    let app = Router::new()
        .route(
            "/dog",
            get(|| async {
                Json(json!({
                    "status": "success",
                    "message": "https://images.dog.ceo/breeds/hound/1.jpg"
                }))
            }),
        )
        .route(
            "/dog-broken",
            get(|| async { Json(json!({"status": "error", "message": "down"})) }),
        )
        .route("/cat/{code}", get(fake_cat))
        .route("/weather", get(fake_weather));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn upstream_config(base: &str) -> UpstreamConfig {
    UpstreamConfig {
        dog_api_url: format!("{base}/dog"),
        cat_api_url: format!("{base}/cat"),
        weather_api_url: format!("{base}/weather"),
        weather_api_key: Some("test-key".to_string()),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_random_dog() {
    let base = start_fake_upstream().await;
    let app = TestApp::with_upstream(upstream_config(&base));

    let (status, body) = app.api("GET", "/random-dog/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(
        body["data"]["message"],
        "https://images.dog.ceo/breeds/hound/1.jpg"
    );
}

#[tokio::test]
async fn test_random_dog_non_success_payload() {
    let base = start_fake_upstream().await;
    let app = TestApp::with_upstream(UpstreamConfig {
        dog_api_url: format!("{base}/dog-broken"),
        ..upstream_config(&base)
    });

    let (status, body) = app.api("GET", "/random-dog/", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "API error");
}

#[tokio::test]
async fn test_random_dog_unreachable() {
    let app = TestApp::with_upstream(UpstreamConfig {
        dog_api_url: "http://127.0.0.1:1/dog".to_string(),
        ..UpstreamConfig::default()
    });

    let (status, body) = app.api("GET", "/random-dog/", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "API error");
}

#[tokio::test]
async fn test_http_cat() {
    let base = start_fake_upstream().await;
    let app = TestApp::with_upstream(upstream_config(&base));

    let (status, body) = app.api("GET", "/http-cat/404/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({"status_code": 404, "image_url": format!("{base}/cat/404")})
    );

    // Valid code the upstream has no picture for.
    let (status, body) = app.api("GET", "/http-cat/418/", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status code or API error");
}

#[tokio::test]
async fn test_http_cat_rejects_out_of_range_codes() {
    let base = start_fake_upstream().await;
    let app = TestApp::with_upstream(upstream_config(&base));

    for code in ["99", "600", "70000", "abc"] {
        let (status, body) = app
            .api("GET", &format!("/http-cat/{code}/"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{code}");
        assert_eq!(body["error"], "Invalid status code or API error");
    }
}

#[tokio::test]
async fn test_weather() {
    let base = start_fake_upstream().await;
    let app = TestApp::with_upstream(upstream_config(&base));

    let (status, body) = app.api("GET", "/weather/London/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "London");
    assert_eq!(body["data"]["main"]["temp"], 12.5);

    let (status, body) = app.api("GET", "/weather/Atlantis/", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Could not fetch weather data");
}

#[tokio::test]
async fn test_weather_without_api_key() {
    let base = start_fake_upstream().await;
    let app = TestApp::with_upstream(UpstreamConfig {
        weather_api_key: None,
        ..upstream_config(&base)
    });

    let (status, body) = app.api("GET", "/weather/London/", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Could not fetch weather data");
}
