use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::extract::ApiPath;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn random_dog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state
        .upstream
        .random_dog()
        .await
        .api_err("Failed to fetch dog image")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}

/// Status codes outside `u16` are rejected before reaching the upstream
/// client, with the same message as an out-of-range code.
pub async fn http_cat(
    State(state): State<Arc<AppState>>,
    ApiPath(status_code): ApiPath<String>,
) -> impl IntoResponse {
    let status_code: u16 = status_code
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status code or API error"))?;

    let cat = state
        .upstream
        .http_cat(status_code)
        .await
        .api_err("Failed to fetch cat image")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(cat)))
}

pub async fn weather(
    State(state): State<Arc<AppState>>,
    ApiPath(city_name): ApiPath<String>,
) -> impl IntoResponse {
    let body = state
        .upstream
        .weather(&city_name)
        .await
        .api_err("Failed to fetch weather")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}
