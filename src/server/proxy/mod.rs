mod handlers;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::server::AppState;

/// Unauthenticated pass-through routes to third-party APIs.
pub fn proxy_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/random-dog/", get(handlers::random_dog))
        .route("/http-cat/{status_code}/", get(handlers::http_cat))
        .route("/weather/{city_name}/", get(handlers::weather))
}
