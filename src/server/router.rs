use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::account::account_router;
use super::proxy::proxy_router;
use super::social::social_router;
use crate::config::TokenTtls;
use crate::store::Store;
use crate::upstream::UpstreamClient;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub token_ttls: TokenTtls,
    pub upstream: UpstreamClient,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, token_ttls: TokenTtls, upstream: UpstreamClient) -> Self {
        Self {
            store,
            token_ttls,
            upstream,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(social_router())
        .merge(account_router())
        .merge(proxy_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
