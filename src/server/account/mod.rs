mod register;
mod tokens;

pub use register::create_account;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn account_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register/", post(register::register))
        .route("/home/", get(register::home))
        .route("/token/", post(tokens::obtain_token))
        .route("/token/refresh/", post(tokens::refresh_token))
        .route("/logout/", post(tokens::logout))
}
