//! In-process test harness: a fresh SQLite database per test and the full
//! router driven with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use studyhall::config::{TokenTtls, UpstreamConfig};
use studyhall::server::account::create_account;
use studyhall::server::{AppState, create_router};
use studyhall::store::{SqliteStore, Store};
use studyhall::upstream::UpstreamClient;

pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    _temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_options(UpstreamConfig::default(), TokenTtls::default())
    }

    pub fn with_upstream(upstream: UpstreamConfig) -> Self {
        Self::with_options(upstream, TokenTtls::default())
    }

    pub fn with_options(upstream: UpstreamConfig, token_ttls: TokenTtls) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("test.db")).expect("open db"));
        store.initialize().expect("initialize db");

        let state = Arc::new(AppState::new(
            store.clone(),
            token_ttls,
            UpstreamClient::new(upstream).expect("build upstream client"),
        ));

        Self {
            _temp_dir: temp_dir,
            store,
            router: create_router(state),
        }
    }

    pub async fn api(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        };
        let req = builder.body(body).unwrap();
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            json!(null)
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Creates an account directly in the store and returns its profile id.
    pub fn create_user(&self, username: &str, is_staff: bool) -> i64 {
        let (_, profile) = create_account(
            self.store.as_ref(),
            username,
            &format!("{username}@example.com"),
            PASSWORD,
            is_staff,
        )
        .expect("create account");
        profile.id
    }

    /// Logs in through `/token/` and returns `(access, refresh)`.
    pub async fn login(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .api(
                "POST",
                "/token/",
                None,
                Some(json!({"username": username, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (
            body["data"]["access"].as_str().unwrap().to_string(),
            body["data"]["refresh"].as_str().unwrap().to_string(),
        )
    }

    /// Creates a user and logs in, returning `(profile_id, access_token)`.
    pub async fn user_with_token(&self, username: &str) -> (i64, String) {
        let profile_id = self.create_user(username, false);
        let (access, _) = self.login(username).await;
        (profile_id, access)
    }
}
