use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{RequireAuth, hash_password};
use crate::server::AppState;
use crate::server::dto::{HomeResponse, RegisterRequest};
use crate::server::extract::ApiJson;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{validate_email, validate_password, validate_username};
use crate::store::Store;
use crate::types::{Identity, IdentitySummary, NewIdentity, Profile};

/// Validates and creates an identity together with its profile.
pub fn create_account(
    store: &dyn Store,
    username: &str,
    email: &str,
    password: &str,
    is_staff: bool,
) -> Result<(Identity, Profile), ApiError> {
    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)?;

    if store
        .get_identity_by_username(username)
        .api_err("Failed to check username")?
        .is_some()
    {
        return Err(ApiError::bad_request(
            "A user with that username already exists",
        ));
    }
    if store
        .get_identity_by_email(email)
        .api_err("Failed to check email")?
        .is_some()
    {
        return Err(ApiError::bad_request("A user with that email already exists"));
    }

    let password_hash = hash_password(password).api_err("Failed to hash password")?;

    let (identity, profile) = store
        .create_identity(&NewIdentity {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            is_staff,
        })
        .api_err("Failed to create user")?;

    tracing::info!(
        "Created user {} (profile {})",
        identity.username,
        profile.id
    );

    Ok((identity, profile))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> impl IntoResponse {
    let (identity, _) = create_account(
        state.store.as_ref(),
        &req.username,
        &req.email,
        &req.password,
        false,
    )?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(IdentitySummary::from(&identity))),
    ))
}

pub async fn home(auth: RequireAuth) -> impl IntoResponse {
    Json(ApiResponse::success(HomeResponse {
        message: format!("Hi, {}!", auth.identity.username),
    }))
}
