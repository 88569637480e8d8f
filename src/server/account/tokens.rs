use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{
    RequireAuth, TokenGenerator, TokenValidationError, issue_token, issue_token_pair,
    validate_token, verify_password,
};
use crate::server::AppState;
use crate::server::dto::{AccessTokenResponse, LogoutRequest, ObtainTokenRequest, RefreshRequest};
use crate::server::extract::ApiJson;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::TokenKind;

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

/// Maps a refresh-token failure to `rejected`, keeping storage failures
/// distinguishable.
fn refresh_token_error(e: TokenValidationError, rejected: ApiError) -> ApiError {
    match e {
        TokenValidationError::Unavailable => {
            ApiError::unavailable("Storage is busy, retry the request")
        }
        TokenValidationError::InternalError => ApiError::internal("Failed to validate token"),
        _ => rejected,
    }
}

pub async fn obtain_token(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ObtainTokenRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let identity = store
        .get_identity_by_username(&req.username)
        .api_err("Failed to look up user")?
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    if !verify_password(&req.password, &identity.password_hash)
        .api_err("Failed to verify password")?
    {
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let pair = issue_token_pair(store, identity.id, state.token_ttls)
        .api_err("Failed to issue tokens")?;

    tracing::info!("Issued tokens for {}", identity.username);

    Ok::<_, ApiError>(Json(ApiResponse::success(pair)))
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> impl IntoResponse {
    let validated = validate_token(&state, &req.refresh, TokenKind::Refresh).map_err(|e| {
        refresh_token_error(e, ApiError::unauthorized("Token is invalid or expired"))
    })?;

    let access = issue_token(
        state.store.as_ref(),
        &TokenGenerator::new(),
        validated.identity.id,
        TokenKind::Access,
        state.token_ttls.access,
    )
    .api_err("Failed to issue token")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(AccessTokenResponse { access })))
}

/// Revokes one of the caller's refresh tokens. Access tokens already issued
/// stay valid until they expire.
pub async fn logout(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LogoutRequest>,
) -> impl IntoResponse {
    let invalid = || ApiError::bad_request("Invalid refresh token");

    let validated = validate_token(&state, &req.refresh_token, TokenKind::Refresh)
        .map_err(|e| refresh_token_error(e, invalid()))?;

    if validated.identity.id != auth.identity.id {
        return Err(invalid());
    }

    state
        .store
        .revoke_token(&validated.token.id)
        .api_err("Failed to revoke token")?;

    tracing::info!(
        "Revoked refresh token {} for {}",
        validated.token.id,
        auth.identity.username
    );

    Ok::<_, ApiError>(StatusCode::RESET_CONTENT)
}
