use std::sync::Arc;

use chrono::Utc;

use super::{TokenGenerator, token_lookup};
use crate::error::Error;
use crate::server::AppState;
use crate::types::{Identity, Token, TokenKind};

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    TokenRevoked,
    Unavailable,
    InternalError,
}

impl From<Error> for TokenValidationError {
    fn from(e: Error) -> Self {
        if e.is_retryable() {
            TokenValidationError::Unavailable
        } else {
            tracing::error!("Token validation failed: {e}");
            TokenValidationError::InternalError
        }
    }
}

pub struct ValidatedToken {
    pub token: Token,
    pub identity: Identity,
}

/// Validates a raw token string of the given kind against the store.
/// Returns the token row and the identity it belongs to.
pub fn validate_token(
    state: &Arc<AppState>,
    raw_token: &str,
    kind: TokenKind,
) -> Result<ValidatedToken, TokenValidationError> {
    let lookup = token_lookup(raw_token).map_err(|_| TokenValidationError::InvalidToken)?;

    let token = state
        .store
        .get_token_by_lookup(lookup)?
        .ok_or(TokenValidationError::InvalidToken)?;

    if token.kind != kind {
        return Err(TokenValidationError::InvalidToken);
    }

    let generator = TokenGenerator::new();
    if !generator.verify(raw_token, &token.token_hash)? {
        return Err(TokenValidationError::InvalidToken);
    }

    if token.revoked_at.is_some() {
        return Err(TokenValidationError::TokenRevoked);
    }

    if token.is_expired(Utc::now()) {
        return Err(TokenValidationError::TokenExpired);
    }

    let identity = state
        .store
        .get_identity(token.identity_id)?
        .ok_or(TokenValidationError::InvalidToken)?;

    if let Err(e) = state.store.update_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(ValidatedToken { token, identity })
}

/// Extracts a bearer token from the Authorization header.
/// Returns None if no auth header is present.
/// Returns Err if the auth scheme is unsupported.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim().to_string()))
            .ok_or(TokenValidationError::InvalidScheme),
        None => Ok(None),
    }
}
