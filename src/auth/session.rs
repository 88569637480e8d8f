use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::TokenGenerator;
use crate::config::TokenTtls;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Token, TokenKind};

const MAX_RETRIES: u32 = 3;

/// A freshly issued access/refresh pair. The raw strings are only ever
/// returned here; the store keeps hashes.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues one token of `kind` for `identity_id`, retrying on lookup
/// collisions.
pub fn issue_token(
    store: &dyn Store,
    generator: &TokenGenerator,
    identity_id: i64,
    kind: TokenKind,
    ttl: Duration,
) -> Result<String> {
    for _ in 0..MAX_RETRIES {
        let generated = generator.generate()?;

        let now = Utc::now();
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: generated.hash,
            token_lookup: generated.lookup,
            kind,
            identity_id,
            created_at: now,
            expires_at: now + ttl,
            last_used_at: None,
            revoked_at: None,
        };

        match store.create_token(&token) {
            Ok(()) => return Ok(generated.raw),
            Err(Error::TokenLookupCollision) => {
                tracing::debug!("Token lookup collision, retrying");
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

pub fn issue_token_pair(store: &dyn Store, identity_id: i64, ttls: TokenTtls) -> Result<TokenPair> {
    let generator = TokenGenerator::new();
    let access = issue_token(store, &generator, identity_id, TokenKind::Access, ttls.access)?;
    let refresh = issue_token(store, &generator, identity_id, TokenKind::Refresh, ttls.refresh)?;
    Ok(TokenPair { access, refresh })
}
