//! Opaque bearer tokens of the form `studyhall_<lookup>_<secret>`.
//!
//! The lookup is stored in clear and indexed; the full token is only kept as
//! an Argon2id hash. Access and refresh tokens share the format and differ
//! only in the kind recorded next to the hash.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;

use crate::error::{Error, Result};

const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_LANES: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "studyhall_";
const LOOKUP_BYTES: usize = 4;
const SECRET_BYTES: usize = 12;

/// A token fresh from the generator. `raw` is handed to the client once;
/// `lookup` and `hash` go to the store.
#[derive(Debug)]
pub struct GeneratedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

pub struct TokenGenerator {
    argon2: Argon2<'static>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_LANES,
            Some(ARGON2_OUTPUT_LEN),
        )
        .expect("argon2 token params are within bounds");

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn generate(&self) -> Result<GeneratedToken> {
        let lookup = random_hex(LOOKUP_BYTES);
        let raw = format!("{TOKEN_PREFIX}{lookup}_{}", random_hex(SECRET_BYTES));
        let hash = self.hash(&raw)?;
        Ok(GeneratedToken { raw, lookup, hash })
    }

    pub fn hash(&self, raw: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))
    }

    /// Checks `raw` against a stored PHC hash. A mismatch is `Ok(false)`; a
    /// malformed hash is an error.
    pub fn verify(&self, raw: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::Config(format!("invalid token hash: {e}")))?;

        match self.argon2.verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn is_lower_hex(s: &str, bytes: usize) -> bool {
    s.len() == bytes * 2 && s.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f'))
}

/// Returns the lookup part of a well-formed token.
pub fn token_lookup(raw: &str) -> Result<&str> {
    let (lookup, secret) = raw
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|rest| rest.split_once('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    if !is_lower_hex(lookup, LOOKUP_BYTES) || !is_lower_hex(secret, SECRET_BYTES) {
        return Err(Error::InvalidTokenFormat);
    }
    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = TokenGenerator::new().generate().unwrap();

        let parts: Vec<&str> = token.raw.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "studyhall");
        assert_eq!(parts[1], token.lookup);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 24);
        assert!(token.hash.starts_with("$argon2id$"));
        assert_eq!(token_lookup(&token.raw).unwrap(), token.lookup);
    }

    #[test]
    fn test_verify() {
        let generator = TokenGenerator::new();
        let token = generator.generate().unwrap();
        let other = generator.generate().unwrap();

        assert!(generator.verify(&token.raw, &token.hash).unwrap());
        assert!(!generator.verify(&other.raw, &token.hash).unwrap());
        assert!(generator.verify(&token.raw, "not-a-hash").is_err());
    }

    #[test]
    fn test_token_lookup_rejects_malformed() {
        assert_eq!(
            token_lookup("studyhall_deadbeef_00112233445566778899aabb").unwrap(),
            "deadbeef"
        );
        for bad in [
            "other_deadbeef_00112233445566778899aabb",
            "studyhall_deadbeef",
            "studyhall_deadbee_00112233445566778899aabb",
            "studyhall_deadbeef_00112233445566778899aabb_1",
            "studyhall_DEADBEEF_00112233445566778899aabb",
            "",
        ] {
            assert!(token_lookup(bad).is_err(), "{bad}");
        }
    }
}
