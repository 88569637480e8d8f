mod helpers;
mod middleware;
mod password;
mod session;
mod token;

pub use helpers::{TokenValidationError, ValidatedToken, validate_token};
pub use middleware::{AuthError, RequireAuth, RequireStaff};
pub use password::{hash_password, verify_password};
pub use session::{TokenPair, issue_token, issue_token_pair};
pub use token::{GeneratedToken, TokenGenerator, token_lookup};
