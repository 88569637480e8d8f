//! # Studyhall
//!
//! A social learning backend: profiles follow each other, record the lessons
//! they take, and see what the people they follow are studying. Usable both as
//! a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! studyhall = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studyhall::config::ServerConfig;
//! use studyhall::server::{AppState, create_router};
//! use studyhall::store::{SqliteStore, Store};
//! use studyhall::upstream::UpstreamClient;
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     config.token_ttls(),
//!     UpstreamClient::new(config.upstream.clone()).unwrap(),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
pub mod upstream;
