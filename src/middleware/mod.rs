//! HTTP surface for the account service.
//!
//! Routes, the cookie-based authorization gate, request validation and the mapping from
//! [`Error`](crate::Error) to JSON error responses.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use accounts_service::middleware::{ApiConfig, api_routes};
//! use accounts_service::{CredentialVerifier, MemorySessionStore, MemoryUserDirectory};
//!
//! let config = ApiConfig::from_env()?;
//! let store = MemorySessionStore::new(config.session_ttl());
//!
//! let app = api_routes(config, MemoryUserDirectory::new(), store, CredentialVerifier::new());
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod state;
mod types;

pub use config::ApiConfig;
pub use error::ErrorBody;
pub use extractor::{AuthenticatedUser, ValidJson, resolve_session};
pub use routes::api_routes;
pub use types::{AccountRequest, LoginRequest, LoginResponse, RegisterResponse};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
