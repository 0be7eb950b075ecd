#![doc = include_str!("../README.md")]

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod middleware;
pub mod password;
pub mod profile;
pub mod session;
pub mod telemetry;
pub mod types;
pub mod user;
pub mod validation;

// Re-exports for convenient access
pub use auth::{AuthService, Registered};
pub use config::{Config, Environment};
pub use directory::{MemoryUserDirectory, PgUserDirectory, UserDirectory, UserLookup};
pub use error::Error;
pub use middleware::{ApiConfig, api_routes};
pub use password::CredentialVerifier;
pub use profile::ProfileService;
pub use session::{
    MemorySessionStore, RedisSessionStore, SessionManager, SessionRecord, SessionStore,
    StoreError,
};
pub use types::{SessionId, UserId};
pub use user::{AccountDetails, User, UserData, UserProfile, user_name_from_email};
