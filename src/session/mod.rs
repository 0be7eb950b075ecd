//! Server-side sessions: the record layout, the store contract and the manager that
//! translates store outcomes into domain errors.

mod manager;
pub mod memory;
pub mod redis_store;

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{SessionId, UserId};

pub use manager::SessionManager;
pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

pub(crate) const USER_ID_FIELD: &str = "user_id";
pub(crate) const USER_NAME_FIELD: &str = "user_name";
pub(crate) const USER_ROLES_FIELD: &str = "user_roles";

/// One authenticated session.
///
/// `session_id` always equals `user_id`; [`SessionRecord::new`] is the only constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Display name cached so authorized requests skip the user directory.
    pub user_name: String,
    pub roles: Vec<String>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(user_id: UserId, user_name: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            session_id: SessionId::for_user(&user_id),
            user_id,
            user_name: user_name.into(),
            roles,
        }
    }

    /// Flattened hash fields as persisted by the stores.
    pub(crate) fn to_fields(&self) -> [(&'static str, String); 3] {
        [
            (USER_ID_FIELD, self.user_id.to_string()),
            (USER_NAME_FIELD, self.user_name.clone()),
            (USER_ROLES_FIELD, self.roles.join(",")),
        ]
    }

    /// Rebuild a record from stored hash fields.
    ///
    /// No fields at all means the key is absent ([`StoreError::NotFound`]); a partially
    /// populated hash is [`StoreError::Corrupt`].
    pub(crate) fn from_fields(fields: &HashMap<String, String>) -> Result<Self, StoreError> {
        if fields.is_empty() {
            return Err(StoreError::NotFound);
        }

        let field = |name: &str| {
            fields
                .get(name)
                .cloned()
                .ok_or_else(|| StoreError::Corrupt(name.to_owned()))
        };

        let user_id = UserId(field(USER_ID_FIELD)?);
        let user_name = field(USER_NAME_FIELD)?;
        let roles = field(USER_ROLES_FIELD)?
            .split(',')
            .map(str::to_owned)
            .collect();

        Ok(Self::new(user_id, user_name, roles))
    }
}

/// Failures reported by a [`SessionStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key absent, expired, or present with no fields.
    #[error("session not found")]
    NotFound,

    #[error("session record is corrupt: missing field '{0}'")]
    Corrupt(String),

    /// The record was written but its time-to-live could not be applied.
    #[error("expiry was not applied to session '{0}'")]
    ExpiryNotSet(String),

    #[error("session store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),
}

/// Key-value persistence for sessions with a store-managed time-to-live.
///
/// Implementations must be safe to share across concurrent requests.
pub trait SessionStore: Send + Sync + 'static {
    /// Write the record under `session_id` and apply the configured time-to-live.
    ///
    /// Both steps must succeed for the call to succeed.
    fn create(
        &self,
        session_id: &SessionId,
        record: &SessionRecord,
    ) -> impl Future<Output = Result<SessionId, StoreError>> + Send;

    /// Fetch a live record.
    fn get(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<SessionRecord, StoreError>> + Send;

    /// Remove a record; [`StoreError::NotFound`] if nothing was removed.
    fn delete(&self, session_id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send;
}
