use std::collections::HashMap;
use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::{ConnectionLike, ConnectionManager};

use super::{SessionRecord, SessionStore, StoreError};
use crate::types::SessionId;

/// Redis-backed [`SessionStore`]: one hash per session key with a key-level expiry.
///
/// The connection manager multiplexes and reconnects, so the store is cloned freely and
/// shared by all requests. Any other cloneable async connection works too.
#[derive(Clone)]
pub struct RedisSessionStore<C = ConnectionManager> {
    conn: C,
    ttl: Duration,
}

impl<C> RedisSessionStore<C> {
    #[must_use]
    pub fn new(conn: C, ttl: Duration) -> Self {
        Self { conn, ttl }
    }

    fn ttl_secs(&self) -> i64 {
        i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

impl RedisSessionStore<ConnectionManager> {
    /// Open a connection to `url` and check it with `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid or the server does not answer.
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!(ttl_secs = ttl.as_secs(), "connected to redis session store");
        Ok(Self::new(conn, ttl))
    }
}

impl<C> SessionStore for RedisSessionStore<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    #[tracing::instrument(skip_all, fields(operation = "session store: create", session_id = %session_id))]
    async fn create(
        &self,
        session_id: &SessionId,
        record: &SessionRecord,
    ) -> Result<SessionId, StoreError> {
        let key = session_id.as_str();
        let mut conn = self.conn.clone();

        // HSET and EXPIRE in one MULTI so the key never exists without a TTL.
        let (expiry_applied,): (bool,) = redis::pipe()
            .atomic()
            .hset_multiple(key, &record.to_fields())
            .ignore()
            .expire(key, self.ttl_secs())
            .query_async(&mut conn)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to save session"))?;

        if !expiry_applied {
            tracing::error!("session written but expiry was not applied");
            return Err(StoreError::ExpiryNotSet(key.to_owned()));
        }

        tracing::info!("session created");
        Ok(session_id.clone())
    }

    #[tracing::instrument(skip_all, fields(operation = "session store: get", session_id = %session_id))]
    async fn get(&self, session_id: &SessionId) -> Result<SessionRecord, StoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(session_id.as_str())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to read session"))?;

        SessionRecord::from_fields(&fields).inspect_err(|e| match e {
            StoreError::NotFound => tracing::warn!("session not found"),
            other => tracing::error!(error = %other, "stored session is malformed"),
        })
    }

    #[tracing::instrument(skip_all, fields(operation = "session store: delete", session_id = %session_id))]
    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn
            .del(session_id.as_str())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to delete session"))?;

        if removed == 0 {
            tracing::warn!("session not found");
            return Err(StoreError::NotFound);
        }

        tracing::info!("session deleted");
        Ok(())
    }
}
