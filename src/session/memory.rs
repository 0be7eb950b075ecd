use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use super::{SessionRecord, SessionStore, StoreError};
use crate::types::SessionId;

struct Entry {
    fields: HashMap<String, String>,
    expires_at: Instant,
}

/// In-process [`SessionStore`] with the same layout and expiry semantics as the Redis store.
///
/// Expired entries are dropped on access and swept on every write. Used for local
/// development and tests.
#[derive(Clone)]
pub struct MemorySessionStore {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Store raw hash fields under `key`, bypassing record validation.
    pub fn insert_raw(&self, key: &str, fields: HashMap<String, String>) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(
            key.to_owned(),
            Entry {
                fields,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Number of keys that have not yet expired.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    #[cfg(test)]
    fn stored_keys(&self) -> usize {
        self.entries.len()
    }

    fn live_fields(&self, key: &str) -> Option<HashMap<String, String>> {
        let now = Instant::now();
        if self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now)
            .is_some()
        {
            return None;
        }
        self.entries.get(key).map(|entry| entry.fields.clone())
    }
}

impl SessionStore for MemorySessionStore {
    async fn create(
        &self,
        session_id: &SessionId,
        record: &SessionRecord,
    ) -> Result<SessionId, StoreError> {
        let fields = record
            .to_fields()
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();
        self.insert_raw(session_id.as_str(), fields);
        Ok(session_id.clone())
    }

    async fn get(&self, session_id: &SessionId) -> Result<SessionRecord, StoreError> {
        let fields = self
            .live_fields(session_id.as_str())
            .ok_or(StoreError::NotFound)?;
        SessionRecord::from_fields(&fields)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        let key = session_id.as_str();
        let now = Instant::now();
        if self
            .entries
            .remove_if(key, |_, entry| entry.expires_at > now)
            .is_some()
        {
            return Ok(());
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Err(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn record(id: &str) -> SessionRecord {
        SessionRecord::new(UserId::from(id), "JohnDoe", vec!["user".into()])
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let rec = record("u-1");

        let id = store.create(&rec.session_id, &rec).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), rec);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let rec = record("u-1");
        store.create(&rec.session_id, &rec).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get(&rec.session_id).await.is_ok());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(
            store.get(&rec.session_id).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.live_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn recreate_refreshes_ttl() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let rec = record("u-1");
        store.create(&rec.session_id, &rec).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        store.create(&rec.session_id, &rec).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;

        assert!(store.get(&rec.session_id).await.is_ok());
        assert_eq!(store.live_sessions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_swept_on_write() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let first = record("u-1");
        store.create(&first.session_id, &first).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        let second = record("u-2");
        store.create(&second.session_id, &second).await.unwrap();

        assert_eq!(store.stored_keys(), 1);
        assert!(store.get(&second.session_id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_expired_entry_is_not_found() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let rec = record("u-1");
        store.create(&rec.session_id, &rec).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(
            store.delete(&rec.session_id).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.stored_keys(), 0);
    }

    #[tokio::test]
    async fn delete_removes_live_entry_once() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let rec = record("u-1");
        store.create(&rec.session_id, &rec).await.unwrap();

        store.delete(&rec.session_id).await.unwrap();
        assert!(matches!(
            store.delete(&rec.session_id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert!(matches!(
            store.delete(&SessionId::from("missing-id")).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn empty_hash_reads_as_absent() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.insert_raw("u-1", HashMap::new());
        assert!(matches!(
            store.get(&SessionId::from("u-1")).await,
            Err(StoreError::NotFound)
        ));
    }
}
