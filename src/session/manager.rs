use std::sync::Arc;

use super::{SessionRecord, SessionStore, StoreError};
use crate::error::Error;
use crate::types::{SessionId, UserId};

/// Session lifecycle on top of a [`SessionStore`].
///
/// Holds no session state of its own: every lookup is a store round-trip. Nothing is
/// retried; store errors propagate unchanged except `NotFound`, which becomes
/// [`Error::SessionNotFound`].
pub struct SessionManager<S> {
    store: Arc<S>,
}

// Manual Clone: avoid derive adding `S: Clone` bound.
impl<S> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: SessionStore> SessionManager<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create (or replace) the session of `user_id`. The session id is the user id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionStore`] if the record or its expiry could not be written.
    #[tracing::instrument(skip(self, user_name, roles), fields(operation = "session manager: create"))]
    pub async fn create_session(
        &self,
        user_id: &UserId,
        user_name: &str,
        roles: Vec<String>,
    ) -> Result<SessionId, Error> {
        let record = SessionRecord::new(user_id.clone(), user_name, roles);
        self.store
            .create(&record.session_id, &record)
            .await
            .map_err(into_domain)
    }

    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for absent or expired sessions,
    /// [`Error::SessionStore`] for anything else.
    #[tracing::instrument(skip(self), fields(operation = "session manager: get"))]
    pub async fn get_session(&self, session_id: &SessionId) -> Result<SessionRecord, Error> {
        self.store.get(session_id).await.map_err(into_domain)
    }

    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] if no session was removed.
    #[tracing::instrument(skip(self), fields(operation = "session manager: delete"))]
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<(), Error> {
        self.store.delete(session_id).await.map_err(into_domain)
    }
}

fn into_domain(e: StoreError) -> Error {
    match e {
        StoreError::NotFound => Error::SessionNotFound,
        other => Error::SessionStore(other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::session::{MemorySessionStore, USER_ID_FIELD, USER_ROLES_FIELD};

    fn manager(ttl_secs: u64) -> (SessionManager<MemorySessionStore>, MemorySessionStore) {
        let store = MemorySessionStore::new(Duration::from_secs(ttl_secs));
        (SessionManager::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn session_round_trip() {
        let (sessions, _) = manager(60);
        let user = UserId::from("62a16b1d-bbfe-419e-aab7-54e6fb101067");

        let id = sessions
            .create_session(&user, "JohnDoe", vec!["user".into()])
            .await
            .unwrap();
        assert_eq!(id.as_str(), user.as_str());

        let record = sessions.get_session(&id).await.unwrap();
        assert_eq!(record.user_id, user);
        assert_eq!(record.user_name, "JohnDoe");
        assert_eq!(record.roles, vec!["user".to_string()]);

        sessions.delete_session(&id).await.unwrap();
        assert!(matches!(
            sessions.get_session(&id).await,
            Err(Error::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn second_login_replaces_first() {
        let (sessions, store) = manager(60);
        let user = UserId::from("u-1");

        sessions
            .create_session(&user, "Old", vec!["user".into()])
            .await
            .unwrap();
        sessions
            .create_session(&user, "New", vec!["user".into()])
            .await
            .unwrap();

        assert_eq!(store.live_sessions(), 1);
        let record = sessions.get_session(&SessionId::for_user(&user)).await.unwrap();
        assert_eq!(record.user_name, "New");
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_is_not_found() {
        let (sessions, _) = manager(30);
        let user = UserId::from("u-1");
        let id = sessions
            .create_session(&user, "JohnDoe", vec!["user".into()])
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(matches!(
            sessions.get_session(&id).await,
            Err(Error::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn delete_missing_session() {
        let (sessions, _) = manager(60);
        assert!(matches!(
            sessions.delete_session(&SessionId::from("missing-id")).await,
            Err(Error::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn corrupt_record_is_not_session_not_found() {
        let (sessions, store) = manager(60);
        store.insert_raw(
            "u-1",
            HashMap::from([
                (USER_ID_FIELD.to_owned(), "u-1".to_owned()),
                (USER_ROLES_FIELD.to_owned(), "user".to_owned()),
            ]),
        );

        assert!(matches!(
            sessions.get_session(&SessionId::from("u-1")).await,
            Err(Error::SessionStore(StoreError::Corrupt(_)))
        ));
    }
}
