use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Role stored in every session. Roles are not enforced yet.
pub const DEFAULT_ROLE: &str = "user";

/// Unique user identifier assigned by the user directory (UUID text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque session identifier carried in the session cookie.
///
/// Sessions are keyed by the owning user's id, so a user has at most one live session and a
/// second login replaces the first. Build one with [`SessionId::for_user`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn for_user(user_id: &UserId) -> Self {
        Self(user_id.0.clone())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_user_id() {
        let user = UserId::from("62a16b1d-bbfe-419e-aab7-54e6fb101067");
        let session = SessionId::for_user(&user);
        assert_eq!(session.as_str(), user.as_str());
    }

    #[test]
    fn user_id_serializes_transparently() {
        let id = UserId::from("user-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"user-123\"");
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn newtypes_prevent_mixing() {
        fn takes_user_id(_: &UserId) {}
        fn takes_session_id(_: &SessionId) {}

        let user = UserId::from("id");
        let session = SessionId::from("id");

        takes_user_id(&user);
        takes_session_id(&session);
    }
}
