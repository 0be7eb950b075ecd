//! The user aggregate as seen by the account use cases.

use serde::Serialize;

use crate::types::{DEFAULT_ROLE, UserId};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Everything needed to create or overwrite a user, minus its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

impl UserData {
    /// Build user data, deriving the display name from `email`.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let email = email.into();
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            user_name: user_name_from_email(&email),
            email,
            phone,
            password_hash: password_hash.into(),
        }
    }

    /// Attach an id, producing the stored form.
    #[must_use]
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            user_name: self.user_name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            roles: vec![DEFAULT_ROLE.to_owned()],
        }
    }
}

/// Display name derived from the local part of an email address.
///
/// The local part is split on runs of non-alphanumeric ASCII characters and each segment
/// is capitalized: `john.doe@example.com` becomes `JohnDoe`.
#[must_use]
pub fn user_name_from_email(email: &str) -> String {
    let local = email.split_once('@').map_or(email, |(local, _)| local);

    local
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (head, tail) = segment.split_at(1);
            head.to_ascii_uppercase() + &tail.to_ascii_lowercase()
        })
        .collect()
}

/// Account fields submitted by a client on registration or profile update.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Plaintext; hashed before it reaches the directory.
    pub password: String,
    pub phone: Option<String>,
}

impl std::fmt::Debug for AccountDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDetails")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

impl AccountDetails {
    /// Replace the plaintext password with its digest.
    #[must_use]
    pub fn into_user_data(self, password_hash: String) -> UserData {
        UserData::new(
            self.first_name,
            self.last_name,
            self.email,
            self.phone,
            password_hash,
        )
    }
}

/// Public view of a user. Never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uuid: UserId,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub roles: Vec<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            uuid: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            user_name: user.user_name,
            email: user.email,
            phone: user.phone,
            roles: user.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_name_from_dotted_email() {
        assert_eq!(user_name_from_email("john.doe@example.com"), "JohnDoe");
    }

    #[test]
    fn user_name_normalizes_case_and_separator_runs() {
        assert_eq!(user_name_from_email("JOHN__doe-42@example.com"), "JohnDoe42");
        assert_eq!(user_name_from_email("..alice..@example.com"), "Alice");
    }

    #[test]
    fn user_name_without_at_sign_uses_whole_input() {
        assert_eq!(user_name_from_email("mary.ann"), "MaryAnn");
    }

    #[test]
    fn user_name_of_empty_email_is_empty() {
        assert_eq!(user_name_from_email(""), "");
        assert_eq!(user_name_from_email("@example.com"), "");
    }

    #[test]
    fn user_name_drops_non_ascii() {
        assert_eq!(user_name_from_email("jörg.smith@example.com"), "JRgSmith");
    }

    #[test]
    fn account_details_debug_redacts_password() {
        let details = AccountDetails {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@example.com".into(),
            password: "hunter2hunter2".into(),
            phone: None,
        };
        let printed = format!("{details:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn profile_hides_password_digest() {
        let user = UserData::new("John", "Doe", "john.doe@example.com", None, "$argon2id$secret")
            .into_user(UserId::from("u-1"));
        let json = serde_json::to_value(UserProfile::from(user)).unwrap();

        assert_eq!(json["uuid"], "u-1");
        assert_eq!(json["userName"], "JohnDoe");
        assert_eq!(json["roles"], serde_json::json!(["user"]));
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}
