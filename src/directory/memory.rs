use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{UserDirectory, UserLookup};
use crate::error::Error;
use crate::types::UserId;
use crate::user::{User, UserData};

/// In-process [`UserDirectory`] keyed by id with a unique email index.
#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<DashMap<String, User>>,
    emails: Arc<DashMap<String, String>>,
    update_lock: Arc<Mutex<()>>,
}

impl MemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for MemoryUserDirectory {
    async fn create(&self, user: &UserData) -> Result<UserId, Error> {
        let id = Uuid::new_v4().to_string();
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(Error::UserAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }
        let id = UserId(id);
        self.users
            .insert(id.0.clone(), user.clone().into_user(id.clone()));
        Ok(id)
    }

    async fn find(&self, lookup: UserLookup<'_>) -> Result<User, Error> {
        let id = match lookup {
            UserLookup::Id(id) => id.0.clone(),
            UserLookup::Email(email) => self
                .emails
                .get(email)
                .map(|id| id.value().clone())
                .ok_or(Error::UserNotFound)?,
        };
        self.users
            .get(&id)
            .map(|user| user.value().clone())
            .ok_or(Error::UserNotFound)
    }

    async fn update(&self, id: &UserId, user: &UserData) -> Result<(), Error> {
        let _guard = self.update_lock.lock().await;

        let old_email = self
            .users
            .get(id.as_str())
            .map(|u| u.email.clone())
            .ok_or(Error::UserNotFound)?;

        if old_email != user.email {
            match self.emails.entry(user.email.clone()) {
                Entry::Occupied(_) => return Err(Error::UserAlreadyExists),
                Entry::Vacant(slot) => {
                    slot.insert(id.0.clone());
                }
            }
            self.emails.remove(&old_email);
        }

        self.users
            .insert(id.0.clone(), user.clone().into_user(id.clone()));
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        let (_, user) = self.users.remove(id.as_str()).ok_or(Error::UserNotFound)?;
        self.emails.remove(&user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(email: &str) -> UserData {
        UserData::new("John", "Doe", email, Some("+15550100".into()), "digest")
    }

    #[tokio::test]
    async fn create_and_find_by_email_and_id() {
        let dir = MemoryUserDirectory::new();
        let id = dir.create(&data("john.doe@example.com")).await.unwrap();

        let by_email = dir
            .find(UserLookup::Email("john.doe@example.com"))
            .await
            .unwrap();
        let by_id = dir.find(UserLookup::Id(&id)).await.unwrap();

        assert_eq!(by_email, by_id);
        assert_eq!(by_id.user_name, "JohnDoe");
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let dir = MemoryUserDirectory::new();
        dir.create(&data("a@b.com")).await.unwrap();

        assert!(matches!(
            dir.create(&data("a@b.com")).await,
            Err(Error::UserAlreadyExists)
        ));
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn update_moves_email_index() {
        let dir = MemoryUserDirectory::new();
        let id = dir.create(&data("old@example.com")).await.unwrap();

        dir.update(&id, &data("new@example.com")).await.unwrap();

        assert!(matches!(
            dir.find(UserLookup::Email("old@example.com")).await,
            Err(Error::UserNotFound)
        ));
        let user = dir.find(UserLookup::Email("new@example.com")).await.unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let dir = MemoryUserDirectory::new();
        dir.create(&data("taken@example.com")).await.unwrap();
        let id = dir.create(&data("mine@example.com")).await.unwrap();

        assert!(matches!(
            dir.update(&id, &data("taken@example.com")).await,
            Err(Error::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn update_and_delete_missing_user() {
        let dir = MemoryUserDirectory::new();
        let ghost = UserId::from("ghost");

        assert!(matches!(
            dir.update(&ghost, &data("x@example.com")).await,
            Err(Error::UserNotFound)
        ));
        assert!(matches!(dir.delete(&ghost).await, Err(Error::UserNotFound)));
    }

    #[tokio::test]
    async fn delete_frees_email() {
        let dir = MemoryUserDirectory::new();
        let id = dir.create(&data("a@b.com")).await.unwrap();
        dir.delete(&id).await.unwrap();

        assert!(dir.is_empty());
        assert!(dir.create(&data("a@b.com")).await.is_ok());
    }
}
