//! Reading, updating and deleting the caller's own account.

use std::sync::Arc;

use crate::directory::{UserDirectory, UserLookup};
use crate::error::Error;
use crate::password::CredentialVerifier;
use crate::session::{SessionManager, SessionStore};
use crate::types::{SessionId, UserId};
use crate::user::{AccountDetails, UserProfile};

/// Profile use cases for an already authorized user.
pub struct ProfileService<U, S> {
    directory: Arc<U>,
    sessions: SessionManager<S>,
    credentials: CredentialVerifier,
}

// Manual Clone: avoid derive adding `U: Clone, S: Clone` bounds.
impl<U, S> Clone for ProfileService<U, S> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            sessions: self.sessions.clone(),
            credentials: self.credentials.clone(),
        }
    }
}

impl<U: UserDirectory, S: SessionStore> ProfileService<U, S> {
    #[must_use]
    pub fn new(
        directory: Arc<U>,
        sessions: SessionManager<S>,
        credentials: CredentialVerifier,
    ) -> Self {
        Self {
            directory,
            sessions,
            credentials,
        }
    }

    /// # Errors
    ///
    /// [`Error::UserNotFound`] if no user has this id.
    #[tracing::instrument(skip(self), fields(operation = "profile: get"))]
    pub async fn profile(&self, user_id: &UserId) -> Result<UserProfile, Error> {
        let user = self.directory.find(UserLookup::Id(user_id)).await?;
        Ok(user.into())
    }

    /// Overwrite every profile field. The password is rehashed and the display name is
    /// derived again from the new email.
    ///
    /// The open session keeps the display name it was created with until the next login.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`] for an unknown id, [`Error::UserAlreadyExists`] if the new
    /// email belongs to another user.
    #[tracing::instrument(skip(self, account), fields(operation = "profile: update"))]
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        account: AccountDetails,
    ) -> Result<(), Error> {
        let password_hash = self.credentials.hash_blocking(account.password.clone()).await?;
        self.directory
            .update(user_id, &account.into_user_data(password_hash))
            .await?;
        tracing::info!("profile updated");
        Ok(())
    }

    /// Delete the user, then its session. A session that already expired is not an error.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`] for an unknown id; store failures while closing the session.
    #[tracing::instrument(skip(self), fields(operation = "profile: delete"))]
    pub async fn delete_account(&self, user_id: &UserId) -> Result<(), Error> {
        self.directory.delete(user_id).await?;

        match self
            .sessions
            .delete_session(&SessionId::for_user(user_id))
            .await
        {
            Ok(()) | Err(Error::SessionNotFound) => {}
            Err(e) => return Err(e),
        }

        tracing::info!("account deleted");
        Ok(())
    }
}
