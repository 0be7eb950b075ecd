//! Register, login and logout.

use std::sync::Arc;

use crate::directory::{UserDirectory, UserLookup};
use crate::error::Error;
use crate::password::CredentialVerifier;
use crate::session::{SessionManager, SessionStore};
use crate::types::{DEFAULT_ROLE, SessionId, UserId};
use crate::user::AccountDetails;

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// Composes the user directory, credential verification and sessions.
///
/// Every step is sequential and never retried; the first failure aborts the rest.
pub struct AuthService<U, S> {
    directory: Arc<U>,
    sessions: SessionManager<S>,
    credentials: CredentialVerifier,
}

// Manual Clone: avoid derive adding `U: Clone, S: Clone` bounds.
impl<U, S> Clone for AuthService<U, S> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            sessions: self.sessions.clone(),
            credentials: self.credentials.clone(),
        }
    }
}

impl<U: UserDirectory, S: SessionStore> AuthService<U, S> {
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

    #[must_use]
    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    /// Create the user, then log it in.
    ///
    /// If the login step fails, or the call is cancelled before it finishes, the freshly
    /// created user is deleted again so a retry does not hit [`Error::UserAlreadyExists`].
    ///
    /// # Errors
    ///
    /// [`Error::UserAlreadyExists`] if the email is taken; otherwise any error from
    /// hashing, the directory or the session store.
    #[tracing::instrument(skip_all, fields(operation = "auth: register"))]
    pub async fn register(&self, account: AccountDetails) -> Result<Registered, Error> {
        let email = account.email.clone();
        let password = account.password.clone();

        let password_hash = self.credentials.hash_blocking(account.password.clone()).await?;
        let user_id = self
            .directory
            .create(&account.into_user_data(password_hash))
            .await?;
        let pending = PendingUser::new(self.directory.clone(), user_id.clone());

        let session_id = match self.login(&email, &password).await {
            Ok(session_id) => session_id,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "login after registration failed, removing user");
                pending.rollback().await;
                return Err(e);
            }
        };
        pending.keep();

        tracing::info!(user_id = %user_id, "user registered");
        Ok(Registered {
            user_id,
            session_id,
        })
    }

    /// Verify credentials and open a session. The session id equals the user id.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`] for an unknown email, [`Error::InvalidPassword`] on mismatch.
    #[tracing::instrument(skip_all, fields(operation = "auth: login"))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionId, Error> {
        let user = self.directory.find(UserLookup::Email(email)).await?;

        let matches = self
            .credentials
            .verify_blocking(password.to_owned(), user.password_hash.clone())
            .await?;
        if !matches {
            tracing::warn!(user_id = %user.id, "invalid password");
            return Err(Error::InvalidPassword);
        }

        let session_id = self
            .sessions
            .create_session(&user.id, &user.user_name, vec![DEFAULT_ROLE.to_owned()])
            .await?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(session_id)
    }

    /// # Errors
    ///
    /// [`Error::SessionNotFound`] if the session is already gone.
    #[tracing::instrument(skip_all, fields(operation = "auth: logout", session_id = %session_id))]
    pub async fn logout(&self, session_id: &SessionId) -> Result<(), Error> {
        self.sessions.delete_session(session_id).await?;
        tracing::info!("session closed");
        Ok(())
    }
}

/// A user created by an unfinished registration.
///
/// Dropped while still armed (the registration future was cancelled), it removes the user
/// on a background task.
struct PendingUser<U: UserDirectory> {
    directory: Arc<U>,
    user_id: Option<UserId>,
}

impl<U: UserDirectory> PendingUser<U> {
    fn new(directory: Arc<U>, user_id: UserId) -> Self {
        Self {
            directory,
            user_id: Some(user_id),
        }
    }

    fn keep(mut self) {
        self.user_id = None;
    }

    async fn rollback(mut self) {
        if let Some(user_id) = &self.user_id {
            remove_user(self.directory.as_ref(), user_id).await;
        }
        self.user_id = None;
    }
}

impl<U: UserDirectory> Drop for PendingUser<U> {
    fn drop(&mut self) {
        let Some(user_id) = self.user_id.take() else {
            return;
        };

        tracing::warn!(user_id = %user_id, "registration cancelled, removing user");
        let directory = self.directory.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    remove_user(directory.as_ref(), &user_id).await;
                });
            }
            Err(_) => {
                tracing::error!(user_id = %user_id, "no runtime to remove user of cancelled registration");
            }
        }
    }
}

async fn remove_user<U: UserDirectory>(directory: &U, user_id: &UserId) {
    if let Err(e) = directory.delete(user_id).await {
        tracing::error!(error = %e, user_id = %user_id, "failed to remove user after aborted registration");
    }
}
