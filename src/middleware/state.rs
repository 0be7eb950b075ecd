use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::ApiSettings;
use crate::auth::AuthService;
use crate::directory::UserDirectory;
use crate::profile::ProfileService;
use crate::session::SessionStore;

/// Shared state for route handlers and the authorization gate.
pub(super) struct AppState<U, S> {
    pub(super) auth: AuthService<U, S>,
    pub(super) profiles: ProfileService<U, S>,
    pub(super) settings: ApiSettings,
}

// Manual Clone: avoid derive adding `U: Clone, S: Clone` bounds.
impl<U, S> Clone for AppState<U, S> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            profiles: self.profiles.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<U: UserDirectory, S: SessionStore> FromRef<AppState<U, S>> for Key {
    fn from_ref(state: &AppState<U, S>) -> Self {
        state.settings.cookie_key.clone()
    }
}
