use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::PrivateCookieJar;
use serde::de::DeserializeOwned;

use super::state::AppState;
use crate::directory::UserDirectory;
use crate::error::Error;
use crate::session::{SessionManager, SessionRecord, SessionStore};
use crate::types::{SessionId, UserId};

/// Identity bound by the authorization gate.
///
/// Use as an Axum extractor in handlers mounted behind the gate. Handlers trust it without
/// looking the session up again. Returns `401 Unauthorized` (`no_session_id`) when the
/// handler is reachable without the gate.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(user: AuthenticatedUser) -> String {
///     user.user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub session_id: SessionId,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(Error::NoSessionId)
    }
}

/// Resolve a session cookie value into its live session.
///
/// A missing or empty value is rejected with [`Error::SessionNotFound`] without touching the
/// store. Expiry is left entirely to the store's TTL.
///
/// # Errors
///
/// [`Error::SessionNotFound`] for missing, empty, expired or deleted sessions; any other
/// store failure unchanged.
pub async fn resolve_session<S: SessionStore>(
    sessions: &SessionManager<S>,
    cookie_value: Option<&str>,
) -> Result<SessionRecord, Error> {
    let session_id = match cookie_value {
        Some(value) if !value.is_empty() => SessionId::from(value),
        _ => {
            tracing::debug!(operation = "gate: resolve", "no session cookie");
            return Err(Error::SessionNotFound);
        }
    };

    sessions.get_session(&session_id).await.inspect_err(|e| {
        tracing::debug!(operation = "gate: resolve", error = %e, "session rejected");
    })
}

/// Authorization gate: resolves the session cookie and binds the caller's identity into the
/// request extensions, or rejects the request.
pub(super) async fn require_session<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let cookie = jar
        .get(&state.settings.session_cookie_name)
        .map(|c| c.value().to_string());

    let record = resolve_session(state.auth.sessions(), cookie.as_deref()).await?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: record.user_id,
        session_id: record.session_id,
    });

    Ok(next.run(request).await)
}

/// JSON body extractor whose rejections are [`Error::Validation`].
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
