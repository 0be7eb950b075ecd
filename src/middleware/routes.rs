use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::PrivateCookieJar;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::config::ApiConfig;
use super::cookies;
use super::extractor::{AuthenticatedUser, ValidJson, require_session};
use super::state::AppState;
use super::types::{AccountRequest, LoginRequest, LoginResponse, RegisterResponse};
use crate::auth::AuthService;
use crate::directory::UserDirectory;
use crate::error::Error;
use crate::password::CredentialVerifier;
use crate::profile::ProfileService;
use crate::session::{SessionManager, SessionStore};
use crate::types::UserId;
use crate::validation;
use crate::user::UserProfile;

/// Create the account API router.
///
/// `POST /logout` and `GET`/`PUT`/`DELETE /user` sit behind the authorization gate.
/// Every request runs under the configured deadline.
pub fn api_routes<U, S>(
    config: ApiConfig,
    directory: U,
    session_store: S,
    credentials: CredentialVerifier,
) -> Router
where
    U: UserDirectory,
    S: SessionStore,
{
    let directory = Arc::new(directory);
    let sessions = SessionManager::new(Arc::new(session_store));
    let settings = config.settings;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(settings.cors_allowed_origins.clone()))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    let request_timeout = settings.request_timeout;

    let state = AppState {
        auth: AuthService::new(directory.clone(), sessions.clone(), credentials.clone()),
        profiles: ProfileService::new(directory, sessions, credentials),
        settings,
    };

    let protected = Router::new()
        .route("/logout", post(logout::<U, S>))
        .route(
            "/user",
            get(get_user::<U, S>)
                .put(update_user::<U, S>)
                .delete(delete_user::<U, S>),
        )
        .route_layer(from_fn_with_state(state.clone(), require_session::<U, S>));

    Router::new()
        .route("/register", post(register::<U, S>))
        .route("/login", post(login::<U, S>))
        .route("/data/u", get(missing_uuid))
        .route("/data/u/", get(missing_uuid))
        .route("/data/u/{uuid}", get(public_profile::<U, S>))
        .merge(protected)
        .layer(from_fn_with_state(request_timeout, enforce_deadline))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Register / Login / Logout ──────────────────────────────────────

async fn register<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    jar: PrivateCookieJar,
    ValidJson(body): ValidJson<AccountRequest>,
) -> Result<(StatusCode, PrivateCookieJar, Json<RegisterResponse>), Error> {
    let registered = state.auth.register(body.validate()?).await?;

    let session_cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        registered.session_id.as_str(),
        state.settings.session_ttl,
        state.settings.secure_cookies,
    );

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie),
        Json(RegisterResponse {
            id: registered.user_id,
        }),
    ))
}

async fn login<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    jar: PrivateCookieJar,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<LoginResponse>), Error> {
    body.validate()?;
    let session_id = state.auth.login(&body.email, &body.password).await?;

    let session_cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        session_id.as_str(),
        state.settings.session_ttl,
        state.settings.secure_cookies,
    );

    Ok((jar.add(session_cookie), Json(LoginResponse { session_id })))
}

async fn logout<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    jar: PrivateCookieJar,
    user: AuthenticatedUser,
) -> Result<(PrivateCookieJar, StatusCode), Error> {
    state.auth.logout(&user.session_id).await?;

    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);
    Ok((jar.remove(clear_cookie), StatusCode::NO_CONTENT))
}

// ── Profile ────────────────────────────────────────────────────────

async fn get_user<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, Error> {
    Ok(Json(state.profiles.profile(&user.user_id).await?))
}

async fn update_user<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    user: AuthenticatedUser,
    ValidJson(body): ValidJson<AccountRequest>,
) -> Result<StatusCode, Error> {
    state
        .profiles
        .update_profile(&user.user_id, body.validate()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    jar: PrivateCookieJar,
    user: AuthenticatedUser,
) -> Result<(PrivateCookieJar, StatusCode), Error> {
    state.profiles.delete_account(&user.user_id).await?;

    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);
    Ok((jar.remove(clear_cookie), StatusCode::NO_CONTENT))
}

async fn public_profile<U: UserDirectory, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Path(uuid): Path<String>,
) -> Result<Json<UserProfile>, Error> {
    if !validation::is_valid_uuid(&uuid) {
        return Err(Error::Validation(format!(
            "uuid: '{uuid}' is not a hyphenated UUID"
        )));
    }
    let profile = state
        .profiles
        .profile(&UserId(uuid.to_ascii_lowercase()))
        .await?;
    Ok(Json(profile))
}

async fn missing_uuid() -> Error {
    Error::Validation("uuid: missing".into())
}

// ── Helpers ────────────────────────────────────────────────────────

/// Run the rest of the chain under `timeout`. On expiry the in-flight future is dropped,
/// cancelling any pending store or directory call.
async fn enforce_deadline(
    State(timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%method, %path, timeout_ms = timeout.as_millis() as u64, "request deadline exceeded");
            Error::DeadlineExceeded.into_response()
        }
    }
}
