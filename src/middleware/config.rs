use std::time::Duration;

use axum::http::HeaderValue;
use axum_extra::extract::cookie::Key;

use crate::error::Error;

/// Shared HTTP settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct ApiSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl: Duration,
    pub(crate) secure_cookies: bool,
    pub(crate) request_timeout: Duration,
    pub(crate) cors_allowed_origins: Vec<HeaderValue>,
}

impl ApiSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "sessionId".into(),
            session_ttl: Duration::from_secs(1800),
            secure_cookies: false,
            request_timeout: Duration::from_secs(10),
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// HTTP surface configuration.
///
/// `session_ttl` is used for both the session store expiry and the cookie `Max-Age`,
/// so the two can never disagree.
///
/// Use [`from_env()`](ApiConfig::from_env) for convention-based setup,
/// or [`new()`](ApiConfig::new) with `with_*` methods for full control.
#[derive(Clone)]
pub struct ApiConfig {
    pub(crate) settings: ApiSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiConfig {
    /// All fields use defaults; the cookie key is ephemeral.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: ApiSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `SESSION_TTL_SECS`: session lifetime in seconds (default 1800)
    /// - `SESSION_COOKIE_NAME`: session cookie name (default `sessionId`)
    /// - `SECURE_COOKIES`: `"1"` or `"true"` marks the session cookie `Secure`
    /// - `COOKIE_KEY`: cookie encryption key bytes (at least 64)
    /// - `REQUEST_TIMEOUT_SECS`: per-request deadline in seconds (default 10)
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated origins allowed to send credentials
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::new();

        if let Some(secs) = env_secs("SESSION_TTL_SECS")? {
            config = config.with_session_ttl(secs);
        }
        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            if name.is_empty() {
                return Err(Error::Config("SESSION_COOKIE_NAME must not be empty".into()));
            }
            config = config.with_session_cookie_name(name);
        }
        if let Some(secs) = env_secs("REQUEST_TIMEOUT_SECS")? {
            config = config.with_request_timeout(secs);
        }

        let secure = matches!(
            std::env::var("SECURE_COOKIES").as_deref(),
            Ok("1") | Ok("true"),
        );

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                Error::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => {
                tracing::warn!("COOKIE_KEY not set, sessions will not survive a restart");
                Key::generate()
            }
        };

        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            let origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(|o| {
                    HeaderValue::from_str(o)
                        .map_err(|e| Error::Config(format!("CORS_ALLOWED_ORIGINS: {o}: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            config = config.with_cors_allowed_origins(origins);
        }

        Ok(config.with_cookie_key(cookie_key).with_secure_cookies(secure))
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.settings.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cors_allowed_origins(mut self, origins: Vec<HeaderValue>) -> Self {
        self.settings.cors_allowed_origins = origins;
        self
    }

    /// Session lifetime, shared by the session store and the cookie.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.settings.session_ttl
    }

    #[must_use]
    pub fn session_cookie_name(&self) -> &str {
        &self.settings.session_cookie_name
    }
}

fn env_secs(var: &str) -> Result<Option<Duration>, Error> {
    match std::env::var(var) {
        Ok(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("{var}: {e}")))?;
            if secs == 0 {
                return Err(Error::Config(format!("{var} must be positive")));
            }
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}
