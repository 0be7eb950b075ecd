use crate::session::StoreError;

/// Errors produced by the account and session use cases.
///
/// Lower layers return these typed errors; the HTTP layer maps each variant to exactly one
/// status code (see [`Error::code`]).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed or missing input.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    /// No live session for the presented identifier (absent, expired or deleted).
    #[error("session not found")]
    SessionNotFound,

    /// A protected handler ran without an identity bound by the authorization gate.
    #[error("no session id in request")]
    NoSessionId,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("session store error: {0}")]
    SessionStore(StoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code sent to clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::UserAlreadyExists => "user_already_exists",
            Self::UserNotFound => "user_not_found",
            Self::InvalidPassword => "invalid_password",
            Self::SessionNotFound => "session_not_found",
            Self::NoSessionId => "no_session_id",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::SessionStore(_)
            | Self::Database(_)
            | Self::PasswordHash(_)
            | Self::Config(_)
            | Self::Internal(_) => "internal_error",
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_have_distinct_codes() {
        let codes = [
            Error::Validation("x".into()).code(),
            Error::UserAlreadyExists.code(),
            Error::UserNotFound.code(),
            Error::InvalidPassword.code(),
            Error::SessionNotFound.code(),
            Error::NoSessionId.code(),
            Error::DeadlineExceeded.code(),
        ];
        let mut unique = codes.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn store_failures_are_internal() {
        let err = Error::SessionStore(StoreError::Corrupt("user_id".into()));
        assert_eq!(err.code(), "internal_error");
        assert_eq!(Error::Internal("boom".into()).code(), "internal_error");
    }
}
