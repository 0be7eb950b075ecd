use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    pub error: String,
}

pub(crate) fn status_of(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) | Error::UserAlreadyExists | Error::InvalidPassword => {
            StatusCode::BAD_REQUEST
        }
        Error::UserNotFound => StatusCode::NOT_FOUND,
        Error::SessionNotFound | Error::NoSessionId => StatusCode::UNAUTHORIZED,
        Error::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_of(&self);

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
            "internal server error".to_string()
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            status: status.as_u16(),
            message,
            error: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StoreError;

    #[test]
    fn domain_errors_map_to_status() {
        assert_eq!(status_of(&Error::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(&Error::UserAlreadyExists), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(&Error::InvalidPassword), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(&Error::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(&Error::SessionNotFound), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(&Error::NoSessionId), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(&Error::DeadlineExceeded), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn unmapped_errors_are_internal() {
        assert_eq!(
            status_of(&Error::SessionStore(StoreError::ExpiryNotSet("k".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(&Error::PasswordHash("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_details_are_not_returned() {
        use http_body_util::BodyExt;

        let response = Error::Internal("db password is hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, 500);
        assert_eq!(body.error, "internal_error");
        assert!(!body.message.contains("hunter2"));
    }

    #[tokio::test]
    async fn client_errors_carry_code_and_message() {
        use http_body_util::BodyExt;

        let response = Error::UserAlreadyExists.into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            ErrorBody {
                status: 400,
                message: "user already exists".into(),
                error: "user_already_exists".into(),
            }
        );
    }
}
