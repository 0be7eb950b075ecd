use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{SessionId, UserId};
use crate::user::AccountDetails;
use crate::validation::{
    is_valid_email, is_valid_name, is_valid_password, is_valid_phone,
};

/// Body of `POST /register` and `PUT /user`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

impl AccountRequest {
    /// Check every field, reporting the first one that fails.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] naming the offending field.
    pub fn validate(self) -> Result<AccountDetails, Error> {
        if !is_valid_name(&self.first_name) {
            return Err(invalid("firstName", "must be at least 2 ASCII letters"));
        }
        if !is_valid_name(&self.last_name) {
            return Err(invalid("lastName", "must be at least 2 ASCII letters"));
        }
        if !is_valid_email(&self.email) {
            return Err(invalid("email", "must be a valid email address"));
        }
        if !is_valid_password(&self.password) {
            return Err(invalid("password", "must be 8 to 20 characters"));
        }
        if !is_valid_phone(&self.phone) {
            return Err(invalid("phone", "must be an E.164 number"));
        }

        Ok(AccountDetails {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            phone: Some(self.phone),
        })
    }
}

/// Body of `POST /login`.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// # Errors
    ///
    /// [`Error::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if !is_valid_email(&self.email) {
            return Err(invalid("email", "must be a valid email address"));
        }
        if !is_valid_password(&self.password) {
            return Err(invalid("password", "must be 8 to 20 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: SessionId,
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::Validation(format!("{field}: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AccountRequest {
        AccountRequest {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@example.com".into(),
            password: "password123".into(),
            phone: "+15550100".into(),
        }
    }

    #[test]
    fn valid_account_request() {
        let details = request().validate().unwrap();
        assert_eq!(details.email, "john.doe@example.com");
        assert_eq!(details.phone.as_deref(), Some("+15550100"));
    }

    #[test]
    fn account_request_reports_first_bad_field() {
        let mut req = request();
        req.last_name = "D".into();
        req.phone = "555".into();
        match req.validate() {
            Err(Error::Validation(msg)) => assert!(msg.starts_with("lastName")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn account_request_rejects_bad_phone() {
        let mut req = request();
        req.phone = "0555".into();
        assert!(matches!(req.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn account_request_deserializes_camel_case() {
        let req: AccountRequest = serde_json::from_str(
            r#"{"firstName":"Jane","lastName":"Roe","email":"j@r.io","password":"password1","phone":"+4412345"}"#,
        )
        .unwrap();
        assert_eq!(req.first_name, "Jane");
        assert_eq!(req.last_name, "Roe");
    }

    #[test]
    fn login_request_validation() {
        let ok = LoginRequest {
            email: "a@b.com".into(),
            password: "goodpass1".into(),
        };
        assert!(ok.validate().is_ok());

        let short = LoginRequest {
            email: "a@b.com".into(),
            password: "short".into(),
        };
        assert!(matches!(short.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn login_response_uses_camel_case() {
        let json = serde_json::to_value(LoginResponse {
            session_id: SessionId::from("u-1"),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "sessionId": "u-1" }));
    }
}
