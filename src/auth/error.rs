use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures surfaced by sign-up, sign-in and the session guards.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("An account with this email already exists")]
    EmailExists,
    #[error("This username is already taken")]
    UsernameExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("You are not authorized to access this area")]
    Unauthorized,
    #[error("Your account has been deactivated. Please contact support")]
    AccountDeactivated,
    #[error("Your instructor account is pending admin approval")]
    PendingApproval,
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Invalid request body: {}", .0.body_text())]
    InvalidBody(JsonRejection),
    #[error("Failed to create account")]
    CreationFailed(#[source] anyhow::Error),
    #[error("Failed to sign in")]
    SignInFailed(#[source] anyhow::Error),
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    /// Stable identifier clients switch on.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingFields => "MissingFields",
            AuthError::InvalidEmail => "InvalidEmail",
            AuthError::PasswordTooShort => "PasswordTooShort",
            AuthError::PasswordMismatch => "PasswordMismatch",
            AuthError::EmailExists => "EmailExists",
            AuthError::UsernameExists => "UsernameExists",
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::Unauthorized => "Unauthorized",
            AuthError::AccountDeactivated => "AccountDeactivated",
            AuthError::PendingApproval => "PendingApproval",
            AuthError::Unauthenticated => "Unauthenticated",
            AuthError::InvalidBody(_) => "InvalidBody",
            AuthError::CreationFailed(_) => "CreationFailed",
            AuthError::SignInFailed(_) => "SignInFailed",
            AuthError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingFields
            | AuthError::InvalidEmail
            | AuthError::PasswordTooShort
            | AuthError::PasswordMismatch => StatusCode::BAD_REQUEST,
            AuthError::InvalidBody(rejection) => rejection.status(),
            AuthError::EmailExists | AuthError::UsernameExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Unauthorized
            | AuthError::AccountDeactivated
            | AuthError::PendingApproval => StatusCode::FORBIDDEN,
            AuthError::CreationFailed(_) | AuthError::SignInFailed(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::CreationFailed(e) | AuthError::SignInFailed(e) | AuthError::Internal(e) =
            &self
        {
            tracing::error!(error = %e, kind = self.kind(), "auth action failed");
        }
        let body = ErrorBody {
            success: false,
            error: self.kind(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_failures_hide_the_cause() {
        let err = AuthError::SignInFailed(anyhow::anyhow!("connection refused on 5432"));
        assert_eq!(err.kind(), "SignInFailed");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("5432"));
    }

    #[test]
    fn error_body_serialization() {
        let err = AuthError::PendingApproval;
        let body = ErrorBody {
            success: false,
            error: err.kind(),
            message: err.to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "PendingApproval");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
