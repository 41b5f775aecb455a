use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Role, User, UserType};

/// Request body for sign-up. Absent strings default to empty and are
/// reported as missing fields by validation.
#[derive(Debug, Default, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "userType")]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
}

/// Request body for both sign-in entry points.
#[derive(Debug, Default, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Success body of sign-up and sign-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pending_approval: bool,
}

impl AuthResponse {
    pub fn redirect(path: &'static str) -> Self {
        Self {
            success: true,
            redirect: Some(path),
            pending_approval: false,
        }
    }

    pub fn pending_approval() -> Self {
        Self {
            success: true,
            redirect: None,
            pending_approval: true,
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub name: String,
    pub role: Role,
    pub user_type: UserType,
    pub active: bool,
    pub is_approved: bool,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub education: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            name: u.name,
            role: u.role,
            user_type: u.user_type,
            active: u.active,
            is_approved: u.is_approved,
            country: u.country,
            currency: u.currency,
            education: u.education,
            created_at: u.created_at,
        }
    }
}
