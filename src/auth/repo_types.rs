use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Authorization level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Role {
    User,
    Student,
    Instructor,
    Admin,
}

/// Category of account chosen at sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum UserType {
    Simple,
    Student,
    Instructor,
}

impl UserType {
    /// Role granted to a fresh account of this type.
    pub fn default_role(self) -> Role {
        match self {
            UserType::Simple => Role::User,
            UserType::Student => Role::Student,
            UserType::Instructor => Role::Instructor,
        }
    }

    /// Instructors wait for an admin before they can sign in.
    pub fn requires_approval(self) -> bool {
        matches!(self, UserType::Instructor)
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub user_type: UserType,
    pub active: bool,
    pub is_approved: bool,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub education: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Approval only gates instructors; every other type counts as approved.
    pub fn is_pending_approval(&self) -> bool {
        self.user_type.requires_approval() && !self.is_approved
    }
}

/// Validated input for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: Option<String>,
    pub name: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub education: Option<String>,
}

impl NewUser {
    pub fn role(&self) -> Role {
        self.user_type.default_role()
    }

    /// Instructors start inactive and unapproved.
    pub fn starts_active(&self) -> bool {
        !self.user_type.requires_approval()
    }
}
