//! Account-state gate and landing-page table applied after credentials check out.

use tracing::warn;

use crate::auth::{
    error::AuthError,
    repo_types::{Role, User, UserType},
};

/// Which login form the request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginEntry {
    Standard,
    Admin,
}

impl LoginEntry {
    pub fn is_admin(self) -> bool {
        matches!(self, LoginEntry::Admin)
    }
}

/// Decides whether a verified user may open a session.
///
/// Rules, first failure wins:
/// 1. the admin entry point only admits `role = admin`;
/// 2. an unapproved instructor (non-admin) is pending, whatever `active` says;
/// 3. an inactive non-admin is deactivated.
pub fn check_access(user: &User, entry: LoginEntry) -> Result<(), AuthError> {
    if entry.is_admin() && !user.is_admin() {
        return Err(AuthError::Unauthorized);
    }
    if user.is_pending_approval() && !user.is_admin() {
        return Err(AuthError::PendingApproval);
    }
    if !user.active && !user.is_admin() {
        return Err(AuthError::AccountDeactivated);
    }
    Ok(())
}

/// Landing path for a user that passed [`check_access`].
pub fn redirect_for(user: &User, entry: LoginEntry) -> &'static str {
    if entry.is_admin() || user.role == Role::Admin {
        return "/admin";
    }
    match user.user_type {
        UserType::Instructor if user.is_approved => "/teacher",
        UserType::Student => "/student",
        UserType::Simple => "/dashboard",
        UserType::Instructor => {
            warn!(user_id = %user.id, "unapproved instructor reached redirect resolution");
            "/dashboard"
        }
    }
}

/// Runs the gate, then picks the landing path.
pub fn resolve(user: &User, entry: LoginEntry) -> Result<&'static str, AuthError> {
    check_access(user, entry)?;
    Ok(redirect_for(user, entry))
}
