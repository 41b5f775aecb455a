use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::auth::{
    dto::{SignInRequest, SignUpRequest},
    error::AuthError,
    password::{hash_password, verify_password},
    policy::{self, LoginEntry},
    repo::{DuplicateKey, UserRepository},
    repo_types::{NewUser, User, UserType},
    session::SessionStore,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

lazy_static! {
    /// Verified against when the email is unknown, so both failure paths pay
    /// for one argon2 run.
    static ref DUMMY_HASH: String =
        hash_password("no-such-account-password").unwrap_or_default();
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Result of a sign-up that passed every check.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// Account is usable now; a session was opened.
    SignedIn {
        user: User,
        redirect: &'static str,
        token: String,
    },
    /// Instructor account waiting for an admin.
    PendingApproval { user: User },
}

#[derive(Debug)]
pub struct SignInOutcome {
    pub user: User,
    pub redirect: &'static str,
    pub token: String,
}

/// Checks a sign-up form without touching the store. The password is left
/// in plain text; hashing happens once uniqueness is confirmed.
pub fn validate_sign_up(req: SignUpRequest) -> Result<(NewUser, String), AuthError> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);
    let Some(user_type) = req.user_type else {
        return Err(AuthError::MissingFields);
    };
    if name.is_empty() || email.is_empty() || req.password.is_empty() || req.confirm_password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    if req.password != req.confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    let education = non_blank(req.education);
    if user_type == UserType::Instructor && education.is_none() {
        return Err(AuthError::MissingFields);
    }

    let new_user = NewUser {
        email,
        username: non_blank(req.username),
        name,
        password_hash: String::new(),
        user_type,
        country: non_blank(req.country),
        currency: non_blank(req.currency),
        education,
    };
    Ok((new_user, req.password))
}

pub async fn sign_up(
    users: &dyn UserRepository,
    sessions: &dyn SessionStore,
    req: SignUpRequest,
) -> Result<SignUpOutcome, AuthError> {
    let (mut new_user, password) = validate_sign_up(req)?;

    let existing = users
        .find_by_email(&new_user.email)
        .await
        .map_err(AuthError::CreationFailed)?;
    if existing.is_some() {
        warn!(email = %new_user.email, "email already registered");
        return Err(AuthError::EmailExists);
    }
    if let Some(username) = &new_user.username {
        let taken = users
            .find_by_username(username)
            .await
            .map_err(AuthError::CreationFailed)?;
        if taken.is_some() {
            warn!(username = %username, "username already taken");
            return Err(AuthError::UsernameExists);
        }
    }

    new_user.password_hash = hash_password(&password).map_err(AuthError::CreationFailed)?;

    let user = users.create(new_user).await.map_err(|e| match e.downcast_ref::<DuplicateKey>() {
        Some(DuplicateKey::Email) => AuthError::EmailExists,
        Some(DuplicateKey::Username) => AuthError::UsernameExists,
        None => AuthError::CreationFailed(e),
    })?;
    info!(user_id = %user.id, email = %user.email, user_type = ?user.user_type, "user registered");

    if user.is_pending_approval() {
        return Ok(SignUpOutcome::PendingApproval { user });
    }

    let redirect = policy::redirect_for(&user, LoginEntry::Standard);
    let token = sessions.create(user.id).await.map_err(AuthError::SignInFailed)?;
    Ok(SignUpOutcome::SignedIn {
        user,
        redirect,
        token,
    })
}

/// Looks a user up by email and checks the password. Unknown email and wrong
/// password produce the same error.
pub async fn verify_credentials(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    let user = match users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            let _ = verify_password(password, &DUMMY_HASH);
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AuthError::SignInFailed(e));
        }
    };

    let ok = verify_password(password, &user.password_hash).map_err(AuthError::SignInFailed)?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn sign_in(
    users: &dyn UserRepository,
    sessions: &dyn SessionStore,
    req: SignInRequest,
    entry: LoginEntry,
) -> Result<SignInOutcome, AuthError> {
    let user = verify_credentials(users, &req.email, &req.password).await?;

    let redirect = match policy::resolve(&user, entry) {
        Ok(path) => path,
        Err(e) => {
            warn!(user_id = %user.id, kind = e.kind(), ?entry, "sign-in refused");
            return Err(e);
        }
    };

    let token = sessions.create(user.id).await.map_err(AuthError::SignInFailed)?;
    info!(user_id = %user.id, redirect, "user signed in");
    Ok(SignInOutcome {
        user,
        redirect,
        token,
    })
}

/// Destroys the session behind `token`, if any. Store failures are logged,
/// never surfaced: the cookie is cleared either way.
pub async fn sign_out(sessions: &dyn SessionStore, token: Option<&str>) {
    let Some(token) = token else {
        debug!("sign-out without session");
        return;
    };
    if let Err(e) = sessions.destroy(token).await {
        error!(error = %e, "session destroy failed");
    }
}
