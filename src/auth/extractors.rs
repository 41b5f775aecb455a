use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use super::{
    error::AuthError,
    policy::{check_access, LoginEntry},
    repo_types::User,
    session::token_from_headers,
};
use crate::state::AppState;

/// JSON body whose rejections come back in the auth error envelope.
pub struct AuthJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AuthJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(AuthError::InvalidBody)?;
        Ok(AuthJson(value))
    }
}

/// Raw session token from the cookie or bearer header, if any.
pub struct SessionToken(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers, &state.config.session.cookie_name);
        Ok(SessionToken(token.map(str::to_string)))
    }
}

async fn load_session_user(parts: &Parts, state: &AppState) -> Result<User, AuthError> {
    let token = token_from_headers(&parts.headers, &state.config.session.cookie_name)
        .ok_or(AuthError::Unauthenticated)?;

    let user_id = state
        .sessions
        .resolve(token)
        .await
        .map_err(AuthError::Internal)?
        .ok_or(AuthError::Unauthenticated)?;

    state
        .users
        .find_by_id(user_id)
        .await
        .map_err(AuthError::Internal)?
        .ok_or(AuthError::Unauthenticated)
}

/// Signed-in user whose account is still usable.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = load_session_user(parts, state).await?;
        // An admin may have deactivated the account after the session was opened.
        check_access(&user, LoginEntry::Standard)?;
        Ok(CurrentUser(user))
    }
}

/// Signed-in user with `role = admin`.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = load_session_user(parts, state).await?;
        check_access(&user, LoginEntry::Admin)?;
        Ok(AdminUser(user))
    }
}
