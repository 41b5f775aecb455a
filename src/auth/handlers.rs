use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser, SignInRequest, SignUpRequest},
        error::AuthError,
        extractors::{AuthJson, CurrentUser, SessionToken},
        policy::LoginEntry,
        services::{self, SignUpOutcome},
        session::{clear_session_cookie, session_cookie},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/admin/signin", post(admin_sign_in))
        .route("/auth/signout", post(sign_out))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn cookie_headers(state: &AppState, token: &str) -> Result<HeaderMap, AuthError> {
    let mut headers = HeaderMap::new();
    let cookie = session_cookie(&state.config.session, token).map_err(AuthError::Internal)?;
    headers.insert(header::SET_COOKIE, cookie);
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    AuthJson(payload): AuthJson<SignUpRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AuthError> {
    match services::sign_up(state.users.as_ref(), state.sessions.as_ref(), payload).await? {
        SignUpOutcome::SignedIn { redirect, token, .. } => Ok((
            StatusCode::CREATED,
            cookie_headers(&state, &token)?,
            Json(AuthResponse::redirect(redirect)),
        )),
        SignUpOutcome::PendingApproval { .. } => Ok((
            StatusCode::CREATED,
            HeaderMap::new(),
            Json(AuthResponse::pending_approval()),
        )),
    }
}

async fn sign_in_via(
    state: AppState,
    payload: SignInRequest,
    entry: LoginEntry,
) -> Result<(HeaderMap, Json<AuthResponse>), AuthError> {
    let outcome =
        services::sign_in(state.users.as_ref(), state.sessions.as_ref(), payload, entry).await?;
    Ok((
        cookie_headers(&state, &outcome.token)?,
        Json(AuthResponse::redirect(outcome.redirect)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    AuthJson(payload): AuthJson<SignInRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AuthError> {
    sign_in_via(state, payload, LoginEntry::Standard).await
}

#[instrument(skip(state, payload))]
pub async fn admin_sign_in(
    State(state): State<AppState>,
    AuthJson(payload): AuthJson<SignInRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AuthError> {
    sign_in_via(state, payload, LoginEntry::Admin).await
}

#[instrument(skip(state, token))]
pub async fn sign_out(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<(HeaderMap, Redirect), AuthError> {
    services::sign_out(state.sessions.as_ref(), token.as_deref()).await;

    let mut headers = HeaderMap::new();
    let cleared = clear_session_cookie(&state.config.session).map_err(AuthError::Internal)?;
    headers.insert(header::SET_COOKIE, cleared);
    Ok((headers, Redirect::to("/")))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}
