use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::PublicUser,
        error::{AuthError, ErrorBody},
        extractors::AdminUser,
        repo_types::UserType,
    },
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/instructors/pending", get(list_pending_instructors))
        .route("/admin/users/:id/approve", post(approve_user))
        .route("/admin/users/:id/deactivate", post(deactivate_user))
        .route("/admin/users/:id/activate", post(activate_user))
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Internal server error")]
    Store(#[source] anyhow::Error),
}

impl AdminError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdminError::Auth(e) => e.kind(),
            AdminError::NotFound => "NotFound",
            AdminError::BadRequest(_) => "BadRequest",
            AdminError::Store(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::Auth(e) => e.status(),
            AdminError::NotFound => StatusCode::NOT_FOUND,
            AdminError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AdminError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self {
            AdminError::Auth(e) => e.into_response(),
            other => {
                if let AdminError::Store(e) = &other {
                    error!(error = %e, "admin store operation failed");
                }
                let body = ErrorBody {
                    success: false,
                    error: other.kind(),
                    message: other.to_string(),
                };
                (other.status(), Json(body)).into_response()
            }
        }
    }
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn list_pending_instructors(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<PublicUser>>, AdminError> {
    let pending = state
        .users
        .list_pending_instructors()
        .await
        .map_err(AdminError::Store)?;
    Ok(Json(pending.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn approve_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AdminError> {
    let target = state
        .users
        .find_by_id(id)
        .await
        .map_err(AdminError::Store)?
        .ok_or(AdminError::NotFound)?;
    if target.user_type != UserType::Instructor {
        warn!(user_id = %id, user_type = ?target.user_type, "approve on non-instructor");
        return Err(AdminError::BadRequest("Only instructor accounts need approval"));
    }

    let user = state
        .users
        .approve(id)
        .await
        .map_err(AdminError::Store)?
        .ok_or(AdminError::NotFound)?;
    info!(user_id = %user.id, "instructor approved");
    Ok(Json(PublicUser::from(user)))
}

async fn set_active(
    state: &AppState,
    admin_id: Uuid,
    id: Uuid,
    active: bool,
) -> Result<Json<PublicUser>, AdminError> {
    if !active && admin_id == id {
        return Err(AdminError::BadRequest("You cannot deactivate your own account"));
    }
    let user = state
        .users
        .set_active(id, active)
        .await
        .map_err(AdminError::Store)?
        .ok_or(AdminError::NotFound)?;
    info!(user_id = %user.id, active, "account state changed");
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn deactivate_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AdminError> {
    set_active(&state, admin.id, id, false).await
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn activate_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AdminError> {
    set_active(&state, admin.id, id, true).await
}
