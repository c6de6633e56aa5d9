//! services/api/src/web/admin.rs
//!
//! Admin-only user management. Routed behind both `require_auth` and
//! `require_admin`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{port_error, HttpError};
use crate::web::rest::UserProfile;
use crate::web::state::{AppState, CurrentUser};

#[derive(Deserialize, ToSchema)]
pub struct SetBanRequest {
    pub banned: bool,
}

/// GET /admin/users - List every account, newest first
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users", body = [UserProfile]),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserProfile>>, HttpError> {
    let users = state
        .db
        .list_users()
        .await
        .map_err(|e| port_error(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// PUT /admin/users/{user_id}/ban - Ban or unban an account
#[utoipa::path(
    put,
    path = "/admin/users/{user_id}/ban",
    tag = "Admin",
    request_body = SetBanRequest,
    params(
        ("user_id" = Uuid, Path, description = "The account to update.")
    ),
    responses(
        (status = 200, description = "Updated user", body = UserProfile),
        (status = 400, description = "Administrators cannot ban themselves"),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "No such user")
    )
)]
pub async fn set_ban_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetBanRequest>,
) -> Result<Json<UserProfile>, HttpError> {
    if req.banned && user_id == admin.user_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "Administrators cannot ban their own account.".to_string(),
        ));
    }

    let user = state
        .db
        .set_user_banned(user_id, req.banned)
        .await
        .map_err(|e| port_error(e, "Failed to update user"))?;
    info!(
        admin_id = %admin.user_id,
        user_id = %user.user_id,
        banned = user.is_banned,
        "Updated ban status."
    );

    Ok(Json(UserProfile::from(user)))
}
