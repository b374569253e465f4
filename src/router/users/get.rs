//! Read user profiles.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::role::Permission;
use crate::router::Auth;
use crate::user::{User, UserRepository};

/// Current user behind the token.
#[utoipa::path(
    get,
    path = "/users/@me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
) -> Result<Json<User>> {
    auth.require(Permission::ViewSelf)?;

    let user = UserRepository::new(state.db.postgres.clone())
        .get(auth.user_id()?)
        .await?;

    Ok(Json(user))
}

/// Any user by id.
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Requested user", body = User),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Unknown user"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>> {
    auth.require(Permission::ViewUsers)?;

    let user = UserRepository::new(state.db.postgres.clone())
        .get(user_id)
        .await?;

    Ok(Json(user))
}
