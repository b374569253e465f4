//! Delete user from database, admin side.

use axum::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::role::Permission;
use crate::router::Auth;
use crate::user::UserRepository;

/// Handler to delete any user. Revoked tokens cascade with the row.
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Unknown user"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn handler(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require(Permission::ManageUsers)?;

    UserRepository::new(state.db.postgres.clone())
        .delete(user_id)
        .await?;

    tracing::info!(%user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use sqlx::{Pool, Postgres};

    use crate::role::Role;
    use crate::router::users::get::tests::{ADMIN_ID, USER_ID, access_token};
    use crate::*;

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_delete_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let path = format!("/users/{USER_ID}");

        let token = access_token(&state, ADMIN_ID, Role::Admin);
        let response = make_request(
            app.clone(),
            Method::DELETE,
            &path,
            Some(token.clone()),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // deleted user is gone.
        let response = make_request(
            app.clone(),
            Method::GET,
            &path,
            Some(token.clone()),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // deleting twice reports not found.
        let response = make_request(
            app,
            Method::DELETE,
            &path,
            Some(token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_delete_forbidden_for_plain_users(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let token = access_token(&state, USER_ID, Role::User);
        let response = make_request(
            app,
            Method::DELETE,
            &format!("/users/{ADMIN_ID}"),
            Some(token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
