//! Paginated user listing.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::AppState;
use crate::crud::Page;
use crate::error::Result;
use crate::role::Permission;
use crate::router::Auth;
use crate::user::{User, UserRepository};

const DEFAULT_PER_PAGE: u32 = 50;
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct Pagination {
    /// 1-indexed page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub per_page: Option<u32>,
}

/// List users, admin side.
#[utoipa::path(
    get,
    path = "/users",
    params(Pagination),
    responses(
        (status = 200, description = "Page of users", body = Page<User>),
        (status = 403, description = "Insufficient role"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn handler(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<User>>> {
    auth.require(Permission::ViewUsers)?;

    let page = pagination.page.unwrap_or(1).max(1);
    let per_page = pagination
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let users = UserRepository::new(state.db.postgres.clone())
        .list(page, per_page)
        .await?;

    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    use crate::role::Role;
    use crate::router::users::get::tests::{ADMIN_ID, USER_ID, access_token};
    use crate::*;

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_list_users(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let token = access_token(&state, ADMIN_ID, Role::Admin);
        let response = make_request(
            app,
            Method::GET,
            "/users?page=1&per_page=10",
            Some(token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["total"], 2);
        assert_eq!(body["page"], 1);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_managers_can_list_users(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let token = access_token(&state, ADMIN_ID, Role::Manager);
        let response = make_request(
            app,
            Method::GET,
            "/users",
            Some(token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["total"], 2);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_list_users_forbidden(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let token = access_token(&state, USER_ID, Role::User);
        let response = make_request(
            app,
            Method::GET,
            "/users",
            Some(token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
