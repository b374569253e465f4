//! User registration.

use axum::{Json, extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::AppState;
use crate::crud::Changes;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::user::{User, UserRepository};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(as = CreateUserRequest)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub other_name: Option<String>,
    #[validate(length(min = 3, max = 20))]
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

/// Handler to create user.
///
/// Only supplied optional fields are persisted; the rest stay unset.
#[utoipa::path(
    post,
    path = "/auth/create",
    request_body = Body,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation errors"),
        (status = 409, description = "Email already used"),
    ),
    tag = "auth"
)]
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<User>)> {
    let repository = UserRepository::new(state.db.postgres.clone());

    if repository.email_exists(&body.email).await? {
        return Err(ServerError::Conflict(
            "There is already a user with the same email.".to_owned(),
        ));
    }

    let password = state.pwd.hash_password(&body.password)?;
    let changes = Changes::new()
        .set("email", body.email)
        .set("password", password)
        .set_if("first_name", body.first_name)
        .set_if("last_name", body.last_name)
        .set_if("other_name", body.other_name)
        .set_if("phone", body.phone)
        .set_if("birthdate", body.birthdate);

    let user = repository.create(changes).await?;

    tracing::info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use crate::role::Role;
    use crate::*;

    #[sqlx::test]
    async fn test_create_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            app,
            Method::POST,
            "/auth/create",
            None,
            json!({
                "email": "test@kefir.local",
                "password": "P$soW%920$n&",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["email"], "test@kefir.local");
        assert_eq!(body["role"], json!(Role::User));
        // optional fields absent from the payload stay unset.
        assert_eq!(body["first_name"], serde_json::Value::Null);
        assert_eq!(body["birthdate"], serde_json::Value::Null);
        // password hash never leaves the server.
        assert!(body.get("password").is_none());
    }

    #[sqlx::test]
    async fn test_create_with_duplicate_email(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let payload = json!({
            "email": "dup@kefir.local",
            "password": "P$soW%920$n&",
        })
        .to_string();

        let response = make_request(
            app.clone(),
            Method::POST,
            "/auth/create",
            None,
            payload.clone(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response =
            make_request(app, Method::POST, "/auth/create", None, payload)
                .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_create_with_short_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            app,
            Method::POST,
            "/auth/create",
            None,
            json!({
                "email": "short@kefir.local",
                "password": "short",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
