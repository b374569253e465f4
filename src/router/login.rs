//! Login with credentials to get a token pair.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::token::ACCESS_EXPIRATION;
use crate::user::UserRepository;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(as = LoginRequest)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(as = TokenPairResponse)]
pub struct Response {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Handler to log a user in.
///
/// A successful login drops the user's revoked tokens, closing the
/// everything-revoked state a logout leaves behind.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = Body,
    responses(
        (status = 200, description = "Token pair issued", body = Response),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account deactivated"),
    ),
    tag = "auth"
)]
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let repository = UserRepository::new(state.db.postgres.clone());

    let user = repository
        .find_by_email(&body.email)
        .await?
        .ok_or(ServerError::InvalidCredentials)?;

    state.pwd.verify_password(&body.password, &user.password)?;

    if !user.is_active {
        return Err(ServerError::Forbidden);
    }

    repository.clear_revoked(user.id).await?;

    let user_id = user.id.to_string();
    let access_token = state.token.create_access(&user_id, user.role)?;
    let refresh_token = state.token.create_refresh(&user_id, user.role)?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        access_token,
        refresh_token,
        expires_in: ACCESS_EXPIRATION,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use crate::role::Role;
    use crate::token::TokenKind;
    use crate::*;

    pub(crate) const EMAIL: &str = "login@kefir.local";
    pub(crate) const PASSWORD: &str = "P$soW%920$n&";

    /// Register a user through the API, then log in. Returns the token pair.
    pub(crate) async fn register_and_login(
        app: Router,
    ) -> router::login::Response {
        let response = make_request(
            app.clone(),
            Method::POST,
            "/auth/create",
            None,
            json!({ "email": EMAIL, "password": PASSWORD }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            app,
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": EMAIL, "password": PASSWORD }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[sqlx::test]
    async fn test_login_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let tokens = register_and_login(app).await;
        assert_eq!(tokens.token_type, router::login::TOKEN_TYPE);
        assert_eq!(tokens.expires_in, token::ACCESS_EXPIRATION);

        // issue then validate resolves to the same identity.
        let claims = state.token.decode(&tokens.access_token).unwrap();
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.kind, TokenKind::Access);

        let refresh = state.token.decode(&tokens.refresh_token).unwrap();
        assert_eq!(refresh.sub, claims.sub);
        assert_eq!(refresh.kind, TokenKind::Refresh);
    }

    #[sqlx::test]
    async fn test_login_with_wrong_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        register_and_login(app.clone()).await;

        let response = make_request(
            app,
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": EMAIL, "password": "wrong-password" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_login_with_unknown_email(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            app,
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": "ghost@kefir.local", "password": PASSWORD })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
