//! Get a new token pair with a refresh token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::router::login::{Response, TOKEN_TYPE};
use crate::token::{ACCESS_EXPIRATION, TokenKind};
use crate::user::UserRepository;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(as = RefreshRequest)]
pub struct Body {
    #[validate(length(min = 1, message = "Token must not be empty."))]
    pub token: String,
}

/// Handler to rotate a token pair.
///
/// Presenting an access token here is refused; the role is re-read from the
/// database so a role change takes effect on the next pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = Body,
    responses(
        (status = 200, description = "New token pair issued", body = Response),
        (status = 401, description = "Expired or revoked refresh token"),
        (status = 403, description = "Not a refresh token"),
    ),
    tag = "auth"
)]
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let claims = state.token.decode(&body.token)?;
    if claims.kind != TokenKind::Refresh {
        return Err(ServerError::Forbidden);
    }

    let repository = UserRepository::new(state.db.postgres.clone());
    if repository.is_token_revoked(&body.token).await? {
        return Err(ServerError::TokenInvalid);
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub)
        .map_err(|_| ServerError::TokenInvalid)?;
    let user = repository
        .get(user_id)
        .await
        .map_err(|_| ServerError::TokenInvalid)?;

    if !user.is_active {
        return Err(ServerError::Forbidden);
    }

    let access_token = state.token.create_access(&claims.sub, user.role)?;
    let refresh_token = state.token.create_refresh(&claims.sub, user.role)?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        access_token,
        refresh_token,
        expires_in: ACCESS_EXPIRATION,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use crate::router::login::tests::register_and_login;
    use crate::*;

    #[sqlx::test]
    async fn test_refresh_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let tokens = register_and_login(app.clone()).await;

        let response = make_request(
            app,
            Method::POST,
            "/auth/refresh",
            None,
            json!({ "token": tokens.refresh_token }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: router::login::Response =
            serde_json::from_slice(&body).unwrap();

        let old = state.token.decode(&tokens.access_token).unwrap();
        let new = state.token.decode(&body.access_token).unwrap();
        assert_eq!(old.sub, new.sub);
    }

    #[sqlx::test]
    async fn test_refresh_with_access_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let tokens = register_and_login(app.clone()).await;

        let response = make_request(
            app,
            Method::POST,
            "/auth/refresh",
            None,
            json!({ "token": tokens.access_token }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_refresh_with_garbage(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            app,
            Method::POST,
            "/auth/refresh",
            None,
            json!({ "token": "not-a-jwt" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
