//! Revoke the presented token.

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::Result;
use crate::router::Auth;
use crate::user::UserRepository;

/// Handler to log a user out.
///
/// The token goes to the revocation list and stops passing the auth
/// middleware even before its expiry.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn handler(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
) -> Result<StatusCode> {
    let repository = UserRepository::new(state.db.postgres.clone());
    repository.revoke_token(&auth.token, auth.user_id()?).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use crate::router::login::tests::register_and_login;
    use crate::*;

    #[sqlx::test]
    async fn test_logout_revokes_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let tokens = register_and_login(app.clone()).await;

        // token works before logout.
        let response = make_request(
            app.clone(),
            Method::GET,
            "/users/@me",
            Some(tokens.access_token.clone()),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            app.clone(),
            Method::POST,
            "/auth/logout",
            Some(tokens.access_token.clone()),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // and is refused afterwards.
        let response = make_request(
            app.clone(),
            Method::GET,
            "/users/@me",
            Some(tokens.access_token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // a fresh login clears the revocation list.
        let response = make_request(
            app,
            Method::POST,
            "/auth/login",
            None,
            json!({
                "email": router::login::tests::EMAIL,
                "password": router::login::tests::PASSWORD,
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_logout_without_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            app,
            Method::POST,
            "/auth/logout",
            None,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
