//! HTTP routes.

pub mod create;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod status;
pub mod users;

use axum::Json;
use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Result, ServerError};
use crate::role::Permission;
use crate::token::{Claims, TokenKind};
use crate::user::UserRepository;
use crate::AppState;

const BEARER: &str = "Bearer ";

/// JSON extractor running schema validation before the handler.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(body) = Json::<T>::from_request(req, state).await?;
        body.validate()?;
        Ok(Valid(body))
    }
}

/// Authenticated caller, inserted by the [`auth`] middleware.
#[derive(Clone)]
pub struct Auth {
    pub claims: Claims,
    /// Raw bearer token as presented, kept for revocation on logout.
    pub token: String,
}

impl Auth {
    /// Authorization policy check over the static role table.
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.claims.role.allows(permission) {
            Ok(())
        } else {
            Err(ServerError::Forbidden)
        }
    }

    /// User behind the token.
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.claims.sub)
            .map_err(|_| ServerError::TokenInvalid)
    }
}

/// Custom middleware for authentification.
///
/// Only non-revoked access tokens pass; refresh tokens are rejected here and
/// accepted only by the refresh route.
pub async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix(BEARER))
        .map(str::to_owned)
        .ok_or(ServerError::TokenInvalid)?;

    let claims = state.token.decode(&token)?;
    if claims.kind != TokenKind::Access {
        return Err(ServerError::TokenInvalid);
    }

    let repository = UserRepository::new(state.db.postgres.clone());
    if repository.is_token_revoked(&token).await? {
        return Err(ServerError::TokenInvalid);
    }

    req.extensions_mut().insert(Auth { claims, token });
    Ok(next.run(req).await)
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub fn state(pool: sqlx::PgPool) -> AppState {
    use std::sync::Arc;

    AppState {
        config: Arc::new(crate::config::Configuration::default()),
        db: crate::database::Database { postgres: pool },
        token: crate::token::TokenManager::new(
            "https://localhost/",
            "test-secret",
        ),
        pwd: Arc::new(crate::crypto::PasswordManager::new(None).expect(
            "default argon2 parameters are valid",
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{Method, StatusCode, header};
    use sqlx::{Pool, Postgres};
    use tower::util::ServiceExt;

    use crate::role::Role;
    use crate::*;

    #[sqlx::test]
    async fn test_authorization_without_bearer_scheme(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        // a valid token without the `Bearer ` scheme is refused.
        let token = state
            .token
            .create_access("00000000-0000-0000-0000-000000000002", Role::User)
            .unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/users/@me")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
