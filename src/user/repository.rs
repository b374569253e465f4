//! Handle database requests.

use sqlx::PgPool;
use uuid::Uuid;

use crate::crud::{Changes, Entity, Page, Store};
use crate::error::Result;
use crate::user::User;

#[derive(Clone)]
pub struct UserRepository {
    store: Store<User>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: Store::new(pool),
        }
    }

    fn pool(&self) -> &PgPool {
        self.store.pool()
    }

    /// Insert [`User`] with only the supplied fields; the database fills
    /// role, activation and timestamps.
    pub async fn create(&self, changes: Changes) -> Result<User> {
        self.store.create(changes).await
    }

    /// Find current user using `id` field.
    pub async fn get(&self, user_id: Uuid) -> Result<User> {
        self.store.get(user_id).await
    }

    /// Merge supplied fields into an existing user.
    pub async fn update(&self, user_id: Uuid, changes: Changes) -> Result<User> {
        self.store.update(user_id, changes).await
    }

    /// Delete current user. Revoked tokens cascade.
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        self.store.delete(user_id).await
    }

    /// Paginated user listing.
    pub async fn list(&self, page: u32, per_page: u32) -> Result<Page<User>> {
        self.store.list(page, per_page).await
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT {} FROM {} WHERE email = $1",
            User::COLUMNS.join(", "),
            User::TABLE
        );

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(self.pool())
            .await?)
    }

    /// Check existence of a user by email.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    /// Insert a token into the revocation list.
    pub async fn revoke_token(&self, token: &str, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token, user_id) VALUES ($1, $2)
                ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Check whether a token has been revoked.
    pub async fn is_token_revoked(&self, token: &str) -> Result<bool> {
        let revoked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(self.pool())
        .await?;

        Ok(revoked)
    }

    /// Drop all revoked tokens of a user. Called on successful login.
    pub async fn clear_revoked(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
