mod repository;

pub use repository::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::crud::Entity;
use crate::role::Role;

/// User as saved on database.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC string, never serialized.
    #[serde(skip)]
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "password",
        "role",
        "is_active",
        "first_name",
        "last_name",
        "other_name",
        "phone",
        "birthdate",
        "created_at",
    ];
    const ORDER_BY: &'static str = "created_at";
}
