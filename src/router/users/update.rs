//! Partial user updates.
//!
//! Only fields present in the payload are written; everything omitted keeps
//! its stored value. The admin variant may additionally change role and
//! activation.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::crud::Changes;
use crate::error::Result;
use crate::role::{Permission, Role};
use crate::router::{Auth, Valid};
use crate::user::{User, UserRepository};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(as = UpdateUserRequest)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: Option<String>,
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

impl Body {
    /// Explicit field-present list from the payload.
    fn changes(self) -> Changes {
        Changes::new()
            .set_if("email", self.email)
            .set_if("first_name", self.first_name)
            .set_if("last_name", self.last_name)
            .set_if("other_name", self.other_name)
            .set_if("phone", self.phone)
            .set_if("birthdate", self.birthdate)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(as = UpdateUserAdminRequest)]
pub struct AdminBody {
    #[serde(flatten)]
    #[validate(nested)]
    pub editable: Body,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Update own editable fields.
#[utoipa::path(
    patch,
    path = "/users/@me",
    request_body = Body,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Validation errors"),
        (status = 409, description = "Email already used"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Valid(body): Valid<Body>,
) -> Result<Json<User>> {
    auth.require(Permission::EditSelf)?;

    let user = UserRepository::new(state.db.postgres.clone())
        .update(auth.user_id()?, body.changes())
        .await?;

    Ok(Json(user))
}

/// Update any user, admin side.
#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = AdminBody,
    responses(
        (status = 200, description = "Updated user", body = User),
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
    Valid(body): Valid<AdminBody>,
) -> Result<Json<User>> {
    auth.require(Permission::ManageUsers)?;

    let changes = body
        .editable
        .changes()
        .set_if("role", body.role)
        .set_if("is_active", body.is_active);

    let user = UserRepository::new(state.db.postgres.clone())
        .update(user_id, changes)
        .await?;

    Ok(Json(user))
}
