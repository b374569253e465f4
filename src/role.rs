//! Role-based authorization policy.
//!
//! The policy is a pure lookup over a static role/permission table. Unknown
//! role strings never deserialize into [`Role`], so they are denied by
//! construction.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Permission level attached to every user. Exactly one per user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    User,
}

/// Operations gated by the authorization policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    /// Read own profile.
    ViewSelf,
    /// Update own editable fields.
    EditSelf,
    /// Read any profile and list users.
    ViewUsers,
    /// Update, delete any user. Change roles and activation.
    ManageUsers,
}

impl Role {
    /// Check whether the role grants `permission`.
    pub fn allows(self, permission: Permission) -> bool {
        match permission {
            Permission::ViewSelf | Permission::EditSelf => true,
            Permission::ViewUsers => {
                matches!(self, Role::Admin | Role::Manager)
            },
            Permission::ManageUsers => matches!(self, Role::Admin),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::User => write!(f, "user"),
        }
    }
}
