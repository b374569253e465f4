//! Public configuration page for front-end identification.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::Configuration;

/// Structured configuration.
#[derive(Serialize, ToSchema)]
pub struct Status {
    version: String,
    name: String,
}

/// Public server status (configuration).
#[utoipa::path(
    get,
    path = "/status.json",
    responses((status = 200, description = "Instance info", body = Status)),
    tag = "status"
)]
pub async fn status(
    State(config): State<Arc<Configuration>>,
) -> Json<Status> {
    Json(Status {
        version: env!("CARGO_PKG_VERSION").into(),
        name: if config.name.is_empty() {
            env!("CARGO_CRATE_NAME").into()
        } else {
            config.name.clone()
        },
    })
}
