//! Users-related HTTP API.
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use axum::routing::get;
use axum::{Router, middleware};

use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /users/@me` and `PATCH /users/@me`, any role.
        .route("/@me", get(get::me).patch(update::me))
        // `GET /users`, admins and managers.
        .route("/", get(list::handler))
        // by-id operations, admin side.
        .route(
            "/{user_id}",
            get(get::by_id)
                .patch(update::by_id)
                .delete(delete::handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::router::auth,
        ))
}
