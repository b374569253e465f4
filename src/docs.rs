//! OpenAPI document, served at `/api-docs/openapi.json` with Swagger UI on
//! `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "kefir",
        description = "User management API with role-based access control."
    ),
    paths(
        crate::router::create::handler,
        crate::router::login::handler,
        crate::router::refresh::handler,
        crate::router::logout::handler,
        crate::router::status::status,
        crate::router::users::get::me,
        crate::router::users::get::by_id,
        crate::router::users::list::handler,
        crate::router::users::update::me,
        crate::router::users::update::by_id,
        crate::router::users::delete::handler,
    ),
    components(schemas(crate::user::User, crate::role::Role)),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token lifecycle."),
        (name = "users", description = "User profiles."),
        (name = "status", description = "Instance information."),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
