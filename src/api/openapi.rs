//! OpenAPI document and its HTTP exposure.

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, SendMessageRequest};
use super::handlers::{auth, messages, system, users};
use crate::app_state::AppState;
use crate::domain::{Message, UserId, UserProfile};
use crate::error::{ErrorBody, ErrorResponse};

/// Path the OpenAPI JSON document is served at.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Generated OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "presence-relay",
        description = "Presence, direct messaging and WebRTC signaling relay. Realtime traffic uses the `/ws` WebSocket endpoint."
    ),
    paths(
        auth::register,
        auth::login,
        auth::logout,
        users::list_users,
        users::me,
        messages::send_message,
        messages::history,
        system::health_handler,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        LogoutResponse,
        SendMessageRequest,
        UserProfile,
        UserId,
        Message,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Account registration and tokens"),
        (name = "Users", description = "User directory"),
        (name = "Messages", description = "Direct messages"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected routes.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

/// Routes serving the OpenAPI document, plus Swagger UI when the
/// `swagger-ui` feature is enabled.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()),
    )
}

/// Routes serving the OpenAPI document, plus Swagger UI when the
/// `swagger-ui` feature is enabled.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
