use axum::{routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::challenge::generate_challenge,
        crate::handlers::challenge::my_history,
        crate::handlers::quota::get_quota,
        crate::handlers::health::liveness,
        crate::handlers::health::readiness,
    ),
    components(
        schemas(
            crate::models::GenerateChallengeRequest,
            crate::models::ChallengeResponse,
            crate::models::HistoryResponse,
            crate::models::QuotaResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "challenges", description = "AI generated quiz challenges"),
        (name = "quota", description = "Per-user generation quota"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Quiz Challenge API",
        version = "0.1.0",
        description = "Generates multiple-choice programming quizzes with a per-user quota"
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

pub fn create_docs_router() -> Router<AppState> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
