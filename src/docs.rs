use std::sync::Arc;

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            HealthResponse,
            models::user::User,
            models::user::AuthResponse,
            models::user::LoginRequest,
            models::user::RegisterRequest,
            models::profile::Profile,
            models::profile::UpdateRoleRequest,
            models::profile::SetActiveRequest,
            models::profile::PageAccessResponse,
            models::profile::PageAccess,
            models::permissions::UpdatePermissionsRequest,
            models::permissions::PermissionMatrixResponse,
            models::permissions::EffectivePermissionsResponse,
            models::permissions::VocabularyResponse,
            models::permissions::RoleDefaultEntry,
            crate::routes::activity::ActivityEntry
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User administration"),
        (name = "Permissions", description = "Permission overrides and vocabulary"),
        (name = "Activity", description = "Audit trail")
    )
)]
pub struct ApiDoc;

pub fn build_openapi() -> anyhow::Result<utoipa::openapi::OpenApi> {
    let mut doc = serde_json::to_value(ApiDoc::openapi())?;

    // bearerAuth security scheme so Swagger's Authorize dialog works
    let components = doc
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))?
        .entry("components")
        .or_insert_with(|| serde_json::json!({}));
    if let Some(components) = components.as_object_mut() {
        components.entry("securitySchemes").or_insert_with(|| {
            serde_json::json!({
                "bearerAuth": {
                    "type": "http",
                    "scheme": "bearer",
                    "bearerFormat": "JWT"
                }
            })
        });
    }

    Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
    let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
        .try_it_out_enabled(true)
        .persist_authorization(true);

    let doc_json = Arc::new(serde_json::to_value(&doc).expect("OpenAPI serialization must succeed"));

    let json_route = {
        let doc_json = Arc::clone(&doc_json);
        get(move || {
            let doc_json = Arc::clone(&doc_json);
            async move { Json((*doc_json).clone()) }
        })
    };

    Router::new()
        .route("/api-docs/openapi.json", json_route)
        .merge(SwaggerUi::new("/docs").config(swagger_config))
}
