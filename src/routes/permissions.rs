//! The permission-editing surface: reads and writes of per-user overrides,
//! the computed effective view, and the vocabulary for admin screens.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{
    default_permission_matrix, merge_permission_matrices, parse_permissions_from_db,
    permissions_to_matrix, resource_available_actions, with_admin_permission, with_permission,
    Action, PermissionMatrix, Resource, RoleKind,
};
use crate::errors::AppResult;
use crate::events::{log_activity, RequestContext};
use crate::jwt::AuthUser;
use crate::models::permissions::{
    EffectivePermissionsResponse, PermissionMatrixResponse, RoleDefaultEntry,
    UpdatePermissionsRequest, VocabularyResponse,
};
use crate::utils::utc_now;

use super::users::fetch_profile;

/// Read a user's stored permission override
#[utoipa::path(
    get,
    path = "/users/{id}/permissions",
    tag = "Permissions",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Stored custom permissions", body = PermissionMatrixResponse),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_custom_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PermissionMatrixResponse>> {
    with_permission(&state, &auth, Resource::Users, Action::Read).await?;

    let profile = fetch_profile(&state.pool, id).await?;
    Ok(Json(PermissionMatrixResponse {
        user_id: id,
        role: profile.role,
        custom_permissions: profile.custom_permissions.unwrap_or_default(),
    }))
}

/// Replace a user's permission override
///
/// The payload is decoded fail-closed: entries outside the closed
/// resource/action enums are dropped, and an empty result clears the
/// override so the role defaults apply again.
#[utoipa::path(
    put,
    path = "/users/{id}/permissions",
    tag = "Permissions",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Override stored (normalized)", body = PermissionMatrixResponse),
        (status = 403, description = "Insufficient permission"),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_custom_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePermissionsRequest>,
) -> AppResult<Json<PermissionMatrixResponse>> {
    let ctx = with_permission(&state, &auth, Resource::Users, Action::Update).await?;

    let old = fetch_profile(&state.pool, id).await?;

    let normalized = permissions_to_matrix(&parse_permissions_from_db(&req.permissions));
    let stored = if normalized.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&normalized).map_err(|err| {
            crate::errors::AppError::internal(format!("failed to serialize permissions: {err}"))
        })?)
    };

    sqlx::query("UPDATE profiles SET custom_permissions = ?, updated_at = ? WHERE user_id = ?")
        .bind(stored)
        .bind(utc_now())
        .bind(id.to_string())
        .execute(&state.pool)
        .await?;

    let profile = fetch_profile(&state.pool, id).await?;

    log_activity(
        &state.event_bus,
        "permissions_changed",
        Some(ctx.user_id),
        &profile,
        Some(&old),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(PermissionMatrixResponse {
        user_id: id,
        role: profile.role,
        custom_permissions: normalized,
    }))
}

/// Computed permissions for a user
///
/// `effective` follows the decision semantics (non-empty override replaces
/// the role defaults); `merged_preview` is the union shown while editing.
#[utoipa::path(
    get,
    path = "/users/{id}/permissions/effective",
    tag = "Permissions",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Effective permissions", body = EffectivePermissionsResponse),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_effective_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EffectivePermissionsResponse>> {
    with_permission(&state, &auth, Resource::Users, Action::Read).await?;

    let profile = fetch_profile(&state.pool, id).await?;
    let defaults = default_permission_matrix(profile.role);
    let custom = profile.custom_permissions.unwrap_or_default();

    let (source, effective) = if custom.is_empty() {
        ("role_defaults", defaults.clone())
    } else {
        ("custom", custom.clone())
    };

    Ok(Json(EffectivePermissionsResponse {
        user_id: id,
        role: profile.role,
        source: source.to_string(),
        effective,
        merged_preview: merge_permission_matrices(&custom, &defaults),
    }))
}

/// The closed permission vocabulary and role baselines
#[utoipa::path(
    get,
    path = "/permissions/vocabulary",
    tag = "Permissions",
    responses(
        (status = 200, description = "Resources, actions and role defaults", body = VocabularyResponse),
        (status = 403, description = "Admin role required"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn vocabulary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<VocabularyResponse>> {
    with_admin_permission(&state, &auth).await?;

    // editable vocabulary only: the wildcard is internal to system_admin
    // defaults and never appears on admin screens
    let mut available: PermissionMatrix = PermissionMatrix::new();
    for resource in Resource::ALL {
        available.insert(
            *resource,
            resource_available_actions(*resource).iter().copied().collect(),
        );
    }

    let role_defaults = [RoleKind::SystemAdmin, RoleKind::Admin, RoleKind::User]
        .into_iter()
        .map(|role| RoleDefaultEntry {
            role,
            permissions: default_permission_matrix(role),
        })
        .collect();

    Ok(Json(VocabularyResponse {
        resources: Resource::ALL.iter().map(|r| r.as_str()).collect(),
        actions: Action::ALL.iter().map(|a| a.as_str()).collect(),
        resource_available_actions: available,
        role_defaults,
    }))
}
