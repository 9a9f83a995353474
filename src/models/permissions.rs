use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{PermissionMatrix, RoleKind};

/// Write shape for the permission-editing surface.
///
/// The payload is deliberately loose (`Record<resource, action[]>`): it is
/// decoded through the fail-closed parse boundary, which drops anything
/// outside the closed enums instead of rejecting the request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionsRequest {
    #[schema(value_type = Object, example = json!({"endmills": ["read", "update"]}))]
    pub permissions: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionMatrixResponse {
    pub user_id: Uuid,
    pub role: RoleKind,
    /// The stored override, already normalized to the closed enums.
    pub custom_permissions: PermissionMatrix,
}

/// Computed view for admin screens: what actually applies (override-wins)
/// plus the union-merge preview used while editing.
#[derive(Debug, Serialize, ToSchema)]
pub struct EffectivePermissionsResponse {
    pub user_id: Uuid,
    pub role: RoleKind,
    /// "custom" when a non-empty override is stored, else "role_defaults".
    #[schema(example = "role_defaults")]
    pub source: String,
    pub effective: PermissionMatrix,
    /// defaults ∪ custom; editing preview only, never used for decisions.
    pub merged_preview: PermissionMatrix,
}

/// The closed vocabulary, for rendering permission-editing checkboxes.
#[derive(Debug, Serialize, ToSchema)]
pub struct VocabularyResponse {
    pub resources: Vec<&'static str>,
    pub actions: Vec<&'static str>,
    /// Advisory: which actions are meaningful per resource.
    pub resource_available_actions: PermissionMatrix,
    pub role_defaults: Vec<RoleDefaultEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleDefaultEntry {
    pub role: RoleKind,
    pub permissions: PermissionMatrix,
}
