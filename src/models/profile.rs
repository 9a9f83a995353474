use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{PermissionMatrix, RoleKind};
use crate::events::{Loggable, Severity};

/// The access-control side of a user: role, activation flag, and the
/// optional per-user permission override.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: RoleKind,
    /// Non-empty custom permissions fully replace the role defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_permissions: Option<PermissionMatrix>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Profile {
    fn entity_type() -> &'static str { "profile" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(example = "admin")]
    pub role: RoleKind,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Page-access map for the caller, one entry per guarded dashboard page.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageAccessResponse {
    pub pages: Vec<PageAccess>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PageAccess {
    #[schema(example = "/settings")]
    pub path: String,
    pub allowed: bool,
}
