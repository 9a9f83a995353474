//! Static baseline tables: role defaults and the advisory per-resource
//! action vocabulary. Immutable, initialized at compile time, safe to read
//! from any number of concurrent requests.

use super::matrix::{permissions_to_matrix, Permission, PermissionMatrix};
use super::vocab::{Action, Resource, RoleKind};

const SYSTEM_ADMIN_DEFAULTS: &[Permission] =
    &[Permission::new(Resource::Wildcard, Action::Manage)];

const ADMIN_DEFAULTS: &[Permission] = &[
    Permission::new(Resource::Users, Action::Manage),
    Permission::new(Resource::Equipment, Action::Manage),
    Permission::new(Resource::Endmills, Action::Manage),
    Permission::new(Resource::Inventory, Action::Manage),
    Permission::new(Resource::CamSheets, Action::Manage),
    Permission::new(Resource::ToolChanges, Action::Manage),
    Permission::new(Resource::EndmillDisposals, Action::Manage),
    Permission::new(Resource::Settings, Action::Manage),
    Permission::new(Resource::AiInsights, Action::Manage),
    Permission::new(Resource::Dashboard, Action::Read),
    Permission::new(Resource::Reports, Action::Read),
];

// Operators read most areas, record their own tool changes, and can invoke
// the AI insight features. No settings, no user administration.
const USER_DEFAULTS: &[Permission] = &[
    Permission::new(Resource::Dashboard, Action::Read),
    Permission::new(Resource::Equipment, Action::Read),
    Permission::new(Resource::Endmills, Action::Read),
    Permission::new(Resource::Inventory, Action::Read),
    Permission::new(Resource::CamSheets, Action::Read),
    Permission::new(Resource::ToolChanges, Action::Create),
    Permission::new(Resource::ToolChanges, Action::Read),
    Permission::new(Resource::ToolChanges, Action::Update),
    Permission::new(Resource::EndmillDisposals, Action::Read),
    Permission::new(Resource::Reports, Action::Read),
    Permission::new(Resource::AiInsights, Action::Use),
];

/// Baseline permission list for a role kind.
pub fn default_permissions(role: RoleKind) -> &'static [Permission] {
    match role {
        RoleKind::SystemAdmin => SYSTEM_ADMIN_DEFAULTS,
        RoleKind::Admin => ADMIN_DEFAULTS,
        RoleKind::User => USER_DEFAULTS,
    }
}

/// Baseline permissions in matrix shape, duplicate-free per resource.
pub fn default_permission_matrix(role: RoleKind) -> PermissionMatrix {
    permissions_to_matrix(default_permissions(role))
}

/// Which actions are meaningful per resource.
///
/// Advisory metadata for the permission-editing UI and its validation; the
/// decision function never consults this table, so a stored pair outside it
/// still evaluates normally.
pub fn resource_available_actions(resource: Resource) -> &'static [Action] {
    match resource {
        Resource::Dashboard => &[Action::Read],
        Resource::Equipment => &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ],
        Resource::Endmills => &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ],
        Resource::Inventory => &[Action::Create, Action::Read, Action::Update, Action::Manage],
        Resource::CamSheets => &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ],
        Resource::ToolChanges => &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ],
        Resource::EndmillDisposals => &[Action::Create, Action::Read, Action::Delete, Action::Manage],
        Resource::Reports => &[Action::Read],
        Resource::Settings => &[Action::Read, Action::Update, Action::Manage],
        Resource::Users => &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ],
        Resource::AiInsights => &[Action::Read, Action::Use, Action::Manage],
        Resource::Wildcard => &[Action::Manage],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::matrix::has_permission_in_matrix;

    #[test]
    fn system_admin_defaults_are_wildcard_manage() {
        assert_eq!(
            default_permissions(RoleKind::SystemAdmin),
            &[Permission::new(Resource::Wildcard, Action::Manage)]
        );
    }

    #[test]
    fn admin_defaults_manage_users() {
        let matrix = default_permission_matrix(RoleKind::Admin);
        assert!(has_permission_in_matrix(&matrix, Resource::Users, Action::Delete));
        assert!(has_permission_in_matrix(&matrix, Resource::Dashboard, Action::Read));
        // read-only on dashboard and reports, no manage
        assert!(!has_permission_in_matrix(&matrix, Resource::Reports, Action::Update));
    }

    #[test]
    fn user_defaults_have_no_settings_entry() {
        let matrix = default_permission_matrix(RoleKind::User);
        assert!(matrix.get(&Resource::Settings).is_none());
        assert!(matrix.get(&Resource::Users).is_none());
        assert!(has_permission_in_matrix(&matrix, Resource::ToolChanges, Action::Create));
        assert!(has_permission_in_matrix(&matrix, Resource::AiInsights, Action::Use));
        assert!(!has_permission_in_matrix(&matrix, Resource::Endmills, Action::Update));
    }

    #[test]
    fn default_matrices_are_duplicate_free() {
        for role in [RoleKind::SystemAdmin, RoleKind::Admin, RoleKind::User] {
            let list = default_permissions(role);
            let matrix = default_permission_matrix(role);
            let total: usize = matrix.values().map(|actions| actions.len()).sum();
            assert_eq!(total, list.len());
        }
    }
}
