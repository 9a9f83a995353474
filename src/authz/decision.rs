//! The access decision function: pure, total, deterministic.
//!
//! Evaluation order:
//! 1. system_admin -> allow (no matrix consulted, custom permissions ignored)
//! 2. effective list = non-empty custom permissions, else role defaults
//! 3. match `(*, manage)`, `(resource, manage)` or `(resource, action)`
//! 4. deny

use super::defaults::default_permissions;
use super::matrix::Permission;
use super::vocab::{Action, Resource, RoleKind};

/// Decide allow/deny for one `(role, resource, action)` request.
///
/// `custom` is the caller's stored override list. When present and non-empty
/// it fully replaces the role defaults (override-wins, never additive).
pub fn has_permission(
    role: RoleKind,
    resource: Resource,
    action: Action,
    custom: Option<&[Permission]>,
) -> bool {
    if role == RoleKind::SystemAdmin {
        return true;
    }

    let effective = match custom {
        Some(list) if !list.is_empty() => list,
        _ => default_permissions(role),
    };

    effective.iter().any(|entry| {
        (entry.resource == Resource::Wildcard && entry.action == Action::Manage)
            || (entry.resource == resource && entry.action == Action::Manage)
            || (entry.resource == resource && entry.action == action)
    })
}

/// Page paths and the single `(resource, action)` pair each one requires.
const PAGE_PERMISSIONS: &[(&str, Resource, Action)] = &[
    ("/dashboard", Resource::Dashboard, Action::Read),
    ("/equipment", Resource::Equipment, Action::Read),
    ("/endmills", Resource::Endmills, Action::Read),
    ("/inventory", Resource::Inventory, Action::Read),
    ("/cam-sheets", Resource::CamSheets, Action::Read),
    ("/tool-changes", Resource::ToolChanges, Action::Read),
    ("/disposals", Resource::EndmillDisposals, Action::Read),
    ("/reports", Resource::Reports, Action::Read),
    ("/settings", Resource::Settings, Action::Read),
    ("/users", Resource::Users, Action::Read),
    ("/ai-insights", Resource::AiInsights, Action::Use),
];

/// All page paths under access control, for building per-caller page maps.
pub fn known_pages() -> impl Iterator<Item = &'static str> {
    PAGE_PERMISSIONS.iter().map(|(path, _, _)| *path)
}

/// Decide whether a caller may open a dashboard page.
///
/// Unmapped paths allow. That mirrors the shipped product behavior; routes
/// that matter are all in the table above.
pub fn can_access_page(role: RoleKind, path: &str, custom: Option<&[Permission]>) -> bool {
    match PAGE_PERMISSIONS.iter().find(|(page, _, _)| *page == path) {
        Some((_, resource, action)) => has_permission(role, *resource, *action, custom),
        None => true,
    }
}
