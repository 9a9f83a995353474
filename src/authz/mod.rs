//! Access-control core - vocabulary, role defaults, matrix utilities,
//! decision function, and the request guards.
//!
//! Layering (leaves first):
//! - `vocab`: closed resource/action/role enumerations
//! - `defaults`: static baseline tables per role
//! - `matrix`: parse/merge/query over permission collections (pure)
//! - `decision`: the allow/deny function (pure, total)
//! - `guard`: enforcement boundary invoked by every protected handler

pub mod decision;
pub mod defaults;
pub mod guard;
pub mod matrix;
pub mod vocab;

pub use decision::{can_access_page, has_permission};
pub use defaults::{default_permission_matrix, default_permissions, resource_available_actions};
pub use guard::{
    with_admin_permission, with_auth, with_permission, with_system_admin_permission, AuthContext,
};
pub use matrix::{
    has_permission_in_matrix, matrix_to_permissions, merge_permission_matrices,
    parse_permissions_from_db, permissions_to_matrix, Permission, PermissionMatrix,
};
pub use vocab::{has_higher_role, Action, Resource, RoleKind};
