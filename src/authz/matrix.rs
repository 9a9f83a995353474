//! Permission collections and the conversions between their two shapes.
//!
//! Permissions travel in two isomorphic representations: a flat
//! `Vec<Permission>` list used by the decision function, and a
//! resource → action-set matrix used as the storage/wire shape. Conversion is
//! lossless both ways modulo de-duplication.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::vocab::{Action, Resource};

/// One `(resource, action)` grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }
}

/// Storage/wire shape: resource → duplicate-free action set.
///
/// BTree containers keep serialization deterministic and collapse duplicate
/// `(resource, action)` pairs to one entry.
pub type PermissionMatrix = BTreeMap<Resource, BTreeSet<Action>>;

/// Decode a loosely-typed matrix coming from the backing store.
///
/// Fails closed: a non-object input yields an empty list, and any key or
/// action string outside the closed enums is silently dropped. Never panics
/// and never grants anything it could not name.
pub fn parse_permissions_from_db(raw: &Value) -> Vec<Permission> {
    let Some(entries) = raw.as_object() else {
        return Vec::new();
    };

    let mut seen: BTreeSet<(Resource, Action)> = BTreeSet::new();
    for (key, actions) in entries {
        let Some(resource) = Resource::parse(key) else {
            tracing::debug!(resource = %key, "dropping unknown resource in stored permissions");
            continue;
        };
        let Some(actions) = actions.as_array() else {
            continue;
        };
        for action in actions {
            let Some(action) = action.as_str().and_then(Action::parse) else {
                tracing::debug!(resource = %key, "dropping unknown action in stored permissions");
                continue;
            };
            seen.insert((resource, action));
        }
    }

    seen.into_iter()
        .map(|(resource, action)| Permission::new(resource, action))
        .collect()
}

/// Collapse a permission list into matrix shape.
pub fn permissions_to_matrix(permissions: &[Permission]) -> PermissionMatrix {
    let mut matrix = PermissionMatrix::new();
    for permission in permissions {
        matrix
            .entry(permission.resource)
            .or_default()
            .insert(permission.action);
    }
    matrix
}

/// Flatten a matrix back into list shape.
pub fn matrix_to_permissions(matrix: &PermissionMatrix) -> Vec<Permission> {
    matrix
        .iter()
        .flat_map(|(resource, actions)| {
            actions
                .iter()
                .map(|action| Permission::new(*resource, *action))
        })
        .collect()
}

/// `manage` on a resource answers for every action on that resource;
/// otherwise exact membership.
pub fn has_permission_in_matrix(matrix: &PermissionMatrix, resource: Resource, action: Action) -> bool {
    matrix
        .get(&resource)
        .map(|actions| actions.contains(&Action::Manage) || actions.contains(&action))
        .unwrap_or(false)
}

/// Per-resource union of two matrices, custom over defaults.
///
/// This is the administrative preview combinator only. Live access decisions
/// use override-wins semantics (see [`super::decision::has_permission`]);
/// never feed this merge into a decision.
pub fn merge_permission_matrices(custom: &PermissionMatrix, defaults: &PermissionMatrix) -> PermissionMatrix {
    let mut merged = defaults.clone();
    for (resource, actions) in custom {
        merged.entry(*resource).or_default().extend(actions.iter().copied());
    }
    merged
}
