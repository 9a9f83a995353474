//! Enforcement boundary: the guards every protected handler calls before its
//! business logic runs.
//!
//! State machine per request:
//! Unauthenticated -> Authenticated (profile loaded) -> {Active, Inactive};
//! Inactive is terminal-deny; Active proceeds to the permission decision ->
//! {Allowed, Denied}. Each guard performs exactly one profile lookup and
//! nothing downstream re-checks permissions.

use sqlx::Row;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppError;
use crate::jwt::AuthUser;

use super::decision::has_permission;
use super::matrix::{parse_permissions_from_db, Permission};
use super::vocab::{Action, Resource, RoleKind};

/// Resolved caller identity for one request. Constructed fresh per inbound
/// request, never persisted, discarded when the request ends.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub role: RoleKind,
    pub custom_permissions: Vec<Permission>,
    pub is_active: bool,
}

impl AuthContext {
    /// Decide a `(resource, action)` pair for this caller.
    ///
    /// An inactive account denies everything; otherwise non-empty custom
    /// permissions fully replace the role defaults.
    pub fn can(&self, resource: Resource, action: Action) -> bool {
        if !self.is_active {
            return false;
        }
        let custom = if self.custom_permissions.is_empty() {
            None
        } else {
            Some(self.custom_permissions.as_slice())
        };
        has_permission(self.role, resource, action, custom)
    }
}

/// Authenticate the caller and load their profile.
///
/// Denies with 404 when no profile row exists for the authenticated user and
/// with 403 when the profile is deactivated. The 401 case is handled earlier
/// by the [`AuthUser`] extractor.
pub async fn with_auth(state: &AppState, auth: &AuthUser) -> Result<AuthContext, AppError> {
    // the join drops soft-deleted accounts: a valid token for a deleted user
    // resolves to no profile
    let row = sqlx::query(
        "SELECT p.id, p.role, p.custom_permissions, p.is_active \
         FROM profiles p \
         INNER JOIN users u ON u.id = p.user_id \
         WHERE p.user_id = ? AND u.deleted_at IS NULL",
    )
    .bind(auth.user_id.to_string())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("profile not found"))?;

    let profile_id = Uuid::parse_str(row.get::<&str, _>("id"))
        .map_err(|err| AppError::internal(format!("invalid profile id: {err}")))?;

    let role_str: String = row.get("role");
    let role = RoleKind::parse(&role_str)
        .ok_or_else(|| AppError::internal(format!("unknown role kind: {role_str}")))?;

    let custom_permissions = match row.get::<Option<String>, _>("custom_permissions") {
        Some(raw) => {
            // stored as loose JSON; unknown entries are dropped, malformed
            // payloads fail closed to an empty list
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);
            parse_permissions_from_db(&value)
        }
        None => Vec::new(),
    };

    let is_active: bool = row.get("is_active");
    if !is_active {
        tracing::debug!(user_id = %auth.user_id, "denying inactive account");
        return Err(AppError::forbidden("account is inactive"));
    }

    Ok(AuthContext {
        user_id: auth.user_id,
        profile_id,
        role,
        custom_permissions,
        is_active,
    })
}

/// Authenticate and require one `(resource, action)` permission.
///
/// The deny message is deliberately generic so callers cannot learn which
/// permission they were missing.
pub async fn with_permission(
    state: &AppState,
    auth: &AuthUser,
    resource: Resource,
    action: Action,
) -> Result<AuthContext, AppError> {
    let ctx = with_auth(state, auth).await?;

    if !ctx.can(resource, action) {
        tracing::debug!(
            user_id = %ctx.user_id,
            role = %ctx.role.as_str(),
            resource = %resource.as_str(),
            action = %action.as_str(),
            "permission denied"
        );
        return Err(AppError::forbidden("operation not permitted"));
    }

    tracing::debug!(
        user_id = %ctx.user_id,
        resource = %resource.as_str(),
        action = %action.as_str(),
        "permission granted"
    );
    Ok(ctx)
}

/// Identity-only shortcut: require `admin` or `system_admin`, bypassing the
/// permission matrix entirely.
pub async fn with_admin_permission(state: &AppState, auth: &AuthUser) -> Result<AuthContext, AppError> {
    let ctx = with_auth(state, auth).await?;
    match ctx.role {
        RoleKind::Admin | RoleKind::SystemAdmin => Ok(ctx),
        RoleKind::User => Err(AppError::forbidden("operation not permitted")),
    }
}

/// Identity-only shortcut: require `system_admin`.
pub async fn with_system_admin_permission(
    state: &AppState,
    auth: &AuthUser,
) -> Result<AuthContext, AppError> {
    let ctx = with_auth(state, auth).await?;
    if ctx.role != RoleKind::SystemAdmin {
        return Err(AppError::forbidden("operation not permitted"));
    }
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: RoleKind, custom: Vec<Permission>, is_active: bool) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            role,
            custom_permissions: custom,
            is_active,
        }
    }

    #[test]
    fn inactive_context_denies_everything() {
        let ctx = ctx(RoleKind::SystemAdmin, Vec::new(), false);
        for resource in Resource::ALL {
            for action in Action::ALL {
                assert!(!ctx.can(*resource, *action));
            }
        }
    }

    #[test]
    fn active_context_uses_role_defaults() {
        let ctx = ctx(RoleKind::User, Vec::new(), true);
        assert!(ctx.can(Resource::ToolChanges, Action::Create));
        assert!(!ctx.can(Resource::Users, Action::Read));
    }

    #[test]
    fn custom_permissions_override_in_context() {
        let ctx = ctx(
            RoleKind::User,
            vec![Permission::new(Resource::Users, Action::Read)],
            true,
        );
        assert!(ctx.can(Resource::Users, Action::Read));
        // defaults no longer apply once a custom list is present
        assert!(!ctx.can(Resource::Dashboard, Action::Read));
    }
}
