//! User administration: the business-logic collaborator that exercises the
//! enforcement boundary. Every handler calls a guard before touching data,
//! and RBAC mutations are logged with Critical severity.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{
    has_higher_role, parse_permissions_from_db, permissions_to_matrix, with_permission, Action,
    Resource, RoleKind,
};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, RequestContext};
use crate::jwt::AuthUser;
use crate::models::profile::{Profile, SetActiveRequest, UpdateRoleRequest};
use crate::utils::utc_now;

pub(crate) fn profile_from_row(row: &SqliteRow) -> Result<Profile, AppError> {
    let id = Uuid::parse_str(row.get::<&str, _>("id"))
        .map_err(|err| AppError::internal(format!("invalid profile id: {err}")))?;
    let user_id = Uuid::parse_str(row.get::<&str, _>("user_id"))
        .map_err(|err| AppError::internal(format!("invalid user id: {err}")))?;

    let role_str: String = row.get("role");
    let role = RoleKind::parse(&role_str)
        .ok_or_else(|| AppError::internal(format!("unknown role kind: {role_str}")))?;

    let custom_permissions = row
        .get::<Option<String>, _>("custom_permissions")
        .map(|raw| {
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);
            permissions_to_matrix(&parse_permissions_from_db(&value))
        })
        .filter(|matrix| !matrix.is_empty());

    Ok(Profile {
        id,
        user_id,
        name: row.get("name"),
        email: row.get("email"),
        role,
        custom_permissions,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const PROFILE_SELECT: &str = r#"
    SELECT p.id, p.user_id, u.name, u.email, p.role, p.custom_permissions,
           p.is_active, p.created_at, p.updated_at
    FROM profiles p
    INNER JOIN users u ON u.id = p.user_id
"#;

pub(crate) async fn fetch_profile(pool: &SqlitePool, user_id: Uuid) -> AppResult<Profile> {
    let sql = format!("{PROFILE_SELECT} WHERE p.user_id = ? AND u.deleted_at IS NULL");
    let row = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("profile not found"))?;

    profile_from_row(&row)
}

/// List all active profiles
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "List of profiles", body = Vec<Profile>),
        (status = 403, description = "Insufficient permission"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Profile>>> {
    with_permission(&state, &auth, Resource::Users, Action::Read).await?;

    let sql = format!("{PROFILE_SELECT} WHERE u.deleted_at IS NULL ORDER BY u.name");
    let rows = sqlx::query(&sql).fetch_all(&state.pool).await?;

    let profiles = rows
        .iter()
        .map(profile_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(profiles))
}

/// Get one profile by user id
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile details", body = Profile),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Profile>> {
    with_permission(&state, &auth, Resource::Users, Action::Read).await?;
    let profile = fetch_profile(&state.pool, id).await?;
    Ok(Json(profile))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = Profile),
        (status = 403, description = "Insufficient permission"),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> AppResult<Json<Profile>> {
    let ctx = with_permission(&state, &auth, Resource::Users, Action::Update).await?;

    // nobody hands out a role above their own
    if has_higher_role(req.role, ctx.role) {
        return Err(AppError::forbidden("operation not permitted"));
    }

    let old = fetch_profile(&state.pool, id).await?;

    sqlx::query("UPDATE profiles SET role = ?, updated_at = ? WHERE user_id = ?")
        .bind(req.role.as_str())
        .bind(utc_now())
        .bind(id.to_string())
        .execute(&state.pool)
        .await?;

    let profile = fetch_profile(&state.pool, id).await?;

    log_activity(
        &state.event_bus,
        "role_changed",
        Some(ctx.user_id),
        &profile,
        Some(&old),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(profile))
}

/// Activate or deactivate a profile
#[utoipa::path(
    put,
    path = "/users/{id}/active",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Activation flag updated", body = Profile),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_active(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> AppResult<Json<Profile>> {
    let ctx = with_permission(&state, &auth, Resource::Users, Action::Update).await?;

    let old = fetch_profile(&state.pool, id).await?;

    // a caller never toggles an account above their own role
    if has_higher_role(old.role, ctx.role) {
        return Err(AppError::forbidden("operation not permitted"));
    }

    sqlx::query("UPDATE profiles SET is_active = ?, updated_at = ? WHERE user_id = ?")
        .bind(req.is_active)
        .bind(utc_now())
        .bind(id.to_string())
        .execute(&state.pool)
        .await?;

    let profile = fetch_profile(&state.pool, id).await?;

    log_activity(
        &state.event_bus,
        if req.is_active { "activated" } else { "deactivated" },
        Some(ctx.user_id),
        &profile,
        Some(&old),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(profile))
}

/// Soft-delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let ctx = with_permission(&state, &auth, Resource::Users, Action::Delete).await?;

    let profile = fetch_profile(&state.pool, id).await?;

    // same rule as role and activation changes
    if has_higher_role(profile.role, ctx.role) {
        return Err(AppError::forbidden("operation not permitted"));
    }

    sqlx::query("UPDATE users SET deleted_at = ? WHERE id = ?")
        .bind(utc_now())
        .bind(id.to_string())
        .execute(&state.pool)
        .await?;

    log_activity(
        &state.event_bus,
        "deleted",
        Some(ctx.user_id),
        &profile,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(StatusCode::NO_CONTENT)
}
