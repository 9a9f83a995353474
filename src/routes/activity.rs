//! Audit-trail reads. The log records every RBAC mutation, so reading it is
//! restricted to system administrators regardless of any custom override.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::with_system_admin_permission;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityEntry {
    pub id: String,
    pub event_name: String,
    pub actor_id: Option<String>,
    pub subject_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub severity: String,
}

fn entry_from_row(row: &SqliteRow) -> Result<ActivityEntry, AppError> {
    Ok(ActivityEntry {
        id: row.get("id"),
        event_name: row.get("event_name"),
        actor_id: row.get("actor_id"),
        subject_id: row.get("subject_id"),
        occurred_at: row.get("occurred_at"),
        severity: row.get("severity"),
    })
}

/// Recent audit-trail entries, newest first
#[utoipa::path(
    get,
    path = "/activity",
    tag = "Activity",
    responses(
        (status = 200, description = "Recent activity entries", body = Vec<ActivityEntry>),
        (status = 403, description = "System admin role required"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_activity(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    with_system_admin_permission(&state, &auth).await?;

    let rows = sqlx::query(
        "SELECT id, event_name, actor_id, subject_id, occurred_at, severity \
         FROM activity_log ORDER BY occurred_at DESC LIMIT 100",
    )
    .fetch_all(&state.pool)
    .await?;

    let entries = rows
        .iter()
        .map(entry_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(entries))
}
