use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt; // for `oneshot`

use toolroom::create_app;

async fn setup() -> Result<(Router, SqlitePool, tempfile::TempDir)> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    use sqlx::sqlite::SqliteConnectOptions;
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool.clone()).await?;

    Ok((app, pool, dir))
}

async fn register(app: &Router, name: &str, email: &str) -> Result<(String, String)> {
    let body = json!({ "name": name, "email": email, "password": "password123" });
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?;

    let resp: Response = app.clone().oneshot(req).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    if status != StatusCode::CREATED {
        panic!("register failed: {} - {}", status, String::from_utf8_lossy(&body_bytes));
    }

    let auth_res: Value = serde_json::from_slice(&body_bytes)?;
    let token = auth_res
        .get("token")
        .and_then(|v| v.as_str())
        .context("missing token")?
        .to_string();
    let user_id = auth_res
        .get("user")
        .and_then(|u| u.get("id"))
        .and_then(|v| v.as_str())
        .context("missing user id")?
        .to_string();

    Ok((token, user_id))
}

async fn set_role(pool: &SqlitePool, user_id: &str, role: &str) -> Result<()> {
    sqlx::query("UPDATE profiles SET role = ? WHERE user_id = ?")
        .bind(role)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let resp: Response = app.clone().oneshot(builder.body(Body::empty())?).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    Ok((status, value))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    payload: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    let body = match payload {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let resp: Response = app.clone().oneshot(builder.body(body)?).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    Ok((status, value))
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let (status, body) = get(&app, "/users", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.get("error").and_then(|v| v.as_str()), Some("unauthorized"));

    Ok(())
}

#[tokio::test]
async fn operator_role_cannot_list_users() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;
    let (token, _) = register(&app, "Operator", "op@example.com").await?;

    let (status, body) = get(&app, "/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // the deny never names the missing permission
    let message = body.get("message").and_then(|v| v.as_str()).unwrap_or_default();
    assert!(!message.contains("users"), "deny leaked the permission: {message}");

    Ok(())
}

#[tokio::test]
async fn admin_role_can_list_users() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (token, user_id) = register(&app, "Admin", "admin@example.com").await?;
    set_role(&pool, &user_id, "admin").await?;

    let (status, body) = get(&app, "/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().map(|list| !list.is_empty()).unwrap_or(false));

    Ok(())
}

#[tokio::test]
async fn inactive_profile_is_forbidden_everywhere() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (token, user_id) = register(&app, "Gone", "gone@example.com").await?;

    sqlx::query("UPDATE profiles SET is_active = 0 WHERE user_id = ?")
        .bind(&user_id)
        .execute(&pool)
        .await?;

    let (status, _) = get(&app, "/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // inactive also denies endpoints the role would otherwise reach
    let (status, _) = get(&app, "/auth/me/pages", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn missing_profile_is_not_found() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (token, user_id) = register(&app, "Ghost", "ghost@example.com").await?;

    sqlx::query("DELETE FROM profiles WHERE user_id = ?")
        .bind(&user_id)
        .execute(&pool)
        .await?;

    let (status, body) = get(&app, "/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.get("error").and_then(|v| v.as_str()), Some("not_found"));

    Ok(())
}

#[tokio::test]
async fn custom_override_replaces_role_defaults() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (token, user_id) = register(&app, "Override", "override@example.com").await?;

    // a user role normally has dashboard read but no users read
    let (status, _) = get(&app, "/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    sqlx::query("UPDATE profiles SET custom_permissions = ? WHERE user_id = ?")
        .bind(json!({ "users": ["read"] }).to_string())
        .bind(&user_id)
        .execute(&pool)
        .await?;

    let (status, _) = get(&app, "/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);

    // the override fully replaces the defaults: dashboard page access is gone
    let (status, body) = get(&app, "/auth/me/pages", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    let pages = body.get("pages").and_then(|v| v.as_array()).context("missing pages")?;
    let allowed = |path: &str| {
        pages
            .iter()
            .find(|p| p.get("path").and_then(|v| v.as_str()) == Some(path))
            .and_then(|p| p.get("allowed"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    };
    assert!(allowed("/users"));
    assert!(!allowed("/dashboard"));

    Ok(())
}

#[tokio::test]
async fn system_admin_bypasses_custom_permissions() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (token, user_id) = register(&app, "Root", "root@example.com").await?;
    set_role(&pool, &user_id, "system_admin").await?;

    // even a deny-everything override never restricts a system admin
    sqlx::query("UPDATE profiles SET custom_permissions = ? WHERE user_id = ?")
        .bind(json!({ "dashboard": ["read"] }).to_string())
        .bind(&user_id)
        .execute(&pool)
        .await?;

    let (status, _) = get(&app, "/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/permissions/vocabulary", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn login_round_trip_returns_token_and_user() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;
    let (_, user_id) = register(&app, "Ada", "ada@example.com").await?;

    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": "ada@example.com", "password": "password123" }).to_string(),
        ))?;

    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let body: Value = serde_json::from_slice(&body_bytes)?;
    let token = body.get("token").and_then(|v| v.as_str()).context("missing token")?;
    assert_eq!(body.pointer("/user/id").and_then(|v| v.as_str()), Some(user_id.as_str()));

    // the issued token authenticates
    let (status, me) = get(&app, "/auth/me", Some(token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me.get("email").and_then(|v| v.as_str()), Some("ada@example.com"));

    Ok(())
}

#[tokio::test]
async fn soft_deleted_account_loses_access() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (token, user_id) = register(&app, "Former Admin", "former@example.com").await?;
    set_role(&pool, &user_id, "admin").await?;

    let (status, _) = get(&app, "/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);

    sqlx::query("UPDATE users SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(&user_id)
        .execute(&pool)
        .await?;

    // the still-valid token must no longer resolve to a principal
    let (status, body) = get(&app, "/users", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.get("error").and_then(|v| v.as_str()), Some("not_found"));

    let (status, _) = get(&app, "/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn activity_log_is_system_admin_only() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (admin_token, admin_id) = register(&app, "Admin", "admin@example.com").await?;
    set_role(&pool, &admin_id, "admin").await?;
    let (root_token, root_id) = register(&app, "Root", "root@example.com").await?;
    set_role(&pool, &root_id, "system_admin").await?;

    // admin is not enough, even though admins hold users:manage
    let (status, _) = get(&app, "/activity", Some(&admin_token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get(&app, "/activity", Some(&root_token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_array());

    Ok(())
}

#[tokio::test]
async fn admin_cannot_deactivate_or_delete_a_system_admin() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (admin_token, admin_id) = register(&app, "Admin", "admin@example.com").await?;
    set_role(&pool, &admin_id, "admin").await?;
    let (_, root_id) = register(&app, "Root", "root@example.com").await?;
    set_role(&pool, &root_id, "system_admin").await?;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/users/{}/active", root_id),
        &admin_token,
        Some(json!({ "is_active": false })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &format!("/users/{}", root_id), &admin_token, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // the account is untouched
    let (status, body) = get(&app, &format!("/users/{}", root_id), Some(&admin_token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("is_active").and_then(|v| v.as_bool()), Some(true));

    // downward the same operations go through
    let (_, peer_id) = register(&app, "Peer", "peer@example.com").await?;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/users/{}/active", peer_id),
        &admin_token,
        Some(json!({ "is_active": false })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &format!("/users/{}", peer_id), &admin_token, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn admin_cannot_grant_a_role_above_their_own() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (admin_token, admin_id) = register(&app, "Admin", "admin2@example.com").await?;
    set_role(&pool, &admin_id, "admin").await?;
    let (_, target_id) = register(&app, "Target", "target@example.com").await?;

    let req = Request::builder()
        .method("PUT")
        .uri(format!("/users/{}/role", target_id))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", admin_token))
        .body(Body::from(json!({ "role": "system_admin" }).to_string()))?;

    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // granting a peer role is fine
    let req = Request::builder()
        .method("PUT")
        .uri(format!("/users/{}/role", target_id))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", admin_token))
        .body(Body::from(json!({ "role": "admin" }).to_string()))?;

    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}
