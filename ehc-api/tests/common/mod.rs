//! Shared helpers for ehc-api integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ehc_api::{build_router, AppState};
use ehc_common::db::init_schema;
use ehc_common::db::staff::{add_admin_user, upsert_staff_user, StaffWrite};
use ehc_common::db::users::{insert_user, MemberWrite};
use ehc_common::Role;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

pub const ADMIN: &str = "admin@club.example";
pub const STAFF: &str = "staff@club.example";
pub const VIP_MEMBER: &str = "vip@example.com";
pub const SOCIAL_MEMBER: &str = "social@example.com";
pub const FOUNDING_SOCIAL: &str = "founder@example.com";

/// In-memory database with the shared fixtures
pub async fn setup_db() -> SqlitePool {
    // Single connection: every connection to :memory: is a separate database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    seed_db(&pool).await;
    pool
}

/// Two resources, an admin, a staff member and three members
pub async fn seed_db(pool: &SqlitePool) {
    sqlx::query("INSERT INTO resources (id, name, type) VALUES (1, 'Bay 1', 'simulator'), (2, 'Conference Room', 'conference_room')")
        .execute(pool)
        .await
        .unwrap();

    add_admin_user(pool, ADMIN, Some("Admin"), "test").await.unwrap();
    upsert_staff_user(
        pool,
        &StaffWrite {
            email: STAFF.to_string(),
            first_name: "Sam".to_string(),
            last_name: "Snead".to_string(),
            phone: None,
            job_title: Some("Golf Pro".to_string()),
        },
        "test",
    )
    .await
    .unwrap();

    insert_member(pool, VIP_MEMBER, "VIP", &[]).await;
    insert_member(pool, SOCIAL_MEMBER, "Social", &[]).await;
    insert_member(pool, FOUNDING_SOCIAL, "Social", &["Founding Member"]).await;
}

pub async fn insert_member(pool: &SqlitePool, email: &str, tier: &str, tags: &[&str]) {
    insert_user(
        pool,
        &MemberWrite {
            email: email.to_string(),
            first_name: Some("Test".to_string()),
            last_name: Some("Member".to_string()),
            phone: None,
            tier: tier.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            mindbody_client_id: None,
            lifetime_visits: 0,
            linked_emails: vec![],
            role: Role::Member,
            data_source: "test".to_string(),
        },
    )
    .await
    .unwrap();
}

pub async fn setup_app() -> (Router, SqlitePool) {
    let pool = setup_db().await;
    (build_router(AppState::new(pool.clone())), pool)
}

/// Send one request; `user` goes in the identity header, `body` as JSON
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-email", user);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };

    (status, json)
}
