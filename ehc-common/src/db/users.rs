//! Member (users table) queries
//!
//! Lookups are case-insensitive on email. Callers are expected to pass
//! emails already trimmed and lowercased; comparisons lowercase the stored
//! side so legacy mixed-case rows still match.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::User;
use crate::{Result, Role};

/// Values written for one member by an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberWrite {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub tier: String,
    pub tags: Vec<String>,
    pub mindbody_client_id: Option<String>,
    pub lifetime_visits: i64,
    pub linked_emails: Vec<String>,
    pub role: Role,
    pub data_source: String,
}

/// Find a member by email (case-insensitive)
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER(?)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Insert a new member, returning the generated id
pub async fn insert_user(pool: &SqlitePool, member: &MemberWrite) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO users (
            id, email, first_name, last_name, phone, tier, tags,
            mindbody_client_id, lifetime_visits, linked_emails, role, data_source
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&member.email)
    .bind(&member.first_name)
    .bind(&member.last_name)
    .bind(&member.phone)
    .bind(&member.tier)
    .bind(serde_json::to_string(&member.tags)?)
    .bind(&member.mindbody_client_id)
    .bind(member.lifetime_visits)
    .bind(serde_json::to_string(&member.linked_emails)?)
    .bind(member.role.as_str())
    .bind(&member.data_source)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Update an existing member identified by email
///
/// Optional text fields keep their stored value when the write carries `None`.
/// Returns the number of rows touched.
pub async fn update_user(pool: &SqlitePool, member: &MemberWrite) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            phone = COALESCE(?, phone),
            tier = ?,
            tags = ?,
            mindbody_client_id = COALESCE(?, mindbody_client_id),
            lifetime_visits = ?,
            linked_emails = ?,
            role = ?,
            data_source = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE LOWER(email) = LOWER(?)
        "#,
    )
    .bind(&member.first_name)
    .bind(&member.last_name)
    .bind(&member.phone)
    .bind(&member.tier)
    .bind(serde_json::to_string(&member.tags)?)
    .bind(&member.mindbody_client_id)
    .bind(member.lifetime_visits)
    .bind(serde_json::to_string(&member.linked_emails)?)
    .bind(member.role.as_str())
    .bind(&member.data_source)
    .bind(&member.email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Member counts per tier for one data source, largest first
pub async fn tier_breakdown(pool: &SqlitePool, data_source: &str) -> Result<Vec<(String, i64)>> {
    let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
        r#"
        SELECT tier, COUNT(*) AS count
        FROM users
        WHERE data_source = ?
        GROUP BY tier
        ORDER BY count DESC, tier ASC
        "#,
    )
    .bind(data_source)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(tier, count)| (tier.unwrap_or_else(|| "(none)".to_string()), count))
        .collect())
}
