//! Staff and admin directory queries

use sqlx::SqlitePool;

use crate::db::models::StaffUser;
use crate::Result;

/// Fields written for one staff member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffWrite {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub job_title: Option<String>,
}

impl StaffWrite {
    /// "First Last", trimmed
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Whether a staff write created a row or refreshed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffUpsert {
    Inserted,
    Updated,
}

/// Insert or refresh a staff member; existing rows are re-activated
pub async fn upsert_staff_user(
    pool: &SqlitePool,
    staff: &StaffWrite,
    created_by: &str,
) -> Result<StaffUpsert> {
    let name = staff.display_name();

    let updated = sqlx::query(
        r#"
        UPDATE staff_users SET
            name = ?, first_name = ?, last_name = ?,
            phone = ?, job_title = ?, is_active = 1
        WHERE LOWER(email) = LOWER(?)
        "#,
    )
    .bind(&name)
    .bind(&staff.first_name)
    .bind(&staff.last_name)
    .bind(&staff.phone)
    .bind(&staff.job_title)
    .bind(&staff.email)
    .execute(pool)
    .await?;

    if updated.rows_affected() > 0 {
        return Ok(StaffUpsert::Updated);
    }

    sqlx::query(
        r#"
        INSERT INTO staff_users (email, name, first_name, last_name, phone, job_title, is_active, created_by)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(&staff.email)
    .bind(&name)
    .bind(&staff.first_name)
    .bind(&staff.last_name)
    .bind(&staff.phone)
    .bind(&staff.job_title)
    .bind(created_by)
    .execute(pool)
    .await?;

    Ok(StaffUpsert::Inserted)
}

/// Active staff ordered by name
pub async fn list_active_staff(pool: &SqlitePool) -> Result<Vec<StaffUser>> {
    let staff = sqlx::query_as::<_, StaffUser>(
        "SELECT * FROM staff_users WHERE is_active = 1 ORDER BY name, email",
    )
    .fetch_all(pool)
    .await?;

    Ok(staff)
}

/// Register an active admin (idempotent)
pub async fn add_admin_user(
    pool: &SqlitePool,
    email: &str,
    name: Option<&str>,
    created_by: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO admin_users (email, name, is_active, created_by)
        VALUES (LOWER(?), ?, 1, ?)
        ON CONFLICT(email) DO UPDATE SET is_active = 1
        "#,
    )
    .bind(email.trim())
    .bind(name)
    .bind(created_by)
    .execute(pool)
    .await?;

    Ok(())
}
