//! Staff training guides
//!
//! Sections shipped with the service carry a stable `guideId` and are
//! upserted by it; sections created by admins have no guide id and are
//! never touched by seeding.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use ehc_common::db::models::TrainingSection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::auth::CurrentUser;
use crate::{ApiError, ApiResult, AppState};

/// Icon used when a section is created without one
pub const DEFAULT_ICON: &str = "help_outline";

const SEED_DATA: &str = include_str!("training_seed.json");

/// One shipped training section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSection {
    pub guide_id: String,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub sort_order: i64,
    pub is_admin_only: bool,
    pub steps: Value,
}

impl SeedSection {
    fn differs_from(&self, section: &TrainingSection) -> bool {
        section.icon != self.icon
            || section.title != self.title
            || section.description != self.description
            || section.sort_order != self.sort_order
            || section.is_admin_only != self.is_admin_only
            || section.steps != self.steps
    }
}

/// Counts from one seeding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Legacy sections matched by title and given their guide id
    pub migrated: usize,
}

pub fn seed_sections() -> ehc_common::Result<Vec<SeedSection>> {
    Ok(serde_json::from_str(SEED_DATA)?)
}

/// Upsert the shipped sections
///
/// Matches by guide id, falling back to title for sections saved before
/// guide ids existed. Unchanged sections are not rewritten.
pub async fn seed_training_sections(pool: &SqlitePool) -> ehc_common::Result<SeedSummary> {
    let existing = sqlx::query_as::<_, TrainingSection>("SELECT * FROM training_sections")
        .fetch_all(pool)
        .await?;

    let mut summary = SeedSummary::default();

    for seed in seed_sections()? {
        let matched = existing
            .iter()
            .find(|s| s.guide_id.as_deref() == Some(seed.guide_id.as_str()))
            .or_else(|| {
                existing
                    .iter()
                    .find(|s| s.guide_id.is_none() && s.title == seed.title)
            });

        let steps = serde_json::to_string(&seed.steps)?;

        match matched {
            Some(section) => {
                let needs_guide_id = section.guide_id.is_none();
                if !needs_guide_id && !seed.differs_from(section) {
                    continue;
                }

                sqlx::query(
                    r#"
                    UPDATE training_sections SET
                        guide_id = ?, icon = ?, title = ?, description = ?, steps = ?,
                        sort_order = ?, is_admin_only = ?, updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                )
                .bind(&seed.guide_id)
                .bind(&seed.icon)
                .bind(&seed.title)
                .bind(&seed.description)
                .bind(&steps)
                .bind(seed.sort_order)
                .bind(seed.is_admin_only)
                .bind(section.id)
                .execute(pool)
                .await?;

                if needs_guide_id {
                    summary.migrated += 1;
                } else {
                    summary.updated += 1;
                }
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO training_sections
                        (guide_id, icon, title, description, steps, sort_order, is_admin_only)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&seed.guide_id)
                .bind(&seed.icon)
                .bind(&seed.title)
                .bind(&seed.description)
                .bind(&steps)
                .bind(seed.sort_order)
                .bind(seed.is_admin_only)
                .execute(pool)
                .await?;
                summary.inserted += 1;
            }
        }
    }

    info!(
        "Training seed complete: {} updated, {} inserted, {} migrated",
        summary.updated, summary.inserted, summary.migrated
    );
    Ok(summary)
}

async fn fetch_sections(pool: &SqlitePool, include_admin_only: bool) -> ApiResult<Vec<TrainingSection>> {
    let sections = sqlx::query_as::<_, TrainingSection>(
        r#"
        SELECT * FROM training_sections
        WHERE ? OR is_admin_only = 0
        ORDER BY sort_order, id
        "#,
    )
    .bind(include_admin_only)
    .fetch_all(pool)
    .await?;

    Ok(sections)
}

/// Body for admin create/update; on update absent fields are unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSectionRequest {
    pub icon: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub steps: Option<Value>,
    pub is_admin_only: Option<bool>,
    pub sort_order: Option<i64>,
}

fn steps_json(steps: Option<&Value>) -> ApiResult<Option<String>> {
    match steps {
        None => Ok(None),
        Some(steps) if steps.is_array() => Ok(Some(steps.to_string())),
        Some(_) => Err(ApiError::BadRequest("steps must be an array".to_string())),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/training-sections (staff)
///
/// Admins see every section; staff see sections not marked admin-only.
/// An empty table is seeded on first read.
pub async fn list_sections(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<TrainingSection>>> {
    let include_admin_only = user.is_admin();
    let mut sections = fetch_sections(&state.db, include_admin_only).await?;

    if sections.is_empty() {
        info!("No training sections found, auto-seeding");
        match seed_training_sections(&state.db).await {
            Ok(_) => sections = fetch_sections(&state.db, include_admin_only).await?,
            Err(e) => warn!("Training auto-seed failed: {}", e),
        }
    }

    Ok(Json(sections))
}

/// POST /api/admin/training-sections (admin)
pub async fn create_section(
    State(state): State<AppState>,
    payload: Result<Json<TrainingSectionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TrainingSection>)> {
    let Json(request) = payload?;

    let (Some(title), Some(description)) = (
        non_blank(request.title.as_deref()),
        non_blank(request.description.as_deref()),
    ) else {
        return Err(ApiError::BadRequest(
            "Title and description are required".to_string(),
        ));
    };
    let steps = steps_json(request.steps.as_ref())?.unwrap_or_else(|| "[]".to_string());

    let section = sqlx::query_as::<_, TrainingSection>(
        r#"
        INSERT INTO training_sections (icon, title, description, steps, is_admin_only, sort_order)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(non_blank(request.icon.as_deref()).unwrap_or(DEFAULT_ICON))
    .bind(title)
    .bind(description)
    .bind(steps)
    .bind(request.is_admin_only.unwrap_or(false))
    .bind(request.sort_order.unwrap_or(0))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(section)))
}

/// PUT /api/admin/training-sections/:id (admin)
pub async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<TrainingSectionRequest>, JsonRejection>,
) -> ApiResult<Json<TrainingSection>> {
    let Json(request) = payload?;
    let steps = steps_json(request.steps.as_ref())?;

    let blank = |value: &Option<String>| matches!(value.as_deref().map(str::trim), Some(""));
    if blank(&request.title) || blank(&request.description) {
        return Err(ApiError::BadRequest(
            "Title and description cannot be empty".to_string(),
        ));
    }

    let section = sqlx::query_as::<_, TrainingSection>(
        r#"
        UPDATE training_sections SET
            icon = COALESCE(?, icon),
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            steps = COALESCE(?, steps),
            is_admin_only = COALESCE(?, is_admin_only),
            sort_order = COALESCE(?, sort_order),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&request.icon)
    .bind(&request.title)
    .bind(&request.description)
    .bind(steps)
    .bind(request.is_admin_only)
    .bind(request.sort_order)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Training section not found".to_string()))?;

    Ok(Json(section))
}

/// DELETE /api/admin/training-sections/:id (admin)
pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let deleted = sqlx::query_as::<_, TrainingSection>(
        "DELETE FROM training_sections WHERE id = ? RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Training section not found".to_string()))?;

    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

/// POST /api/admin/training-sections/seed (admin)
pub async fn seed_sections_handler(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Value>)> {
    seed_training_sections(&state.db).await?;
    let sections = fetch_sections(&state.db, true).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("Seeded {} training sections", sections.len()),
            "sections": sections,
        })),
    ))
}

/// Routes requiring staff or admin
pub fn staff_routes() -> Router<AppState> {
    Router::new().route("/api/training-sections", get(list_sections))
}

/// Routes requiring admin
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/training-sections", post(create_section))
        .route("/api/admin/training-sections/seed", post(seed_sections_handler))
        .route(
            "/api/admin/training-sections/:id",
            put(update_section).delete(delete_section),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_data_parses_with_unique_guide_ids() {
        let sections = seed_sections().unwrap();
        assert!(!sections.is_empty());

        let ids: HashSet<&str> = sections.iter().map(|s| s.guide_id.as_str()).collect();
        assert_eq!(ids.len(), sections.len());
        assert!(sections.iter().all(|s| s.steps.is_array()));
        assert!(sections.iter().any(|s| s.is_admin_only));
    }

    #[test]
    fn test_steps_must_be_array() {
        assert_eq!(steps_json(None).unwrap(), None);
        let stored = steps_json(Some(&json!([{"title": "a", "content": "b"}])))
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&stored).unwrap(),
            json!([{"title": "a", "content": "b"}])
        );
        assert!(steps_json(Some(&json!({"title": "a"}))).is_err());
    }
}
