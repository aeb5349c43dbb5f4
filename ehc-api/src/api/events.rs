//! Club events and member RSVPs

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use ehc_common::db::models::{Event, EventRsvp, RsvpListing};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::bookings::{normalize_date, normalize_time};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    /// Exact date; overrides the upcoming-only default
    pub date: Option<String>,
    pub include_past: Option<bool>,
}

/// Body for creating or updating an event
///
/// On update, absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct EventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RsvpQuery {
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub event_id: Option<i64>,
    pub user_email: Option<String>,
}

fn optional_time(value: &Option<String>) -> ApiResult<Option<String>> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => normalize_time(v).map(Some),
        _ => Ok(None),
    }
}

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let events = match query.date {
        Some(date) => {
            let date = normalize_date(&date)?;
            sqlx::query_as::<_, Event>(
                "SELECT * FROM events WHERE event_date = ? ORDER BY event_date, start_time",
            )
            .bind(date)
            .fetch_all(&state.db)
            .await?
        }
        None if query.include_past.unwrap_or(false) => {
            sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY event_date, start_time")
                .fetch_all(&state.db)
                .await?
        }
        None => {
            sqlx::query_as::<_, Event>(
                "SELECT * FROM events WHERE event_date >= date('now') ORDER BY event_date, start_time",
            )
            .fetch_all(&state.db)
            .await?
        }
    };

    Ok(Json(events))
}

/// POST /api/events (staff)
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let Json(request) = payload?;

    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;
    let event_date = request
        .event_date
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("event_date is required".to_string()))
        .and_then(normalize_date)?;

    let event = sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (title, description, event_date, start_time, end_time, location, category, image_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(&request.description)
    .bind(&event_date)
    .bind(optional_time(&request.start_time)?)
    .bind(optional_time(&request.end_time)?)
    .bind(&request.location)
    .bind(&request.category)
    .bind(&request.image_url)
    .fetch_one(&state.db)
    .await?;

    info!(event_id = event.id, title = %event.title, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /api/events/:id (staff)
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> ApiResult<Json<Event>> {
    let Json(request) = payload?;

    if matches!(request.title.as_deref().map(str::trim), Some("")) {
        return Err(ApiError::BadRequest("title cannot be empty".to_string()));
    }
    let event_date = request.event_date.as_deref().map(normalize_date).transpose()?;

    let event = sqlx::query_as::<_, Event>(
        r#"
        UPDATE events SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            event_date = COALESCE(?, event_date),
            start_time = COALESCE(?, start_time),
            end_time = COALESCE(?, end_time),
            location = COALESCE(?, location),
            category = COALESCE(?, category),
            image_url = COALESCE(?, image_url)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(request.title.as_deref().map(str::trim))
    .bind(&request.description)
    .bind(event_date)
    .bind(optional_time(&request.start_time)?)
    .bind(optional_time(&request.end_time)?)
    .bind(&request.location)
    .bind(&request.category)
    .bind(&request.image_url)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", id)))?;

    Ok(Json(event))
}

/// DELETE /api/events/:id (staff); RSVPs go with it
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Event {} not found", id)));
    }

    info!(event_id = id, "Event deleted");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/rsvps
///
/// Confirmed RSVPs for events today or later.
pub async fn list_rsvps(
    State(state): State<AppState>,
    Query(query): Query<RsvpQuery>,
) -> ApiResult<Json<Vec<RsvpListing>>> {
    let rsvps = sqlx::query_as::<_, RsvpListing>(
        r#"
        SELECT r.id, r.event_id, r.user_email, r.status, r.created_at,
               e.title, e.event_date, e.start_time, e.location, e.category, e.image_url
        FROM event_rsvps r
        JOIN events e ON e.id = r.event_id
        WHERE r.status = 'confirmed'
          AND e.event_date >= date('now')
          AND (? IS NULL OR LOWER(r.user_email) = LOWER(?))
        ORDER BY e.event_date, e.start_time
        "#,
    )
    .bind(&query.user_email)
    .bind(&query.user_email)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rsvps))
}

/// POST /api/rsvps
///
/// Re-RSVPing after a cancellation confirms the existing row.
pub async fn create_rsvp(
    State(state): State<AppState>,
    payload: Result<Json<RsvpRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EventRsvp>)> {
    let Json(request) = payload?;

    let event_id = request
        .event_id
        .ok_or_else(|| ApiError::BadRequest("event_id is required".to_string()))?;
    let user_email = request
        .user_email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("user_email is required".to_string()))?;

    let event_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = ?)")
        .bind(event_id)
        .fetch_one(&state.db)
        .await?;
    if !event_exists {
        return Err(ApiError::NotFound(format!("Event {} not found", event_id)));
    }

    let rsvp = sqlx::query_as::<_, EventRsvp>(
        r#"
        INSERT INTO event_rsvps (event_id, user_email, status)
        VALUES (?, ?, 'confirmed')
        ON CONFLICT(event_id, user_email) DO UPDATE SET status = 'confirmed'
        RETURNING *
        "#,
    )
    .bind(event_id)
    .bind(&user_email)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(rsvp)))
}

/// DELETE /api/rsvps/:event_id/:user_email
pub async fn cancel_rsvp(
    State(state): State<AppState>,
    Path((event_id, user_email)): Path<(i64, String)>,
) -> ApiResult<Json<Value>> {
    sqlx::query(
        "UPDATE event_rsvps SET status = 'cancelled' WHERE event_id = ? AND LOWER(user_email) = LOWER(?)",
    )
    .bind(event_id)
    .bind(user_email.trim())
    .execute(&state.db)
    .await?;

    Ok(Json(json!({ "success": true })))
}

/// Routes open to any caller
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/rsvps", get(list_rsvps).post(create_rsvp))
        .route("/api/rsvps/:event_id/:user_email", delete(cancel_rsvp))
}

/// Routes requiring staff or admin
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", post(create_event))
        .route("/api/events/:id", put(update_event).delete(delete_event))
}
