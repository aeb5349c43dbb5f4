//! Simulator and room bookings
//!
//! Members request a slot (`pending_approval`); staff approve or decline it.
//! A confirmed booking can be checked in or cancelled. Pending and confirmed
//! bookings hold their slot, so a new request overlapping one of them on the
//! same resource and date is rejected.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use ehc_common::db::models::{Booking, BookingListing, BookingStatus};
use ehc_common::db::users::find_user_by_email;
use ehc_common::tiers::is_authorized_for_member_booking;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

/// Query parameters for GET /api/bookings
#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    pub user_email: Option<String>,
    pub date: Option<String>,
    pub resource_id: Option<i64>,
    /// Defaults to `confirmed`
    pub status: Option<String>,
}

/// Body for POST /api/bookings
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub resource_id: Option<i64>,
    pub user_email: Option<String>,
    pub booking_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingCreated {
    #[serde(flatten)]
    pub booking: Booking,
    pub message: String,
}

/// Pending request with the member's name for the staff queue
#[derive(Debug, Serialize, FromRow)]
pub struct PendingBooking {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: BookingListing,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

/// `YYYY-MM-DD`, returned in canonical form
pub fn normalize_date(value: &str) -> ApiResult<String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| ApiError::BadRequest(format!("Invalid date: {}", value)))
}

/// `HH:MM` or `HH:MM:SS`, returned as `HH:MM:SS` so stored times compare as text
pub fn normalize_time(value: &str) -> ApiResult<String> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map(|t| t.format("%H:%M:%S").to_string())
        .map_err(|_| ApiError::BadRequest(format!("Invalid time: {}", value)))
}

async fn fetch_booking(state: &AppState, id: i64) -> ApiResult<Booking> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking {} not found", id)))
}

/// Move booking `id` to `next`, enforcing the allowed transitions
async fn transition(state: &AppState, id: i64, next: BookingStatus) -> ApiResult<Booking> {
    let booking = fetch_booking(state, id).await?;
    let current: BookingStatus = booking.status.parse()?;

    if !current.can_transition_to(next) {
        return Err(ApiError::Conflict(format!(
            "Booking {} is {} and cannot become {}",
            id, current, next
        )));
    }

    // Status guard: a concurrent change since the read makes this a no-op
    let updated = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = ? WHERE id = ? AND status = ? RETURNING *",
    )
    .bind(next.as_str())
    .bind(id)
    .bind(current.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::Conflict(format!("Booking {} changed concurrently", id)))?;

    info!(booking_id = id, from = %current, to = %next, "Booking status changed");
    Ok(updated)
}

/// GET /api/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> ApiResult<Json<Vec<BookingListing>>> {
    let status: BookingStatus = query.status.as_deref().unwrap_or("confirmed").parse()?;

    let bookings = sqlx::query_as::<_, BookingListing>(
        r#"
        SELECT b.*, r.name AS resource_name, r.type AS resource_type
        FROM bookings b
        JOIN resources r ON r.id = b.resource_id
        WHERE b.status = ?
          AND (? IS NULL OR LOWER(b.user_email) = LOWER(?))
          AND (? IS NULL OR b.booking_date = ?)
          AND (? IS NULL OR b.resource_id = ?)
        ORDER BY b.booking_date, b.start_time
        "#,
    )
    .bind(status.as_str())
    .bind(&query.user_email)
    .bind(&query.user_email)
    .bind(&query.date)
    .bind(&query.date)
    .bind(query.resource_id)
    .bind(query.resource_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(bookings))
}

/// GET /api/pending-bookings (staff)
pub async fn list_pending_bookings(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PendingBooking>>> {
    let bookings = sqlx::query_as::<_, PendingBooking>(
        r#"
        SELECT b.*, r.name AS resource_name, r.type AS resource_type,
               u.first_name, u.last_name
        FROM bookings b
        JOIN resources r ON r.id = b.resource_id
        LEFT JOIN users u ON LOWER(u.email) = LOWER(b.user_email)
        WHERE b.status = 'pending_approval'
        ORDER BY b.created_at DESC, b.id DESC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(bookings))
}

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BookingCreated>)> {
    let Json(request) = payload?;

    let resource_id = request
        .resource_id
        .ok_or_else(|| ApiError::BadRequest("resource_id is required".to_string()))?;
    let user_email = required(request.user_email, "user_email")?.to_lowercase();
    let booking_date = normalize_date(&required(request.booking_date, "booking_date")?)?;
    let start_time = normalize_time(&required(request.start_time, "start_time")?)?;
    let end_time = normalize_time(&required(request.end_time, "end_time")?)?;

    if end_time <= start_time {
        return Err(ApiError::BadRequest(
            "end_time must be after start_time".to_string(),
        ));
    }

    let resource_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM resources WHERE id = ?)")
            .bind(resource_id)
            .fetch_one(&state.db)
            .await?;
    if !resource_exists {
        return Err(ApiError::NotFound(format!("Resource {} not found", resource_id)));
    }

    let member = find_user_by_email(&state.db, &user_email).await?;
    let (tier, tags) = match &member {
        Some(user) => (user.tier.as_deref(), user.tags.as_slice()),
        None => (None, &[][..]),
    };
    if !is_authorized_for_member_booking(tier, tags) {
        return Err(ApiError::UpgradeRequired(
            "Simulator booking is available for Core, Premium, VIP, and Corporate members"
                .to_string(),
        ));
    }

    // Overlap check and insert are one statement so concurrent requests for
    // the same slot serialize on the write lock
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (resource_id, user_email, booking_date, start_time, end_time, notes, status)
        SELECT ?, ?, ?, ?, ?, ?, 'pending_approval'
        WHERE NOT EXISTS (
            SELECT 1 FROM bookings
            WHERE resource_id = ?
              AND booking_date = ?
              AND status IN ('pending_approval', 'confirmed')
              AND start_time < ?
              AND end_time > ?
        )
        RETURNING *
        "#,
    )
    .bind(resource_id)
    .bind(&user_email)
    .bind(&booking_date)
    .bind(&start_time)
    .bind(&end_time)
    .bind(request.notes.filter(|n| !n.trim().is_empty()))
    .bind(resource_id)
    .bind(&booking_date)
    .bind(&end_time)
    .bind(&start_time)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        ApiError::Conflict("This time slot is already requested or booked".to_string())
    })?;

    info!(booking_id = booking.id, user_email = %user_email, "Booking requested");

    Ok((
        StatusCode::CREATED,
        Json(BookingCreated {
            booking,
            message: "Request sent! Concierge will confirm shortly.".to_string(),
        }),
    ))
}

/// PUT /api/bookings/:id/approve (staff)
pub async fn approve_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(transition(&state, id, BookingStatus::Confirmed).await?))
}

/// PUT /api/bookings/:id/decline (staff)
pub async fn decline_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(transition(&state, id, BookingStatus::Declined).await?))
}

/// POST /api/bookings/:id/checkin (staff)
pub async fn check_in_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let booking = transition(&state, id, BookingStatus::CheckedIn).await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

/// DELETE /api/bookings/:id
///
/// Cancelling an already-cancelled booking succeeds without change.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let booking = fetch_booking(&state, id).await?;
    if booking.status == BookingStatus::Cancelled.as_str() {
        return Ok(Json(json!({ "success": true })));
    }

    transition(&state, id, BookingStatus::Cancelled).await?;
    Ok(Json(json!({ "success": true })))
}

/// Routes open to any caller
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/:id", delete(cancel_booking))
}

/// Routes requiring staff or admin
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/api/pending-bookings", get(list_pending_bookings))
        .route("/api/bookings/:id/approve", put(approve_booking))
        .route("/api/bookings/:id/decline", put(decline_booking))
        .route("/api/bookings/:id/checkin", post(check_in_booking))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("9:30").unwrap(), "09:30:00");
        assert_eq!(normalize_time("14:00:00").unwrap(), "14:00:00");
        assert!(normalize_time("25:00").is_err());
        assert!(normalize_time("noon").is_err());
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2030-01-05").unwrap(), "2030-01-05");
        assert!(normalize_date("1/5/2030").is_err());
        assert!(normalize_date("2030-02-30").is_err());
    }
}
