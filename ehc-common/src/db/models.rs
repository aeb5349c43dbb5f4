//! Database models

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

use crate::Role;

/// Parse a JSON string-array column
///
/// Legacy rows may hold malformed JSON; those read as an empty list.
pub fn parse_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub tier: Option<String>,
    pub tags: Vec<String>,
    pub mindbody_client_id: Option<String>,
    pub lifetime_visits: i64,
    pub linked_emails: Vec<String>,
    pub role: Role,
    pub data_source: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let tags: String = row.try_get("tags")?;
        let linked_emails: String = row.try_get("linked_emails")?;
        let role: String = row.try_get("role")?;
        let email: Option<String> = row.try_get("email")?;

        Ok(Self {
            id: row.try_get("id")?,
            email: email.unwrap_or_default(),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            phone: row.try_get("phone")?,
            tier: row.try_get("tier")?,
            tags: parse_json_list(&tags),
            mindbody_client_id: row.try_get("mindbody_client_id")?,
            lifetime_visits: row.try_get("lifetime_visits")?,
            linked_emails: parse_json_list(&linked_emails),
            role: role.parse().unwrap_or(Role::Member),
            data_source: row.try_get("data_source")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StaffUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resource {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Booking lifecycle state as stored in `bookings.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingApproval,
    Confirmed,
    Declined,
    Cancelled,
    CheckedIn,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingApproval => "pending_approval",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::CheckedIn => "checked_in",
        }
    }

    /// Whether a booking in this state may move to `next`
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (PendingApproval, Confirmed)
                | (PendingApproval, Declined)
                | (PendingApproval, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, CheckedIn)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" => Ok(BookingStatus::PendingApproval),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "declined" => Ok(BookingStatus::Declined),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "checked_in" => Ok(BookingStatus::CheckedIn),
            other => Err(crate::Error::InvalidInput(format!(
                "Invalid booking status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub resource_id: i64,
    pub user_email: String,
    pub booking_date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Booking joined with its resource for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingListing {
    pub id: i64,
    pub resource_id: i64,
    pub user_email: String,
    pub booking_date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub resource_name: String,
    pub resource_type: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventRsvp {
    pub id: i64,
    pub event_id: i64,
    pub user_email: String,
    pub status: String,
    pub created_at: String,
}

/// RSVP joined with the event it is for
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RsvpListing {
    pub id: i64,
    pub event_id: i64,
    pub user_email: String,
    pub status: String,
    pub created_at: String,
    pub title: String,
    pub event_date: String,
    pub start_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GalleryImage {
    pub id: i64,
    pub title: Option<String>,
    pub image_url: String,
    pub category: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSection {
    pub id: i64,
    pub guide_id: Option<String>,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub steps: serde_json::Value,
    pub is_admin_only: bool,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for TrainingSection {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let steps: String = row.try_get("steps")?;
        let steps = serde_json::from_str(&steps).map_err(|e| sqlx::Error::ColumnDecode {
            index: "steps".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            guide_id: row.try_get("guide_id")?,
            icon: row.try_get("icon")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            steps,
            is_admin_only: row.try_get("is_admin_only")?,
            sort_order: row.try_get("sort_order")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
