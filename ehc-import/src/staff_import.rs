//! Staff directory import
//!
//! The staff export has no usable header, so columns are read by position:
//! 2 last name, 3 first name, 4 email, 5 phone, 8 job title.

use ehc_common::db::staff::{list_active_staff, upsert_staff_user, StaffUpsert, StaffWrite};
use ehc_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::csv_parser::{content_lines, split_line};

/// `staff_users.created_by` for rows this import inserts
pub const CREATED_BY: &str = "csv_import";

const LAST_NAME: usize = 2;
const FIRST_NAME: usize = 3;
const EMAIL: usize = 4;
const PHONE: usize = 5;
const JOB_TITLE: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaffImportReport {
    pub inserted: usize,
    pub updated: usize,
    /// Rows with no email
    pub skipped: usize,
    /// Rows whose email is on the exclusion list
    pub excluded: usize,
}

impl StaffImportReport {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated
    }
}

fn column(values: &[String], index: usize) -> &str {
    values.get(index).map(String::as_str).unwrap_or("")
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse the staff export, skipping the header line
///
/// Rows without an email come back as `None` so callers can count them.
pub fn parse_staff_csv(content: &str) -> Vec<Option<StaffWrite>> {
    content_lines(content)
        .into_iter()
        .skip(1)
        .map(|line| {
            let values = split_line(line);
            let email = column(&values, EMAIL).to_lowercase();
            if email.is_empty() {
                return None;
            }

            let phone: String = column(&values, PHONE)
                .chars()
                .filter(char::is_ascii_digit)
                .collect();

            Some(StaffWrite {
                email,
                first_name: column(&values, FIRST_NAME).to_string(),
                last_name: column(&values, LAST_NAME).to_string(),
                phone: optional(phone),
                job_title: optional(column(&values, JOB_TITLE).to_string()),
            })
        })
        .collect()
}

/// Upsert every staff row except those in `excluded` (compared case-insensitively)
pub async fn import_staff(
    pool: &SqlitePool,
    content: &str,
    excluded: &[String],
) -> Result<StaffImportReport> {
    let excluded: Vec<String> = excluded.iter().map(|e| e.trim().to_lowercase()).collect();
    let mut report = StaffImportReport::default();

    for staff in parse_staff_csv(content) {
        let Some(staff) = staff else {
            report.skipped += 1;
            continue;
        };

        if excluded.contains(&staff.email) {
            warn!(email = %staff.email, "Skipping excluded account");
            report.excluded += 1;
            continue;
        }

        let title = staff.job_title.as_deref().unwrap_or("No title");
        match upsert_staff_user(pool, &staff, CREATED_BY).await? {
            StaffUpsert::Inserted => {
                info!("Added: {} ({}) - {}", staff.display_name(), staff.email, title);
                report.inserted += 1;
            }
            StaffUpsert::Updated => {
                info!("Updated: {} ({}) - {}", staff.display_name(), staff.email, title);
                report.updated += 1;
            }
        }
    }

    info!(
        "Import complete: {} staff members processed, {} excluded, {} without email",
        report.processed(),
        report.excluded,
        report.skipped
    );

    let active = list_active_staff(pool).await?;
    info!("Active staff ({}):", active.len());
    for staff in active {
        info!(
            "  {} | {} | {} | {}",
            staff.name.as_deref().unwrap_or(""),
            staff.job_title.as_deref().unwrap_or("No title"),
            staff.phone.as_deref().unwrap_or("No phone"),
            staff.email
        );
    }

    Ok(report)
}
