//! Member reconciliation
//!
//! Rows are applied one at a time, in file order, against the `users`
//! table. Within one run the first occurrence of an email wins; later rows
//! for the same email are counted as duplicates and change nothing.
//!
//! Merge rules for an existing member:
//! - tags are the union of stored and incoming tags (stored order first)
//! - lifetime visits never decrease
//! - role never drops below the stored role
//! - tier and linked emails are replaced
//! - names, phone and external id are replaced only by non-empty values

use std::collections::HashSet;
use std::fmt;

use ehc_common::db::models::User;
use ehc_common::db::users::{find_user_by_email, insert_user, tier_breakdown, update_user, MemberWrite};
use ehc_common::roles::lookup_role;
use ehc_common::{parse_tier, Result, Role, TierMapping};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::csv_parser::CsvRow;
use crate::member_row::MemberRow;

/// `users.data_source` value for members written by this import
pub const DATA_SOURCE: &str = "mindbody_csv";

/// A row that failed to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub email: String,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.email, self.message)
    }
}

/// Counters for one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    /// Rows with no email
    pub skipped: usize,
    /// Repeat occurrences of an email already seen in this file
    pub duplicates: usize,
    pub errors: Vec<RowError>,
}

/// What happened to a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
    Skipped,
    Duplicate,
}

/// Compute the values to store for `row`
///
/// `existing` is the stored member with the same email, if any, and
/// `looked_up` the role currently granted by the admin and staff directories.
pub fn merge_member(
    email: &str,
    row: &MemberRow,
    mapping: &TierMapping,
    looked_up: Role,
    existing: Option<&User>,
) -> MemberWrite {
    let (tags, lifetime_visits, role) = match existing {
        Some(user) => {
            let mut tags = user.tags.clone();
            for tag in &mapping.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
            (
                tags,
                user.lifetime_visits.max(row.total_bookings),
                Role::merge(Some(user.role), looked_up),
            )
        }
        None => (mapping.tags.clone(), row.total_bookings, looked_up),
    };

    MemberWrite {
        email: email.to_string(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        phone: row.phone.clone(),
        tier: mapping.tier.as_str().to_string(),
        tags,
        mindbody_client_id: row.mindbody_id.clone(),
        lifetime_visits,
        linked_emails: row.linked_emails.clone(),
        role,
        data_source: DATA_SOURCE.to_string(),
    }
}

/// Applies member rows to the database and accumulates an [`ImportReport`]
pub struct MemberImporter {
    pool: SqlitePool,
    seen: HashSet<String>,
    report: ImportReport,
}

impl MemberImporter {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            seen: HashSet::new(),
            report: ImportReport::default(),
        }
    }

    /// Apply one row; a database failure is recorded and does not stop the run
    pub async fn apply(&mut self, row: &MemberRow) -> Option<RowOutcome> {
        self.report.total_rows += 1;

        let email = match &row.email {
            Some(email) => email.clone(),
            None => {
                self.report.skipped += 1;
                return Some(RowOutcome::Skipped);
            }
        };

        if !self.seen.insert(email.clone()) {
            debug!(email = %email, "Duplicate in CSV");
            self.report.duplicates += 1;
            return Some(RowOutcome::Duplicate);
        }

        match self.upsert(&email, row).await {
            Ok(outcome) => {
                match outcome {
                    RowOutcome::Created => self.report.created += 1,
                    RowOutcome::Updated => self.report.updated += 1,
                    RowOutcome::Skipped | RowOutcome::Duplicate => {}
                }
                Some(outcome)
            }
            Err(e) => {
                warn!(email = %email, error = %e, "Failed to import member");
                self.report.errors.push(RowError {
                    email,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    async fn upsert(&self, email: &str, row: &MemberRow) -> Result<RowOutcome> {
        let mapping = parse_tier(&row.membership_tier);
        let looked_up = lookup_role(&self.pool, email).await?;
        let existing = find_user_by_email(&self.pool, email).await?;

        let write = merge_member(email, row, &mapping, looked_up, existing.as_ref());

        if existing.is_some() {
            update_user(&self.pool, &write).await?;
            Ok(RowOutcome::Updated)
        } else {
            insert_user(&self.pool, &write).await?;
            Ok(RowOutcome::Created)
        }
    }

    pub fn finish(self) -> ImportReport {
        self.report
    }
}

/// Import parsed CSV rows and log the outcome
pub async fn import_members(pool: &SqlitePool, rows: &[CsvRow]) -> Result<ImportReport> {
    info!("Found {} members in CSV", rows.len());

    let mut importer = MemberImporter::new(pool.clone());
    for row in rows {
        importer.apply(&MemberRow::from_csv(row)).await;
    }
    let report = importer.finish();

    info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        duplicates = report.duplicates,
        errors = report.errors.len(),
        "Member import complete"
    );
    for error in &report.errors {
        warn!("  - {}", error);
    }

    log_tier_breakdown(pool).await?;

    Ok(report)
}

async fn log_tier_breakdown(pool: &SqlitePool) -> Result<()> {
    let breakdown = tier_breakdown(pool, DATA_SOURCE).await?;
    info!("Tier breakdown ({}):", DATA_SOURCE);
    for (tier, count) in breakdown {
        info!("  {}: {}", tier, count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehc_common::Tier;

    fn row(visits: i64) -> MemberRow {
        MemberRow {
            email: Some("a@x.com".to_string()),
            mindbody_id: None,
            first_name: Some("Ada".to_string()),
            last_name: None,
            phone: None,
            membership_tier: "Premium Membership Founding Members".to_string(),
            joined_on: None,
            total_bookings: visits,
            last_booking_date: None,
            linked_emails: vec![],
        }
    }

    fn stored(role: Role, tags: &[&str], visits: i64) -> User {
        User {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            first_name: None,
            last_name: Some("Lovelace".to_string()),
            phone: None,
            tier: Some("Core".to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            mindbody_client_id: None,
            lifetime_visits: visits,
            linked_emails: vec!["old@x.com".to_string()],
            role,
            data_source: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_new_member_takes_incoming_values() {
        let mapping = parse_tier("Premium Membership Founding Members");
        let write = merge_member("a@x.com", &row(4), &mapping, Role::Staff, None);

        assert_eq!(write.tier, "Premium");
        assert_eq!(write.tags, vec!["Founding Member"]);
        assert_eq!(write.lifetime_visits, 4);
        assert_eq!(write.role, Role::Staff);
        assert_eq!(write.data_source, DATA_SOURCE);
    }

    #[test]
    fn test_existing_member_merges() {
        let mapping = parse_tier("Premium Membership Founding Members");
        let existing = stored(Role::Admin, &["VIP Guest", "Founding Member"], 9);
        let write = merge_member("a@x.com", &row(4), &mapping, Role::Member, Some(&existing));

        assert_eq!(mapping.tier, Tier::Premium);
        assert_eq!(write.tier, "Premium");
        assert_eq!(write.tags, vec!["VIP Guest", "Founding Member"]);
        assert_eq!(write.lifetime_visits, 9);
        assert_eq!(write.role, Role::Admin);
        assert!(write.linked_emails.is_empty());
    }

    #[test]
    fn test_existing_member_gains_elevated_role_and_new_tags() {
        let mapping = parse_tier("Premium Membership Founding Members");
        let existing = stored(Role::Member, &["Pre-Sale"], 1);
        let write = merge_member("a@x.com", &row(6), &mapping, Role::Staff, Some(&existing));

        assert_eq!(write.tags, vec!["Pre-Sale", "Founding Member"]);
        assert_eq!(write.lifetime_visits, 6);
        assert_eq!(write.role, Role::Staff);
    }

    #[test]
    fn test_row_error_display() {
        let error = RowError {
            email: "a@x.com".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "a@x.com: boom");
    }
}
