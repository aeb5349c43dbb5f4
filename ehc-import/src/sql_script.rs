//! Production update script generator
//!
//! Renders member rows as a single-transaction SQL script that updates
//! existing `users` rows by case-insensitive email. The script only updates;
//! members missing from the target database are left for the reconciling
//! import to create.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use ehc_common::{parse_tier, Result};

use crate::member_row::MemberRow;

/// Quote `value` as a SQL string literal
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Rows with an email, first occurrence of each email only
fn unique_members(rows: &[MemberRow]) -> Vec<(&str, &MemberRow)> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| row.email.as_deref().map(|email| (email, row)))
        .filter(|(email, _)| seen.insert(*email))
        .collect()
}

/// `  column = value,` line of an UPDATE ... SET list
fn assignment(column: &str, value: &str) -> String {
    format!("  {} = {},\n", column, value)
}

/// Render the update script for `rows`
///
/// `lifetime_visits` only ever grows: the stored count is kept when it is
/// higher than the export's.
pub fn generate_update_script(rows: &[MemberRow], generated_at: DateTime<Utc>) -> Result<String> {
    let members = unique_members(rows);

    let mut sql = String::new();
    sql.push_str("-- Production member update script\n");
    sql.push_str(&format!("-- Generated: {}\n", generated_at.to_rfc3339()));
    sql.push_str(&format!("-- Total members: {}\n", members.len()));
    sql.push('\n');
    sql.push_str("BEGIN;\n\n");

    for (email, row) in members {
        let tier = parse_tier(&row.membership_tier).tier;
        let linked_emails = serde_json::to_string(&row.linked_emails)?;

        sql.push_str("UPDATE users SET\n");
        sql.push_str(&assignment("first_name", &sql_literal(row.first_name.as_deref().unwrap_or(""))));
        sql.push_str(&assignment("last_name", &sql_literal(row.last_name.as_deref().unwrap_or(""))));
        sql.push_str(&assignment("tier", &sql_literal(tier.as_str())));
        sql.push_str(&assignment("phone", &sql_literal(row.phone.as_deref().unwrap_or(""))));
        sql.push_str(&assignment(
            "mindbody_client_id",
            &sql_literal(row.mindbody_id.as_deref().unwrap_or("")),
        ));
        sql.push_str(&assignment(
            "lifetime_visits",
            &format!("MAX(lifetime_visits, {})", row.total_bookings),
        ));
        sql.push_str(&assignment("linked_emails", &sql_literal(&linked_emails)));
        if let Some(joined) = row.joined_on {
            sql.push_str(&assignment(
                "created_at",
                &sql_literal(&joined.format("%Y-%m-%d 00:00:00").to_string()),
            ));
        }
        sql.push_str("  updated_at = CURRENT_TIMESTAMP\n");
        sql.push_str(&format!("WHERE LOWER(email) = {};\n", sql_literal(email)));
        sql.push('\n');
    }

    sql.push_str("COMMIT;\n");
    Ok(sql)
}
