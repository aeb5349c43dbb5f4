//! Typed view of one member CSV row

use chrono::NaiveDate;

use crate::csv_parser::CsvRow;

/// Member export column names
pub mod columns {
    pub const EMAIL: &str = "real_email";
    pub const MINDBODY_ID: &str = "mindbody_id";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const PHONE: &str = "phone";
    pub const MEMBERSHIP_TIER: &str = "membership_tier";
    pub const JOINED_ON: &str = "joined_on";
    pub const TOTAL_BOOKINGS: &str = "total_bookings";
    pub const LAST_BOOKING_DATE: &str = "last_booking_date";
    pub const LINKED_EMAILS: &str = "trackman_emails_linked";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    /// Lowercased and trimmed; `None` when the column is blank
    pub email: Option<String>,
    pub mindbody_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Raw legacy plan label
    pub membership_tier: String,
    pub joined_on: Option<NaiveDate>,
    pub total_bookings: i64,
    pub last_booking_date: Option<String>,
    pub linked_emails: Vec<String>,
}

impl MemberRow {
    pub fn from_csv(row: &CsvRow) -> Self {
        Self {
            email: non_empty(&row.get(columns::EMAIL).to_lowercase()),
            mindbody_id: non_empty(row.get(columns::MINDBODY_ID)),
            first_name: non_empty(row.get(columns::FIRST_NAME)),
            last_name: non_empty(row.get(columns::LAST_NAME)),
            phone: non_empty(row.get(columns::PHONE)),
            membership_tier: row.get(columns::MEMBERSHIP_TIER).trim().to_string(),
            joined_on: parse_us_date(row.get(columns::JOINED_ON)),
            total_bookings: parse_leading_int(row.get(columns::TOTAL_BOOKINGS)),
            last_booking_date: non_empty(row.get(columns::LAST_BOOKING_DATE)),
            linked_emails: split_linked_emails(row.get(columns::LINKED_EMAILS)),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Integer prefix of `value` (after leading whitespace), or 0 when there is none
///
/// `"12 visits"` → 12, `"-3"` → -3, `"n/a"` → 0.
pub fn parse_leading_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (sign, digits) = match value.as_bytes().first() {
        Some(b'-') => (-1, &value[1..]),
        Some(b'+') => (1, &value[1..]),
        _ => (1, value),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(0)
}

/// `M/D/YYYY` → date; anything else (or an impossible date) → `None`
pub fn parse_us_date(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    let month = u32::try_from(parse_leading_int(parts[0])).ok()?;
    let day = u32::try_from(parse_leading_int(parts[1])).ok()?;
    let year = i32::try_from(parse_leading_int(parts[2])).ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Comma-separated alternate emails, trimmed, blanks removed
pub fn split_linked_emails(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::parse_csv;

    #[test]
    fn test_leading_int() {
        assert_eq!(parse_leading_int("42"), 42);
        assert_eq!(parse_leading_int("  7 visits"), 7);
        assert_eq!(parse_leading_int("-3"), -3);
        assert_eq!(parse_leading_int("3.9"), 3);
        assert_eq!(parse_leading_int(""), 0);
        assert_eq!(parse_leading_int("n/a"), 0);
        assert_eq!(parse_leading_int("-"), 0);
    }

    #[test]
    fn test_us_date() {
        assert_eq!(parse_us_date("3/7/2024"), NaiveDate::from_ymd_opt(2024, 3, 7));
        assert_eq!(parse_us_date("12/31/2023"), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(parse_us_date("2/30/2024"), None);
        assert_eq!(parse_us_date("2024-03-07"), None);
        assert_eq!(parse_us_date(""), None);
    }

    #[test]
    fn test_linked_emails() {
        assert_eq!(
            split_linked_emails(" a@x.com , ,b@y.com"),
            vec!["a@x.com", "b@y.com"]
        );
        assert!(split_linked_emails("").is_empty());
    }

    #[test]
    fn test_from_csv_row() {
        let csv = "real_email,mindbody_id,first_name,last_name,phone,membership_tier,joined_on,total_bookings,last_booking_date,trackman_emails_linked\n\
                   \"  Ada@Example.COM \",100,Ada,,,\"VIP Membership\",1/15/2024,12,,\"ada@golf.example, ada2@golf.example\"\n";
        let rows = parse_csv(csv);
        let member = MemberRow::from_csv(&rows[0]);

        assert_eq!(member.email.as_deref(), Some("ada@example.com"));
        assert_eq!(member.mindbody_id.as_deref(), Some("100"));
        assert_eq!(member.first_name.as_deref(), Some("Ada"));
        assert_eq!(member.last_name, None);
        assert_eq!(member.phone, None);
        assert_eq!(member.membership_tier, "VIP Membership");
        assert_eq!(member.joined_on, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(member.total_bookings, 12);
        assert_eq!(member.linked_emails, vec!["ada@golf.example", "ada2@golf.example"]);
    }

    #[test]
    fn test_blank_email_is_none() {
        let rows = parse_csv("real_email,first_name\n   ,Bob\n");
        assert_eq!(MemberRow::from_csv(&rows[0]).email, None);
    }
}
