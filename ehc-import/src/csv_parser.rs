//! Minimal CSV reader for legacy exports
//!
//! Lines are split on `\n`; a double quote toggles "inside quotes" so commas
//! inside a quoted field do not split it. Quote characters themselves are
//! dropped, which means an escaped quote (`""`) yields nothing and a quoted
//! field cannot span lines.

use std::collections::HashMap;

/// One data line keyed by header name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    fields: HashMap<String, String>,
}

impl CsvRow {
    /// Pair headers with values; headers past the end of `values` map to `""`
    pub fn new(headers: &[String], mut values: Vec<String>) -> Self {
        values.resize(headers.len().max(values.len()), String::new());

        let fields = headers
            .iter()
            .zip(values)
            .map(|(header, value)| (header.clone(), value))
            .collect();

        Self { fields }
    }

    /// Value for `header`, or `""` when the column does not exist
    pub fn get(&self, header: &str) -> &str {
        self.fields.get(header).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Split one line into trimmed values using the quote-toggle rule
pub fn split_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                values.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    values.push(current.trim().to_string());

    values
}

/// Non-blank lines of `content`, with a leading BOM and `\r` line endings removed
pub fn content_lines(content: &str) -> Vec<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    content
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Parse `content` into rows keyed by the first line's headers
///
/// Fewer than two non-blank lines yields no rows.
pub fn parse_csv(content: &str) -> Vec<CsvRow> {
    let lines = content_lines(content);
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = lines[0].split(',').map(|h| h.trim().to_string()).collect();

    lines[1..]
        .iter()
        .map(|line| CsvRow::new(&headers, split_line(line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_commas_stay_in_field() {
        let values = split_line(r#"a@x.com,"Smith, Jr.",  5 "#);
        assert_eq!(values, vec!["a@x.com", "Smith, Jr.", "5"]);
    }

    #[test]
    fn test_escaped_quotes_are_dropped() {
        assert_eq!(split_line(r#""say ""hi""",x"#), vec!["say hi", "x"]);
    }

    #[test]
    fn test_missing_trailing_values_are_empty() {
        let rows = parse_csv("email,tier,visits\na@x.com\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("email"), "a@x.com");
        assert_eq!(rows[0].get("tier"), "");
        assert_eq!(rows[0].get("visits"), "");
        assert_eq!(rows[0].get("no_such_column"), "");
    }

    #[test]
    fn test_header_only_or_empty_yields_no_rows() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("email,tier\n").is_empty());
        assert!(parse_csv("\n\n   \n").is_empty());
    }

    #[test]
    fn test_blank_lines_bom_and_crlf_are_ignored() {
        let content = "\u{feff}email , tier\r\n\r\na@x.com,VIP Membership\r\n   \nb@x.com,Core Membership\r\n";
        let rows = parse_csv(content);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("email"), "a@x.com");
        assert_eq!(rows[0].get("tier"), "VIP Membership");
        assert_eq!(rows[1].get("tier"), "Core Membership");
    }

    #[test]
    fn test_extra_values_are_ignored() {
        let rows = parse_csv("a,b\n1,2,3\n");
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].get("b"), "2");
    }
}
