//! Display-only cleanup of upstream records.
//!
//! The Webmaster API serializes dates in the WCF form `/Date(<ms>)/`, with an
//! optional `±hhmm` offset before the closing parenthesis. The millisecond
//! count is always relative to the UTC epoch; the offset only says where the
//! value came from, so it is ignored here.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::Record;

/// `strftime` pattern rendering dates like "January 1, 2021".
pub const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";

/// Parse a `/Date(<ms>[±hhmm])/` value.
pub fn parse_wcf_date(value: &str) -> Option<DateTime<Utc>> {
    let inner = value.strip_prefix("/Date(")?.strip_suffix(")/")?;

    // A leading '-' belongs to the timestamp, any later sign starts the offset.
    let offset_at = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i);
    let (millis, offset) = match offset_at {
        Some(i) => inner.split_at(i),
        None => (inner, ""),
    };
    if !offset.is_empty() && !(offset.len() == 5 && offset[1..].bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let millis: i64 = millis.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Format `value` with `date_format` if it is a WCF date.
///
/// Returns `None` for anything else, including format strings chrono rejects.
pub fn format_wcf_date(value: &str, date_format: &str) -> Option<String> {
    let date = parse_wcf_date(value)?;
    let mut out = String::new();
    write!(out, "{}", date.format(date_format)).ok()?;
    Some(out)
}

/// Copy of `record` with every WCF date string rewritten with `date_format`.
///
/// Values that look like dates but fail to parse are kept as they are.
pub fn sanitize_record(record: &Record, date_format: &str) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if s.starts_with("/Date(") => format_wcf_date(s, date_format)
                    .map(Value::String)
                    .unwrap_or_else(|| value.clone()),
                _ => value.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn parses_plain_millisecond_date() {
        let date = parse_wcf_date("/Date(1609459200000)/").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn offset_does_not_shift_the_instant() {
        let date = parse_wcf_date("/Date(1609459200000-0800)/").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn negative_timestamps_are_before_epoch() {
        let date = parse_wcf_date("/Date(-86400000)/").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(parse_wcf_date("/Date(abc)/").is_none());
        assert!(parse_wcf_date("/Date(1609459200000").is_none());
        assert!(parse_wcf_date("/Date(1609459200000+08)/").is_none());
        assert!(parse_wcf_date("2021-01-01").is_none());
    }

    #[test]
    fn default_format_renders_calendar_date() {
        assert_eq!(
            format_wcf_date("/Date(1609459200000)/", DEFAULT_DATE_FORMAT).as_deref(),
            Some("January 1, 2021")
        );
    }

    #[test]
    fn sanitize_rewrites_only_date_strings() {
        let record = json!({
            "DiscoveryDate": "/Date(1609459200000)/",
            "LastCrawledDate": "/Date(1612137600000-0800)/",
            "Url": "https://example.com/hello",
            "Clicks": 12,
            "Broken": "/Date(soon)/",
        });
        let sanitized = sanitize_record(record.as_object().unwrap(), "%Y-%m-%d");
        assert_eq!(sanitized["DiscoveryDate"], "2021-01-01");
        assert_eq!(sanitized["LastCrawledDate"], "2021-02-01");
        assert_eq!(sanitized["Url"], "https://example.com/hello");
        assert_eq!(sanitized["Clicks"], 12);
        assert_eq!(sanitized["Broken"], "/Date(soon)/");
    }

    #[test]
    fn invalid_format_keeps_original_value() {
        let record = json!({ "DiscoveryDate": "/Date(1609459200000)/" });
        let sanitized = sanitize_record(record.as_object().unwrap(), "%Q");
        assert_eq!(sanitized["DiscoveryDate"], "/Date(1609459200000)/");
    }
}
