//! String and timestamp formatting for UI rendering.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Truncate a string to max length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let truncated: String = s.chars().take(max_len - 3).collect();
    format!("{}...", truncated)
}

/// Sanitize a string for single-line output (replace newlines with spaces).
pub fn single_line(s: &str) -> String {
    s.replace('\n', " ").replace('\r', "")
}

/// Format a timestamp for display.
///
/// Pretty output uses minutes and the zone name; plain output is RFC 3339,
/// shifted into `tz` when one is configured.
pub fn format_datetime(dt: &DateTime<Utc>, tz: Option<Tz>, pretty: bool) -> String {
    match (tz, pretty) {
        (Some(tz), true) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string(),
        (Some(tz), false) => dt.with_timezone(&tz).to_rfc3339(),
        (None, true) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        (None, false) => dt.to_rfc3339(),
    }
}

pub fn parse_timezone(name: &str) -> anyhow::Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {}", name, e))
}

/// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken as local
/// midnight in `tz` (UTC when unset).
pub fn parse_datetime(value: &str, tz: Option<Tz>) -> anyhow::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        anyhow::anyhow!(
            "Invalid date/time {:?} (use YYYY-MM-DD or RFC 3339)",
            value
        )
    })?;
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let tz = tz.unwrap_or(chrono_tz::UTC);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| anyhow::anyhow!("{} does not exist in {}", value, tz))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 1, 30, 0).unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 2), "he");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("bagus\nlanjut"), "bagus lanjut");
    }

    #[test]
    fn test_format_datetime_utc() {
        assert_eq!(format_datetime(&sample(), None, true), "2024-03-01 01:30 UTC");
        assert_eq!(format_datetime(&sample(), None, false), "2024-03-01T01:30:00+00:00");
    }

    #[test]
    fn test_format_datetime_in_zone() {
        let jakarta = parse_timezone("Asia/Jakarta").unwrap();
        assert_eq!(
            format_datetime(&sample(), Some(jakarta), true),
            "2024-03-01 08:30 WIB"
        );
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_parse_datetime() {
        let jakarta = parse_timezone("Asia/Jakarta").unwrap();
        assert_eq!(
            parse_datetime("2024-03-01", Some(jakarta)).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 17, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("2024-03-01T01:30:00Z", None).unwrap(),
            sample()
        );
        assert!(parse_datetime("kemarin", None).is_err());
    }
}
