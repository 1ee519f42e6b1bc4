//! `Retry-After` header parsing.
//!
//! The header is either delta-seconds (`120`) or an HTTP-date
//! (`Wed, 21 Oct 2015 07:28:00 GMT`). Dates in the past mean "retry now".

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parse a `Retry-After` value relative to `now`.
///
/// Returns `None` for values that are neither delta-seconds nor an HTTP-date.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<u64>().ok().map(Duration::from_secs);
    }

    let at = parse_http_date(value)?;
    let wait = at.signed_duration_since(now);
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

/// Parse a `Retry-After` value against the current time and clamp it to
/// `ceiling`.
pub fn retry_after_hint(value: &str, ceiling: Duration) -> Option<Duration> {
    parse_retry_after(value, Utc::now()).map(|wait| wait.min(ceiling))
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT) {
        return Some(dt.and_utc());
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 23, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_delta_seconds() {
        assert_eq!(parse_retry_after("2", now()), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 0 ", now()), Some(Duration::ZERO));
    }

    #[test]
    fn test_http_date_in_future() {
        let wait = parse_retry_after("Thu, 23 Oct 2025 20:00:30 GMT", now());
        assert_eq!(wait, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_rfc2822_offset_date() {
        let wait = parse_retry_after("Thu, 23 Oct 2025 22:00:05 +0200", now());
        assert_eq!(wait, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_http_date_in_past_is_zero() {
        let wait = parse_retry_after("Thu, 23 Oct 2025 19:59:00 GMT", now());
        assert_eq!(wait, Some(Duration::ZERO));
    }

    #[test]
    fn test_garbage_is_ignored() {
        assert_eq!(parse_retry_after("soon", now()), None);
        assert_eq!(parse_retry_after("", now()), None);
        assert_eq!(parse_retry_after("-5", now()), None);
    }

    #[test]
    fn test_hint_clamped_to_ceiling() {
        assert_eq!(
            retry_after_hint("3600", Duration::from_secs(3)),
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            retry_after_hint("1", Duration::from_secs(3)),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_far_future_date_clamped() {
        assert_eq!(
            retry_after_hint("Fri, 01 Jan 2100 00:00:00 GMT", Duration::from_millis(500)),
            Some(Duration::from_millis(500))
        );
    }
}
