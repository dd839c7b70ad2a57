//! Timestamp parsing, formatting, and day bucketing.
//!
//! All request timestamps travel as RFC 3339 strings. Formatting is held
//! at whole-second precision with `Z` for UTC so that a parsed timestamp
//! re-formats to the same string the client sent.

use chrono::{DateTime, FixedOffset, ParseError, SecondsFormat, TimeZone, Utc};

/// A timestamp pinned to UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse an RFC 3339 date-time, keeping the offset the client supplied.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_rfc3339(s)
}

/// Format a timestamp as RFC 3339 at whole-second precision.
pub fn format_rfc3339<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// True if the two instants fall on the same UTC calendar day.
pub fn same_utc_day<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    a.with_timezone(&Utc).date_naive() == b.with_timezone(&Utc).date_naive()
}
