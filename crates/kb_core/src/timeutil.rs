//! Repository clock: all persisted timestamps use a fixed +09:00 offset at
//! minute precision, with the offset written out explicitly.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// The fixed +09:00 offset used for every persisted timestamp.
pub fn jst() -> FixedOffset {
    // A constant offset well inside chrono's accepted range.
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("+09:00 is a valid offset")
}

pub fn now_jst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// Format a timestamp as minute-precision ISO-8601 in +09:00,
/// e.g. `2026-02-11T08:15+09:00`. Seconds and subseconds are dropped.
pub fn iso_jst_minute<Tz: TimeZone>(dt: DateTime<Tz>) -> String {
    dt.with_timezone(&jst())
        .format("%Y-%m-%dT%H:%M%:z")
        .to_string()
}

/// Lenient ISO-8601 parse for frontmatter timestamps.
///
/// Accepts RFC 3339, offset forms without seconds, and naive date-times or
/// bare dates; naive values are interpreted in +09:00 so comparisons stay
/// well-defined.
pub fn parse_iso(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    naive.and_local_timezone(jst()).single()
}
