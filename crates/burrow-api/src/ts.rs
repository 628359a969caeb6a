use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// Parse a timestamp column into UTC. SQLite's `datetime('now')` stores
/// "YYYY-MM-DD HH:MM:SS" without a timezone, so fall back to naive-UTC
/// when RFC 3339 parsing fails.
pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_datetime_text() {
        let ts = parse_ts("2025-06-01 12:30:00");
        assert_eq!(ts.to_rfc3339(), "2025-06-01T12:30:00+00:00");
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_ts("2025-06-01T12:30:00Z");
        assert_eq!(ts.timestamp(), 1748781000);
    }

    #[test]
    fn garbage_becomes_epoch() {
        assert_eq!(parse_ts("not a date"), DateTime::<Utc>::default());
    }
}
