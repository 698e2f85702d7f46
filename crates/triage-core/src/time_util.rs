use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{Result, TriageError};

/// Parse an RFC 3339 timestamp, naming `field` in the error.
pub fn parse_timestamp(value: &str, field: impl FnOnce() -> String) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|_| TriageError::InvalidTimestamp {
        field: field(),
        value: value.to_string(),
    })
}

/// Whole days between two instants, floored, direction-independent.
pub fn days_between(a: OffsetDateTime, b: OffsetDateTime) -> i64 {
    (b - a).abs().whole_days()
}

pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339)
        .expect("RFC3339 formatting should not fail")
}
