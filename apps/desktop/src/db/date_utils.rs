//! Timestamp encoding for SQLite text columns.
//!
//! Timestamps are stored as RFC 3339 in UTC with fixed microsecond
//! precision, so lexical order in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;

/// Format a timestamp for storage.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Read a timestamp column inside a row mapper.
pub fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
