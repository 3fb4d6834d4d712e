//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use chrono::{DateTime, Utc};
use gallery_common::ImageId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

/// Parse an RFC 3339 timestamp from a text column.
fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

// ---------------------------------------------------------------------------
// ImageRecord
// ---------------------------------------------------------------------------

/// Metadata for one image held by the media store.
///
/// Serializes as `{"_id", "url", "uploadedAt"}`; the media store reference
/// is internal and never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "_id")]
    pub id: ImageId,
    pub url: String,
    #[serde(skip)]
    pub public_id: Option<String>,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            url: row.get(1)?,
            public_id: row.get(2)?,
            uploaded_at: parse_timestamp(row, 3)?,
        })
    }
}
