//! Typed row models.

use chrono::{DateTime, Utc};
use iv_core::ImageId;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse an RFC 3339 timestamp from a text column.
fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_opt_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        Some(v) => DateTime::parse_from_rfc3339(&v)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A stored image including its payload.
#[derive(Debug, Clone)]
pub struct Image {
    pub id: ImageId,
    pub name: String,
    pub data: Vec<u8>,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Image {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: ImageId::from(row.get::<_, i64>(0)?),
            name: row.get(1)?,
            data: row.get(2)?,
            content_type: row.get(3)?,
            created_at: parse_timestamp(row, 4)?,
            modified_at: parse_opt_timestamp(row, 5)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ImageSummary
// ---------------------------------------------------------------------------

/// Listing projection of an image. Never carries the payload.
#[derive(Debug, Clone)]
pub struct ImageSummary {
    pub id: ImageId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Path the payload can be fetched from.
    pub thumbnail_url: String,
}

impl ImageSummary {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let id = ImageId::from(row.get::<_, i64>(0)?);
        Ok(Self {
            id,
            name: row.get(1)?,
            created_at: parse_timestamp(row, 2)?,
            modified_at: parse_opt_timestamp(row, 3)?,
            thumbnail_url: id.fetch_path(),
        })
    }
}
