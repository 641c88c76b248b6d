//! Image CRUD operations.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use iv_core::{Error, ImageId, Result};

use crate::models::{Image, ImageSummary};

const COLS: &str = "id, name, data, content_type, created_at, modified_at";
const SUMMARY_COLS: &str = "id, name, created_at, modified_at";

/// Store a new image and return it with its assigned ID.
pub fn create_image(
    conn: &Connection,
    name: &str,
    content_type: &str,
    data: &[u8],
) -> Result<Image> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO images (name, data, content_type, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![name, data, content_type, created_at.to_rfc3339()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Image {
        id: ImageId::from(conn.last_insert_rowid()),
        name: name.to_string(),
        data: data.to_vec(),
        content_type: content_type.to_string(),
        created_at,
        modified_at: None,
    })
}

/// Get an image (payload included) by ID.
pub fn get_image(conn: &Connection, id: ImageId) -> Result<Option<Image>> {
    let q = format!("SELECT {COLS} FROM images WHERE id = ?1");
    let result = conn.query_row(&q, [id.get()], Image::from_row);
    match result {
        Ok(img) => Ok(Some(img)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Overwrite the name, payload, and content type of an existing image and
/// stamp its modification time.
///
/// Returns `None` if no image with `id` exists. The stored `modified_at` is
/// never earlier than `created_at`, even if the clock has stepped backwards.
pub fn replace_image(
    conn: &Connection,
    id: ImageId,
    name: &str,
    content_type: &str,
    data: &[u8],
) -> Result<Option<Image>> {
    // Take the write lock up front so the read-then-write cannot be
    // rejected mid-way by a concurrent writer.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;

    let created_at: Option<String> = tx
        .query_row(
            "SELECT created_at FROM images WHERE id = ?1",
            [id.get()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))?;

    let Some(created_at) = created_at else {
        return Ok(None);
    };
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::database(format!("Corrupt created_at for image {id}: {e}")))?;
    let modified_at = Utc::now().max(created_at);

    tx.execute(
        "UPDATE images SET name = ?1, data = ?2, content_type = ?3, modified_at = ?4
         WHERE id = ?5",
        rusqlite::params![name, data, content_type, modified_at.to_rfc3339(), id.get()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(Some(Image {
        id,
        name: name.to_string(),
        data: data.to_vec(),
        content_type: content_type.to_string(),
        created_at,
        modified_at: Some(modified_at),
    }))
}

/// Delete an image by ID, returning the name it was stored under.
///
/// Returns `None` if no image with `id` exists.
pub fn delete_image(conn: &Connection, id: ImageId) -> Result<Option<String>> {
    conn.query_row(
        "DELETE FROM images WHERE id = ?1 RETURNING name",
        [id.get()],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List every image as a summary, ordered by ID. The payload column is
/// never read.
pub fn list_images(conn: &Connection) -> Result<Vec<ImageSummary>> {
    let q = format!("SELECT {SUMMARY_COLS} FROM images ORDER BY id");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], ImageSummary::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
