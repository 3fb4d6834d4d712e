//! Image record CRUD operations.

use chrono::{SecondsFormat, SubsecRound, Utc};
use gallery_common::{Error, ImageId, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::ImageRecord;

const COLS: &str = "id, url, public_id, uploaded_at";

/// Create a new image record stamped with the current time.
///
/// The timestamp is truncated to microseconds so the value returned here is
/// identical to what a later read produces.
pub fn create_image(conn: &Connection, url: &str, public_id: Option<&str>) -> Result<ImageRecord> {
    let id = ImageId::new();
    let uploaded_at = Utc::now().trunc_subsecs(6);

    conn.execute(
        "INSERT INTO images (id, url, public_id, uploaded_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            id.to_string(),
            url,
            public_id,
            uploaded_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ImageRecord {
        id,
        url: url.to_string(),
        public_id: public_id.map(String::from),
        uploaded_at,
    })
}

/// List every image record, most recently uploaded first.
///
/// Records sharing a timestamp come back newest insert first.
pub fn list_images(conn: &Connection) -> Result<Vec<ImageRecord>> {
    let q = format!("SELECT {COLS} FROM images ORDER BY uploaded_at DESC, rowid DESC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], ImageRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Get an image record by ID.
pub fn get_image(conn: &Connection, id: ImageId) -> Result<Option<ImageRecord>> {
    let q = format!("SELECT {COLS} FROM images WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], ImageRecord::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Delete an image record by ID. Returns `false` if nothing was deleted.
pub fn delete_image(conn: &Connection, id: ImageId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM images WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
