//! Row mappers from SQLite rows to the shared domain types.
//!
//! Ids and statuses are stored as TEXT; timestamps use rusqlite's chrono
//! encoding (ISO-8601, UTC), which sorts lexicographically.

use pinboard_types::{Annotation, Image, ReviewStatus, Version};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

pub const IMAGE_COLUMNS: &str = "id, filename, original_name, upload_date, status, latest_version";
pub const COMMENT_COLUMNS: &str = "id, image_id, x, y, comment, author, created_at";
pub const VERSION_COLUMNS: &str = "id, image_id, version_number, status, note, created_at";

pub fn image_from_row(row: &Row<'_>) -> rusqlite::Result<Image> {
    Ok(Image {
        id: uuid_at(row, 0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        upload_date: row.get(3)?,
        status: status_at(row, 4)?,
        latest_version: row.get(5)?,
    })
}

pub fn annotation_from_row(row: &Row<'_>) -> rusqlite::Result<Annotation> {
    Ok(Annotation {
        id: uuid_at(row, 0)?,
        image_id: uuid_at(row, 1)?,
        x: row.get(2)?,
        y: row.get(3)?,
        comment: row.get(4)?,
        author: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn version_from_row(row: &Row<'_>) -> rusqlite::Result<Version> {
    Ok(Version {
        id: uuid_at(row, 0)?,
        image_id: uuid_at(row, 1)?,
        version_number: row.get(2)?,
        status: status_at(row, 3)?,
        note: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ReviewStatus> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
