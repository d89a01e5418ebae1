use chrono::Utc;
use pinboard_types::{Annotation, Image, ImageDetail, ReviewStatus, Version};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    COMMENT_COLUMNS, IMAGE_COLUMNS, VERSION_COLUMNS, annotation_from_row, image_from_row,
    version_from_row,
};
use crate::{Database, DbError, Result};

impl Database {
    // -- Images --

    /// Insert a freshly uploaded image: pending, version 0.
    pub fn create_image(&self, filename: &str, original_name: &str) -> Result<Image> {
        let image = Image {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            original_name: original_name.to_string(),
            upload_date: Utc::now(),
            status: ReviewStatus::Pending,
            latest_version: 0,
        };

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO images (id, filename, original_name, upload_date, status, latest_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![
                    image.id.to_string(),
                    &image.filename,
                    &image.original_name,
                    image.upload_date,
                    image.status.as_str(),
                ],
            )?;
            Ok(())
        })?;

        Ok(image)
    }

    pub fn get_image(&self, id: Uuid) -> Result<Option<Image>> {
        self.with_conn(|conn| query_image(conn, id))
    }

    /// An image with its pins and history, read from one snapshot so the
    /// history always agrees with the image's version counter.
    pub fn get_image_detail(&self, id: Uuid) -> Result<Option<ImageDetail>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let Some(image) = query_image(&tx, id)? else {
                return Ok(None);
            };
            let annotations = query_annotations(&tx, id)?;
            let versions = query_versions(&tx, id)?;
            tx.finish()?;
            Ok(Some(ImageDetail { image, annotations, versions }))
        })
    }

    /// All images, newest upload first.
    pub fn list_images(&self) -> Result<Vec<Image>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {IMAGE_COLUMNS} FROM images ORDER BY upload_date DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([], image_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Remove an image with its comments and history in one transaction.
    /// Returns the removed record, or `None` when there was nothing to delete.
    pub fn delete_image(&self, id: Uuid) -> Result<Option<Image>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let image = query_image(&tx, id)?;

            if image.is_some() {
                let key = id.to_string();
                // Explicit deletes keep the cascade intact even on a connection
                // opened without foreign key enforcement.
                let comments = tx.execute("DELETE FROM comments WHERE image_id = ?1", [&key])?;
                let versions = tx.execute("DELETE FROM versions WHERE image_id = ?1", [&key])?;
                tx.execute("DELETE FROM images WHERE id = ?1", [&key])?;
                debug!(
                    "Deleted image {} with {} comments and {} versions",
                    id, comments, versions
                );
            }

            tx.commit()?;
            Ok(image)
        })
    }

    // -- Comments --

    pub fn insert_annotation(
        &self,
        image_id: Uuid,
        x: f64,
        y: f64,
        comment: &str,
        author: &str,
    ) -> Result<Annotation> {
        let annotation = Annotation {
            id: Uuid::new_v4(),
            image_id,
            x,
            y,
            comment: comment.to_string(),
            author: author.to_string(),
            created_at: Utc::now(),
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            ensure_image(&tx, image_id)?;
            tx.execute(
                "INSERT INTO comments (id, image_id, x, y, comment, author, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    annotation.id.to_string(),
                    image_id.to_string(),
                    annotation.x,
                    annotation.y,
                    &annotation.comment,
                    &annotation.author,
                    annotation.created_at,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })?;

        Ok(annotation)
    }

    /// Pins of an image in the order they were placed.
    pub fn list_annotations(&self, image_id: Uuid) -> Result<Vec<Annotation>> {
        self.with_conn(|conn| query_annotations(conn, image_id))
    }

    /// Returns whether a comment was removed.
    pub fn delete_annotation(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM comments WHERE id = ?1", [id.to_string()])?;
            Ok(removed > 0)
        })
    }

    // -- Versions --

    /// History of an image, newest transition first.
    pub fn list_versions(&self, image_id: Uuid) -> Result<Vec<Version>> {
        self.with_conn(|conn| query_versions(conn, image_id))
    }

    /// The image's current version counter, `None` if the image does not exist.
    pub fn current_version(&self, image_id: Uuid) -> Result<Option<u32>> {
        self.with_conn(|conn| {
            let version = conn
                .query_row(
                    "SELECT latest_version FROM images WHERE id = ?1",
                    [image_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(version)
        })
    }

    /// Atomically move an image from version `expected` to `expected + 1`.
    ///
    /// Within one IMMEDIATE transaction: compare the stored counter against
    /// `expected`, append the history entry, then point the image at it.
    /// A moved counter or an existing history row yields
    /// [`DbError::Conflict`] and nothing is written.
    pub fn commit_transition(
        &self,
        image_id: Uuid,
        expected: u32,
        status: ReviewStatus,
        note: Option<&str>,
    ) -> Result<Version> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current: u32 = tx
                .query_row(
                    "SELECT latest_version FROM images WHERE id = ?1",
                    [image_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(DbError::NotFound { entity: "image", id: image_id })?;

            let next = expected + 1;
            if current != expected {
                return Err(DbError::Conflict { image_id, version: next });
            }

            let version = insert_version(&tx, image_id, next, status, note)?;
            set_status_and_version(&tx, image_id, status, next)?;
            tx.commit()?;

            Ok(version)
        })
    }
}

fn query_image(conn: &Connection, id: Uuid) -> Result<Option<Image>> {
    let image = conn
        .query_row(
            &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
            [id.to_string()],
            image_from_row,
        )
        .optional()?;
    Ok(image)
}

fn query_annotations(conn: &Connection, image_id: Uuid) -> Result<Vec<Annotation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments
         WHERE image_id = ?1
         ORDER BY created_at ASC, rowid ASC"
    ))?;
    let rows = stmt
        .query_map([image_id.to_string()], annotation_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_versions(conn: &Connection, image_id: Uuid) -> Result<Vec<Version>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VERSION_COLUMNS} FROM versions
         WHERE image_id = ?1
         ORDER BY version_number DESC"
    ))?;
    let rows = stmt
        .query_map([image_id.to_string()], version_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ensure_image(conn: &Connection, id: Uuid) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM images WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(DbError::NotFound { entity: "image", id })
    }
}

/// Append one history row. (image_id, version_number) is unique; a
/// duplicate surfaces as [`DbError::Conflict`].
pub(crate) fn insert_version(
    conn: &Connection,
    image_id: Uuid,
    version_number: u32,
    status: ReviewStatus,
    note: Option<&str>,
) -> Result<Version> {
    let version = Version {
        id: Uuid::new_v4(),
        image_id,
        version_number,
        status,
        note: note.map(str::to_string),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO versions (id, image_id, version_number, status, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            version.id.to_string(),
            image_id.to_string(),
            version_number,
            status.as_str(),
            &version.note,
            version.created_at,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::Conflict { image_id, version: version_number }
        } else {
            e.into()
        }
    })?;

    Ok(version)
}

pub(crate) fn set_status_and_version(
    conn: &Connection,
    image_id: Uuid,
    status: ReviewStatus,
    version_number: u32,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE images SET status = ?1, latest_version = ?2 WHERE id = ?3",
        params![status.as_str(), version_number, image_id.to_string()],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound { entity: "image", id: image_id });
    }
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error(),
        Some(e) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
