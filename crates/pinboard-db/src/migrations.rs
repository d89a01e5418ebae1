use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE images (
                id              TEXT PRIMARY KEY,
                filename        TEXT NOT NULL,
                original_name   TEXT NOT NULL,
                upload_date     TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'approved', 'changes_requested')),
                latest_version  INTEGER NOT NULL DEFAULT 0 CHECK (latest_version >= 0)
            );

            CREATE INDEX idx_images_upload_date ON images(upload_date);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                image_id    TEXT NOT NULL REFERENCES images(id) ON DELETE CASCADE,
                x           REAL NOT NULL,
                y           REAL NOT NULL,
                comment     TEXT NOT NULL,
                author      TEXT NOT NULL DEFAULT 'Anonymous',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_image ON comments(image_id, created_at);

            CREATE TABLE versions (
                id              TEXT PRIMARY KEY,
                image_id        TEXT NOT NULL REFERENCES images(id) ON DELETE CASCADE,
                version_number  INTEGER NOT NULL CHECK (version_number >= 1),
                status          TEXT NOT NULL
                                CHECK (status IN ('approved', 'changes_requested')),
                note            TEXT,
                created_at      TEXT NOT NULL,
                UNIQUE (image_id, version_number)
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn history_rejects_pending_entries() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO images (id, filename, original_name, upload_date) VALUES ('i', 'f', 'o', 'now')",
            [],
        )
        .unwrap();

        let err = conn.execute(
            "INSERT INTO versions (id, image_id, version_number, status, created_at)
             VALUES ('v', 'i', 1, 'pending', 'now')",
            [],
        );
        assert!(err.is_err());
    }
}
