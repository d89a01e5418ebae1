use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// The version slot was taken by another writer, either because the
    /// image's version moved since it was read or because the history row
    /// already exists.
    #[error("version {version} of image {image_id} is already allocated")]
    Conflict { image_id: Uuid, version: u32 },

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
