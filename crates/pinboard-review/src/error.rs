use pinboard_db::DbError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// A version number was allocated twice. Only surfaces once the engine
    /// has run out of retries.
    #[error("version {version} of image {image_id} was allocated concurrently")]
    Conflict { image_id: Uuid, version: u32 },

    #[error("not authorized")]
    Unauthorized,

    #[error("storage failure: {0}")]
    Storage(#[source] DbError),
}

impl ReviewError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DbError> for ReviewError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => Self::NotFound { entity, id },
            DbError::Conflict { image_id, version } => Self::Conflict { image_id, version },
            other => Self::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
