use pinboard_types::Annotation;
use pinboard_types::models::ANONYMOUS_AUTHOR;
use tracing::{debug, info};
use uuid::Uuid;

use crate::access::Access;
use crate::error::{Result, ReviewError};
use crate::store::ReviewStore;
use crate::ReviewService;

impl<S: ReviewStore> ReviewService<S> {
    /// Pin a comment to a point of an image.
    ///
    /// `x` and `y` are natural pixel coordinates and are stored untouched.
    /// Missing or non-finite coordinates and blank text are rejected before
    /// anything is written.
    pub fn annotate(
        &self,
        image_id: Uuid,
        x: Option<f64>,
        y: Option<f64>,
        text: &str,
        author: Option<&str>,
    ) -> Result<Annotation> {
        let x = coordinate("x", x)?;
        let y = coordinate("y", y)?;
        if text.trim().is_empty() {
            return Err(ReviewError::validation("comment text is required"));
        }
        let author = author
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR);

        let annotation = self.store.insert_annotation(image_id, x, y, text, author)?;
        debug!(
            "Pin {} on image {} at ({}, {}) by {}",
            annotation.id, image_id, x, y, annotation.author
        );
        Ok(annotation)
    }

    pub fn list_annotations(&self, image_id: Uuid) -> Result<Vec<Annotation>> {
        Ok(self.store.list_annotations(image_id)?)
    }

    /// Remove a single pin. Unknown ids are a no-op.
    pub fn delete_annotation(&self, access: Access, id: Uuid) -> Result<()> {
        access.require()?;
        if self.store.delete_annotation(id)? {
            info!("Comment {} deleted", id);
        }
        Ok(())
    }
}

fn coordinate(name: &str, value: Option<f64>) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(ReviewError::validation(format!("{name} must be a finite number"))),
        None => Err(ReviewError::validation(format!("{name} is required"))),
    }
}
