use pinboard_types::{Image, ImageDetail};
use tracing::info;
use uuid::Uuid;

use crate::access::Access;
use crate::error::{Result, ReviewError};
use crate::store::ReviewStore;
use crate::ReviewService;

impl<S: ReviewStore> ReviewService<S> {
    /// Register an uploaded blob as a new image, pending at version 0.
    pub fn create_image(&self, access: Access, file_ref: &str, original_name: &str) -> Result<Image> {
        access.require()?;

        if file_ref.trim().is_empty() {
            return Err(ReviewError::validation("file reference is required"));
        }
        if original_name.trim().is_empty() {
            return Err(ReviewError::validation("original name is required"));
        }

        let image = self.store.create_image(file_ref, original_name)?;
        info!("Image {} created for {}", image.id, image.original_name);
        Ok(image)
    }

    /// The image with its pins (oldest first) and history (newest first).
    pub fn get_image(&self, id: Uuid) -> Result<ImageDetail> {
        self.store
            .get_image_detail(id)?
            .ok_or(ReviewError::NotFound { entity: "image", id })
    }

    pub fn list_images(&self) -> Result<Vec<Image>> {
        Ok(self.store.list_images()?)
    }

    /// Remove an image together with its pins and history.
    ///
    /// Deleting an unknown id succeeds and returns `None`. The removed record
    /// is returned so the caller can drop the stored blob.
    pub fn delete_image(&self, access: Access, id: Uuid) -> Result<Option<Image>> {
        access.require()?;

        let removed = self.locks.with_lock(id, || self.store.delete_image(id))?;
        match &removed {
            Some(image) => info!("Image {} ({}) deleted", id, image.original_name),
            None => info!("Image {} already absent, nothing to delete", id),
        }
        Ok(removed)
    }
}
