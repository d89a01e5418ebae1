use pinboard_db::{Database, DbError};
use pinboard_types::{Annotation, Image, ImageDetail, ReviewStatus, Version};
use uuid::Uuid;

type StoreResult<T> = Result<T, DbError>;

/// Persistence the review core runs against.
///
/// Implementations must make `delete_image` remove the image, its comments
/// and its history as one unit, and must make `commit_transition` a single
/// compare-and-swap: if the stored version is not `expected`, or history row
/// `expected + 1` already exists, report [`DbError::Conflict`] and write
/// nothing.
pub trait ReviewStore: Send + Sync {
    fn create_image(&self, filename: &str, original_name: &str) -> StoreResult<Image>;
    fn get_image(&self, id: Uuid) -> StoreResult<Option<Image>>;
    fn get_image_detail(&self, id: Uuid) -> StoreResult<Option<ImageDetail>>;
    fn list_images(&self) -> StoreResult<Vec<Image>>;
    fn delete_image(&self, id: Uuid) -> StoreResult<Option<Image>>;

    fn insert_annotation(
        &self,
        image_id: Uuid,
        x: f64,
        y: f64,
        comment: &str,
        author: &str,
    ) -> StoreResult<Annotation>;
    fn list_annotations(&self, image_id: Uuid) -> StoreResult<Vec<Annotation>>;
    fn delete_annotation(&self, id: Uuid) -> StoreResult<bool>;

    fn list_versions(&self, image_id: Uuid) -> StoreResult<Vec<Version>>;
    fn current_version(&self, image_id: Uuid) -> StoreResult<Option<u32>>;
    fn commit_transition(
        &self,
        image_id: Uuid,
        expected: u32,
        status: ReviewStatus,
        note: Option<&str>,
    ) -> StoreResult<Version>;
}

impl ReviewStore for Database {
    fn create_image(&self, filename: &str, original_name: &str) -> StoreResult<Image> {
        Database::create_image(self, filename, original_name)
    }

    fn get_image(&self, id: Uuid) -> StoreResult<Option<Image>> {
        Database::get_image(self, id)
    }

    fn get_image_detail(&self, id: Uuid) -> StoreResult<Option<ImageDetail>> {
        Database::get_image_detail(self, id)
    }

    fn list_images(&self) -> StoreResult<Vec<Image>> {
        Database::list_images(self)
    }

    fn delete_image(&self, id: Uuid) -> StoreResult<Option<Image>> {
        Database::delete_image(self, id)
    }

    fn insert_annotation(
        &self,
        image_id: Uuid,
        x: f64,
        y: f64,
        comment: &str,
        author: &str,
    ) -> StoreResult<Annotation> {
        Database::insert_annotation(self, image_id, x, y, comment, author)
    }

    fn list_annotations(&self, image_id: Uuid) -> StoreResult<Vec<Annotation>> {
        Database::list_annotations(self, image_id)
    }

    fn delete_annotation(&self, id: Uuid) -> StoreResult<bool> {
        Database::delete_annotation(self, id)
    }

    fn list_versions(&self, image_id: Uuid) -> StoreResult<Vec<Version>> {
        Database::list_versions(self, image_id)
    }

    fn current_version(&self, image_id: Uuid) -> StoreResult<Option<u32>> {
        Database::current_version(self, image_id)
    }

    fn commit_transition(
        &self,
        image_id: Uuid,
        expected: u32,
        status: ReviewStatus,
        note: Option<&str>,
    ) -> StoreResult<Version> {
        Database::commit_transition(self, image_id, expected, status, note)
    }
}

impl<T: ReviewStore + ?Sized> ReviewStore for std::sync::Arc<T> {
    fn create_image(&self, filename: &str, original_name: &str) -> StoreResult<Image> {
        (**self).create_image(filename, original_name)
    }

    fn get_image(&self, id: Uuid) -> StoreResult<Option<Image>> {
        (**self).get_image(id)
    }

    fn get_image_detail(&self, id: Uuid) -> StoreResult<Option<ImageDetail>> {
        (**self).get_image_detail(id)
    }

    fn list_images(&self) -> StoreResult<Vec<Image>> {
        (**self).list_images()
    }

    fn delete_image(&self, id: Uuid) -> StoreResult<Option<Image>> {
        (**self).delete_image(id)
    }

    fn insert_annotation(
        &self,
        image_id: Uuid,
        x: f64,
        y: f64,
        comment: &str,
        author: &str,
    ) -> StoreResult<Annotation> {
        (**self).insert_annotation(image_id, x, y, comment, author)
    }

    fn list_annotations(&self, image_id: Uuid) -> StoreResult<Vec<Annotation>> {
        (**self).list_annotations(image_id)
    }

    fn delete_annotation(&self, id: Uuid) -> StoreResult<bool> {
        (**self).delete_annotation(id)
    }

    fn list_versions(&self, image_id: Uuid) -> StoreResult<Vec<Version>> {
        (**self).list_versions(image_id)
    }

    fn current_version(&self, image_id: Uuid) -> StoreResult<Option<u32>> {
        (**self).current_version(image_id)
    }

    fn commit_transition(
        &self,
        image_id: Uuid,
        expected: u32,
        status: ReviewStatus,
        note: Option<&str>,
    ) -> StoreResult<Version> {
        (**self).commit_transition(image_id, expected, status, note)
    }
}
