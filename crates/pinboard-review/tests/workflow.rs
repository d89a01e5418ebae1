use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use pinboard_db::{Database, DbError};
use pinboard_review::{Access, MAX_TRANSITION_ATTEMPTS, ReviewError, ReviewService, ReviewStore};
use pinboard_types::{Annotation, Image, ImageDetail, ReviewStatus, Version};
use uuid::Uuid;

fn on_disk() -> (tempfile::TempDir, Arc<Database>) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("review.db")).unwrap();
    (dir, Arc::new(db))
}

fn assert_contiguous_history(db: &Database, image_id: Uuid, expected: u32) {
    let versions = db.list_versions(image_id).unwrap();
    let numbers: Vec<u32> = versions.iter().map(|v| v.version_number).collect();
    let want: Vec<u32> = (1..=expected).rev().collect();
    assert_eq!(numbers, want);

    let image = db.get_image(image_id).unwrap().unwrap();
    assert_eq!(image.latest_version, expected);
    if let Some(head) = versions.first() {
        assert_eq!(image.status, head.status);
    }
}

#[test]
fn logo_review_scenario() {
    let service = ReviewService::new(Database::open_in_memory().unwrap());
    let image = service
        .create_image(Access::Granted, "f3a1.png", "logo.png")
        .unwrap();
    assert_eq!(image.status, ReviewStatus::Pending);
    assert_eq!(image.latest_version, 0);

    let first = service
        .transition_status(image.id, ReviewStatus::Approved, Some("looks good"))
        .unwrap();
    assert_eq!(first.status, ReviewStatus::Approved);
    assert_eq!(first.version_number, 1);
    assert_eq!(service.get_image(image.id).unwrap().versions.len(), 1);

    let second = service
        .transition_status(image.id, ReviewStatus::ChangesRequested, Some("fix contrast"))
        .unwrap();
    assert_eq!(second.status, ReviewStatus::ChangesRequested);
    assert_eq!(second.version_number, 2);

    let detail = service.get_image(image.id).unwrap();
    assert_eq!(detail.image.status, ReviewStatus::ChangesRequested);
    assert_eq!(detail.image.latest_version, 2);
    let listed: Vec<(u32, Option<&str>)> = detail
        .versions
        .iter()
        .map(|v| (v.version_number, v.note.as_deref()))
        .collect();
    assert_eq!(listed, vec![(2, Some("fix contrast")), (1, Some("looks good"))]);
}

#[test]
fn reapproving_mints_a_new_version() {
    let service = ReviewService::new(Database::open_in_memory().unwrap());
    let image = service.create_image(Access::Granted, "a.png", "a.png").unwrap();

    for expected in 1..=3 {
        let outcome = service
            .transition_status(image.id, ReviewStatus::Approved, None)
            .unwrap();
        assert_eq!(outcome.version_number, expected);
    }
    assert_contiguous_history(service.store(), image.id, 3);
}

#[test]
fn pending_is_not_a_valid_target() {
    let service = ReviewService::new(Database::open_in_memory().unwrap());
    let image = service.create_image(Access::Granted, "a.png", "a.png").unwrap();

    let err = service
        .transition_status(image.id, ReviewStatus::Pending, None)
        .unwrap_err();
    assert!(matches!(err, ReviewError::Validation(_)));
    assert_contiguous_history(service.store(), image.id, 0);
}

#[test]
fn transition_on_unknown_image_is_not_found() {
    let service = ReviewService::new(Database::open_in_memory().unwrap());
    let err = service
        .transition_status(Uuid::new_v4(), ReviewStatus::Approved, None)
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotFound { entity: "image", .. }));
}

#[test]
fn blank_note_is_stored_as_none() {
    let service = ReviewService::new(Database::open_in_memory().unwrap());
    let image = service.create_image(Access::Granted, "a.png", "a.png").unwrap();
    service
        .transition_status(image.id, ReviewStatus::Approved, Some("   "))
        .unwrap();

    let versions = service.store().list_versions(image.id).unwrap();
    assert_eq!(versions[0].note, None);
}

#[test]
fn concurrent_transitions_on_one_image_get_distinct_versions() {
    let (_dir, db) = on_disk();
    let service = Arc::new(ReviewService::new(Arc::clone(&db)));
    let image = service.create_image(Access::Granted, "a.png", "a.png").unwrap();

    let threads = 8;
    let per_thread = 10;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let target = if t % 2 == 0 {
                    ReviewStatus::Approved
                } else {
                    ReviewStatus::ChangesRequested
                };
                (0..per_thread)
                    .map(|_| {
                        service
                            .transition_status(image.id, target, None)
                            .unwrap()
                            .version_number
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut allocated: Vec<u32> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    allocated.sort_unstable();

    let total = threads * per_thread;
    assert_eq!(allocated, (1..=total).collect::<Vec<_>>());
    assert_contiguous_history(&db, image.id, total);
}

#[test]
fn two_racing_first_transitions_allocate_one_and_two() {
    let (_dir, db) = on_disk();
    let service = Arc::new(ReviewService::new(Arc::clone(&db)));
    let image = service.create_image(Access::Granted, "a.png", "a.png").unwrap();

    let barrier = Arc::new(std::sync::Barrier::new(2));
    let handles: Vec<_> = [ReviewStatus::Approved, ReviewStatus::ChangesRequested]
        .into_iter()
        .map(|target| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.transition_status(image.id, target, None).unwrap()
            })
        })
        .collect();

    let mut numbers: Vec<u32> = handles
        .into_iter()
        .map(|h| h.join().unwrap().version_number)
        .collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2]);
    assert_contiguous_history(&db, image.id, 2);
}

#[test]
fn separate_store_handles_on_one_file_stay_contiguous() {
    // Two independent handles on one file behave like two processes: the
    // in-process lock does not cover them, only the store's compare-and-swap.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let left = Arc::new(ReviewService::new(Database::open(&path).unwrap()));
    let right = Arc::new(ReviewService::new(Database::open(&path).unwrap()));
    let image = left.create_image(Access::Granted, "a.png", "a.png").unwrap();

    let handles: Vec<_> = [Arc::clone(&left), Arc::clone(&right)]
        .into_iter()
        .map(|service| {
            thread::spawn(move || {
                for _ in 0..5 {
                    service
                        .transition_status(image.id, ReviewStatus::Approved, None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_contiguous_history(left.store(), image.id, 10);
}

/// Store whose `commit_transition` loses the race a fixed number of times:
/// another writer takes the slot first and the call reports a conflict.
struct RacingStore {
    inner: Database,
    losses: AtomicU32,
    commits: AtomicU32,
    rival_commits: bool,
}

impl RacingStore {
    fn new(losses: u32, rival_commits: bool) -> Self {
        Self {
            inner: Database::open_in_memory().unwrap(),
            losses: AtomicU32::new(losses),
            commits: AtomicU32::new(0),
            rival_commits,
        }
    }
}

impl ReviewStore for RacingStore {
    fn create_image(&self, filename: &str, original_name: &str) -> Result<Image, DbError> {
        self.inner.create_image(filename, original_name)
    }

    fn get_image(&self, id: Uuid) -> Result<Option<Image>, DbError> {
        self.inner.get_image(id)
    }

    fn get_image_detail(&self, id: Uuid) -> Result<Option<ImageDetail>, DbError> {
        self.inner.get_image_detail(id)
    }

    fn list_images(&self) -> Result<Vec<Image>, DbError> {
        self.inner.list_images()
    }

    fn delete_image(&self, id: Uuid) -> Result<Option<Image>, DbError> {
        self.inner.delete_image(id)
    }

    fn insert_annotation(
        &self,
        image_id: Uuid,
        x: f64,
        y: f64,
        comment: &str,
        author: &str,
    ) -> Result<Annotation, DbError> {
        self.inner.insert_annotation(image_id, x, y, comment, author)
    }

    fn list_annotations(&self, image_id: Uuid) -> Result<Vec<Annotation>, DbError> {
        self.inner.list_annotations(image_id)
    }

    fn delete_annotation(&self, id: Uuid) -> Result<bool, DbError> {
        self.inner.delete_annotation(id)
    }

    fn list_versions(&self, image_id: Uuid) -> Result<Vec<Version>, DbError> {
        self.inner.list_versions(image_id)
    }

    fn current_version(&self, image_id: Uuid) -> Result<Option<u32>, DbError> {
        self.inner.current_version(image_id)
    }

    fn commit_transition(
        &self,
        image_id: Uuid,
        expected: u32,
        status: ReviewStatus,
        note: Option<&str>,
    ) -> Result<Version, DbError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        let lost = self
            .losses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            if self.rival_commits {
                self.inner
                    .commit_transition(image_id, expected, ReviewStatus::Approved, Some("rival"))?;
            }
            return Err(DbError::Conflict { image_id, version: expected + 1 });
        }
        self.inner.commit_transition(image_id, expected, status, note)
    }
}

#[test]
fn lost_races_are_retried_from_a_fresh_read() {
    let service = ReviewService::new(RacingStore::new(2, true));
    let image = service.create_image(Access::Granted, "a.png", "a.png").unwrap();

    let outcome = service
        .transition_status(image.id, ReviewStatus::ChangesRequested, Some("mine"))
        .unwrap();
    assert_eq!(outcome.version_number, 3);
    assert_eq!(service.store().commits.load(Ordering::SeqCst), 3);
    assert_contiguous_history(&service.store().inner, image.id, 3);
}

#[test]
fn persistent_conflict_surfaces_after_bounded_retries() {
    let service = ReviewService::new(RacingStore::new(u32::MAX, false));
    let image = service.create_image(Access::Granted, "a.png", "a.png").unwrap();

    let err = service
        .transition_status(image.id, ReviewStatus::Approved, None)
        .unwrap_err();
    assert!(matches!(err, ReviewError::Conflict { version: 1, .. }));
    assert_eq!(
        service.store().commits.load(Ordering::SeqCst),
        MAX_TRANSITION_ATTEMPTS
    );
    assert_contiguous_history(&service.store().inner, image.id, 0);
}
