//! Review state machine.
//!
//! ```text
//!            ┌──────────────┐
//!  upload ──▶│   pending    │
//!            └──────┬───────┘
//!                   │ transition(approved | changes_requested)
//!                   ▼
//!      ┌──────────────────────────┐
//!      │ approved ◀──▶ changes_   │◀─┐ every call, including a repeat of
//!      │               requested  │──┘ the current status, mints a version
//!      └──────────────────────────┘
//! ```
//!
//! There is no transition back to `pending`.

use pinboard_db::DbError;
use pinboard_types::{ReviewStatus, TransitionOutcome};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, ReviewError};
use crate::store::ReviewStore;
use crate::ReviewService;

/// Upper bound on allocation attempts when another writer keeps winning the
/// version slot.
pub const MAX_TRANSITION_ATTEMPTS: u32 = 8;

/// Parse a requested target status. Only `approved` and `changes_requested`
/// are accepted.
pub fn parse_transition_target(raw: &str) -> Result<ReviewStatus> {
    raw.parse::<ReviewStatus>()
        .ok()
        .filter(|status| status.is_transition_target())
        .ok_or_else(|| ReviewError::validation("invalid status"))
}

impl<S: ReviewStore> ReviewService<S> {
    /// Move an image to `target`, appending the next history entry.
    ///
    /// Reads the current version `v`, then commits `v + 1` together with the
    /// image update as one store transaction. Calls on the same image are
    /// serialized in-process; a conflict from another process sharing the
    /// store is retried from the read, at most [`MAX_TRANSITION_ATTEMPTS`]
    /// times.
    pub fn transition_status(
        &self,
        image_id: Uuid,
        target: ReviewStatus,
        note: Option<&str>,
    ) -> Result<TransitionOutcome> {
        if !target.is_transition_target() {
            return Err(ReviewError::validation("invalid status"));
        }
        let note = note.map(str::trim).filter(|n| !n.is_empty());

        self.locks
            .with_lock(image_id, || self.allocate_version(image_id, target, note))
    }

    fn allocate_version(
        &self,
        image_id: Uuid,
        target: ReviewStatus,
        note: Option<&str>,
    ) -> Result<TransitionOutcome> {
        let mut attempt = 1;
        loop {
            let current = self
                .store
                .current_version(image_id)?
                .ok_or(ReviewError::NotFound { entity: "image", id: image_id })?;

            match self.store.commit_transition(image_id, current, target, note) {
                Ok(version) => {
                    info!(
                        "Image {} -> {} (version {})",
                        image_id, version.status, version.version_number
                    );
                    return Ok(TransitionOutcome {
                        status: version.status,
                        version_number: version.version_number,
                    });
                }
                Err(DbError::Conflict { version, .. }) if attempt < MAX_TRANSITION_ATTEMPTS => {
                    warn!(
                        "Version {} of image {} taken concurrently, retrying (attempt {}/{})",
                        version, image_id, attempt, MAX_TRANSITION_ATTEMPTS
                    );
                    attempt += 1;
                    std::thread::yield_now();
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_review_outcomes_are_targets() {
        assert_eq!(parse_transition_target("approved").unwrap(), ReviewStatus::Approved);
        assert_eq!(
            parse_transition_target("changes_requested").unwrap(),
            ReviewStatus::ChangesRequested
        );

        for raw in ["pending", "rejected", "", "APPROVED"] {
            let err = parse_transition_target(raw).unwrap_err();
            assert!(
                matches!(&err, ReviewError::Validation(msg) if msg == "invalid status"),
                "{raw:?} gave {err:?}"
            );
        }
    }
}
