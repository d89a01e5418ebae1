//! Review workflow and annotation core.
//!
//! [`ReviewService`] owns the rules tying images, pins and status history
//! together. It runs against any [`ReviewStore`]; the SQLite
//! [`pinboard_db::Database`] is the production store.

pub mod access;
pub mod annotations;
pub mod error;
pub mod images;
pub mod store;
pub mod workflow;

mod locks;

pub use access::Access;
pub use error::{Result, ReviewError};
pub use store::ReviewStore;
pub use workflow::{MAX_TRANSITION_ATTEMPTS, parse_transition_target};

use locks::ImageLocks;

pub struct ReviewService<S> {
    store: S,
    locks: ImageLocks,
}

impl<S: ReviewStore> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: ImageLocks::default(),
        }
    }

    /// Direct store access for inspecting persisted state in tests. Writes
    /// through it skip the per-image lock and the transition rules.
    #[cfg(any(test, feature = "testing"))]
    pub fn store(&self) -> &S {
        &self.store
    }
}
