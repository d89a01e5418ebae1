use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use uuid::Uuid;

/// Per-image mutual exclusion for version allocation.
///
/// Transitions on one image queue behind each other; different images get
/// different locks. Entries are dropped once nobody holds or waits on them.
#[derive(Default)]
pub(crate) struct ImageLocks {
    slots: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ImageLocks {
    /// Run `f` while holding the lock for `image_id`.
    pub(crate) fn with_lock<T>(&self, image_id: Uuid, f: impl FnOnce() -> T) -> T {
        // The map shard must not stay locked while `f` runs.
        let slot = self.slots.entry(image_id).or_default().clone();

        let result = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        drop(slot);
        self.slots
            .remove_if(&image_id, |_, held| Arc::strong_count(held) == 1);

        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_image_runs_one_at_a_time() {
        let locks = Arc::new(ImageLocks::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let image = Uuid::new_v4();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    locks.with_lock(image, || {
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn different_images_do_not_block() {
        let locks = ImageLocks::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        // Re-entering with another id while holding the first must not deadlock.
        let value = locks.with_lock(a, || locks.with_lock(b, || 7));
        assert_eq!(value, 7);
        assert_eq!(locks.len(), 0);
    }
}
