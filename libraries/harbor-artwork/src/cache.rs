use crate::types::Backdrop;
use harbor_core::TrackId;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-track backdrop cache
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct BackdropCache {
    entries: Arc<Mutex<LruCache<TrackId, Arc<Backdrop>>>>,
}

impl BackdropCache {
    /// Create a cache holding at most `capacity` backdrops (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Cached backdrop for a track
    pub fn get(&self, id: &TrackId) -> Option<Arc<Backdrop>> {
        self.lock().get(id).cloned()
    }

    /// Store a backdrop
    pub fn put(&self, id: TrackId, backdrop: Arc<Backdrop>) {
        self.lock().put(id, backdrop);
    }

    /// Number of cached backdrops
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<TrackId, Arc<Backdrop>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
