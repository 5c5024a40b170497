//! Catalog contract
//!
//! The catalog owns library metadata, favorites and play history. Playback
//! only reaches it through request/response calls on this trait; it never
//! stores anything itself.

use crate::error::{CoreError, Result};
use crate::types::{Track, TrackId};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Request/response access to the library service
pub trait Catalog: Send + Sync {
    /// Look up a track by id
    fn track(&self, id: &TrackId) -> Result<Option<Track>>;

    /// Whether the track is marked as favorite
    fn is_favorite(&self, id: &TrackId) -> Result<bool>;

    /// Mark or unmark the track as favorite
    fn set_favorite(&self, id: &TrackId, favorite: bool) -> Result<()>;

    /// Report that playback of a track started
    fn record_play(&self, id: &TrackId) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    tracks: HashMap<TrackId, Track>,
    order: Vec<TrackId>,
    favorites: HashSet<TrackId>,
    recent: Vec<TrackId>,
}

/// In-process catalog
///
/// Keeps tracks in insertion order. Used by the command-line player and by
/// tests; a desktop frontend would talk to the real service instead.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<MemoryState>,
}

/// Most recent plays kept by [`MemoryCatalog`]
const RECENT_LIMIT: usize = 20;

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding `tracks`
    pub fn with_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let catalog = Self::new();
        for track in tracks {
            catalog.insert(track);
        }
        catalog
    }

    /// Insert or replace a track
    pub fn insert(&self, track: Track) {
        let mut state = self.lock();
        if !state.tracks.contains_key(&track.id) {
            state.order.push(track.id.clone());
        }
        state.tracks.insert(track.id.clone(), track);
    }

    /// All tracks in insertion order
    pub fn all(&self) -> Vec<Track> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|id| state.tracks.get(id).cloned())
            .collect()
    }

    /// Recently played track ids, newest first
    pub fn recent(&self) -> Vec<TrackId> {
        self.lock().recent.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned catalog still holds consistent maps; keep serving them.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Catalog for MemoryCatalog {
    fn track(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(self.lock().tracks.get(id).cloned())
    }

    fn is_favorite(&self, id: &TrackId) -> Result<bool> {
        Ok(self.lock().favorites.contains(id))
    }

    fn set_favorite(&self, id: &TrackId, favorite: bool) -> Result<()> {
        let mut state = self.lock();
        if !state.tracks.contains_key(id) {
            return Err(CoreError::not_found("Track", id.as_str()));
        }
        if favorite {
            state.favorites.insert(id.clone());
        } else {
            state.favorites.remove(id);
        }
        Ok(())
    }

    fn record_play(&self, id: &TrackId) -> Result<()> {
        let mut state = self.lock();
        state.recent.retain(|existing| existing != id);
        state.recent.insert(0, id.clone());
        state.recent.truncate(RECENT_LIMIT);
        Ok(())
    }
}
