//! Playback Events
//!
//! Event-based communication for UI synchronization. Events are emitted at
//! key points:
//! - State changes (load/play/pause/stop/end/failure)
//! - Track changes and duration discovery
//! - Position updates (from the progress sampler)
//! - Artwork readiness, volume, favorites
//! - Errors, as displayable messages

use crate::types::{Progress, TransportState};
use crossbeam_channel::{unbounded, Receiver, Sender};
use harbor_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Transport state changed
    StateChanged {
        /// The new transport state
        state: TransportState,
    },

    /// A new track was loaded
    TrackChanged {
        /// The track now bound to the transport
        track: Track,
    },

    /// Track length learned from the media (catalog had none)
    DurationResolved {
        /// Track the duration belongs to
        track_id: TrackId,
        /// Length reported by the host
        duration: Duration,
    },

    /// Position update (periodic while playing, and after seeks/resets)
    ProgressUpdated {
        /// Current progress
        progress: Progress,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Backdrop for the current track is available
    ArtworkReady {
        /// Track the artwork belongs to
        track_id: TrackId,
        /// Whether a cover was found at all
        has_artwork: bool,
    },

    /// Volume changed
    VolumeChanged {
        /// Linear slider level (0.0-1.0)
        level: f32,
        /// Whether audio is muted
        muted: bool,
    },

    /// Queue was replaced
    QueueChanged {
        /// New queue length
        length: usize,
        /// Cursor position
        index: usize,
    },

    /// Favorite flag of a track changed
    FavoriteChanged {
        /// Track whose flag changed
        track_id: TrackId,
        /// New flag
        favorite: bool,
    },

    /// Error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}

/// Fan-out of playback events to any number of subscribers
///
/// Emitting never blocks; subscribers whose receiver was dropped are pruned.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<PlaybackEvent>>>,
}

impl EventBus {
    /// Create a bus without subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    /// Deliver an event to all live subscribers
    pub fn emit(&self, event: PlaybackEvent) {
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<PlaybackEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
