//! Host audio contract
//!
//! Abstracts the platform's audio subsystem (CPAL + Symphonia on desktop,
//! scripted fakes in tests). The transport only ever talks to these traits.

use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a host audio subsystem
#[derive(Debug, Error)]
pub enum HostError {
    /// Media cannot be decoded by this host
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Path does not exist
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Read or open failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output device problem
    #[error("Device error: {0}")]
    Device(String),
}

/// Result type for host operations
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Native gain control range of a session, in dB
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRange {
    /// Quietest setting
    pub min_db: f32,
    /// Loudest setting
    pub max_db: f32,
}

/// End-of-media signal tagged with the session it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSignal {
    /// Generation of the session that finished
    pub generation: u64,
}

/// One-shot end-of-media notification handed to a session at open
///
/// Hosts call [`notify`](Self::notify) from whatever thread observes the
/// end of the media (often the real-time audio callback). Sending never
/// blocks, and only the first call per session is delivered.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    generation: u64,
    tx: Sender<CompletionSignal>,
    fired: Arc<AtomicBool>,
}

impl CompletionNotifier {
    /// Create a notifier for session `generation`
    pub fn new(generation: u64, tx: Sender<CompletionSignal>) -> Self {
        Self {
            generation,
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Session generation this notifier reports for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report natural end of media
    pub fn notify(&self) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        // Receiver gone means the engine shut down; nothing left to tell.
        let _ = self.tx.send(CompletionSignal {
            generation: self.generation,
        });
    }

    /// Whether the notification was already sent
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// An open media file bound to the output device
///
/// Created paused. `stop` halts output but keeps the position; `close`
/// releases the device and the decoded media.
pub trait AudioSession: Send {
    /// Start or continue output
    fn start(&mut self) -> HostResult<()>;

    /// Halt output, keeping the position
    fn stop(&mut self) -> HostResult<()>;

    /// Release the session; no completion may be reported afterwards
    fn close(&mut self);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Move the playback position
    fn set_position(&mut self, position: Duration) -> HostResult<()>;

    /// Media length, once the host knows it
    fn length(&self) -> Option<Duration>;

    /// Native gain control, if the session offers one
    fn gain_range(&self) -> Option<GainRange> {
        None
    }

    /// Apply a gain in dB within [`gain_range`](Self::gain_range)
    fn set_gain_db(&mut self, db: f32) -> HostResult<()> {
        let _ = db;
        Ok(())
    }
}

/// Platform audio subsystem
pub trait AudioHost: Send + Sync {
    /// Open `path` as a new paused session
    ///
    /// `on_complete` must be fired once when playback reaches the end of the
    /// media on its own, and never because of `stop` or `close`.
    fn open(&self, path: &Path, on_complete: CompletionNotifier)
        -> HostResult<Box<dyn AudioSession>>;
}
