//! Harbor - Playback Core
//!
//! Platform-agnostic playback control for Harbor.
//!
//! This crate provides:
//! - Logarithmic volume mapping (linear slider to device dB) and mute
//! - A circular playback queue with auto-advance on natural completion
//! - A transport state machine owning exactly one audio session
//! - A cancellable progress sampler decoupled from the audio path
//! - The [`PlaybackEngine`] facade with artwork backdrops and events
//!
//! # Architecture
//!
//! `harbor-playback` never touches an audio device:
//! - No dependency on CPAL (that lives in `harbor-audio-desktop`)
//! - No dependency on any UI toolkit
//! - Favorites and recent plays go through the [`Catalog`] trait
//!
//! Platform code implements [`AudioHost`] / [`AudioSession`] and reports
//! end-of-media through the [`CompletionNotifier`] it is handed on open.
//!
//! # Example
//!
//! ```rust,no_run
//! use harbor_playback::{AudioHost, PlaybackConfig, PlaybackEngine, PlaybackEvent};
//! use harbor_core::Track;
//! use std::sync::Arc;
//!
//! # fn run(host: Arc<dyn AudioHost>) -> harbor_playback::Result<()> {
//! let engine = PlaybackEngine::new(host, None, PlaybackConfig::default())?;
//! let events = engine.subscribe();
//!
//! engine.play_queue(
//!     vec![
//!         Track::new("a", "Intro", "Artist", "/music/a.wav"),
//!         Track::new("b", "Outro", "Artist", "/music/b.wav"),
//!     ],
//!     0,
//! )?;
//!
//! engine.set_volume(0.5);
//! engine.seek(42.0)?;
//!
//! while let Ok(event) = events.recv() {
//!     if let PlaybackEvent::ProgressUpdated { progress } = event {
//!         println!("{:.0}%", progress.fraction * 100.0);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
pub mod events;
pub mod host;
mod queue;
mod sampler;
pub mod transport;
pub mod types;
mod volume;

// Public exports
pub use engine::{PlaybackEngine, RESTART_THRESHOLD};
pub use error::{PlaybackError, Result};
pub use events::{EventBus, PlaybackEvent};
pub use host::{
    AudioHost, AudioSession, CompletionNotifier, CompletionSignal, GainRange, HostError,
    HostResult,
};
pub use queue::PlaybackQueue;
pub use sampler::ProgressSampler;
pub use transport::{PositionSource, TransportController, TransportSnapshot};
pub use types::{
    format_clock, Direction, PlaybackConfig, Progress, TransportState, MAX_SAMPLE_INTERVAL,
    MIN_SAMPLE_INTERVAL,
};
pub use volume::{db_to_amplitude, gain_db, LevelBand, Volume, DEFAULT_LEVEL};

pub use harbor_core::{Catalog, Track, TrackId};
