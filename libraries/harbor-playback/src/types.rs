//! Core types for playback management

use harbor_artwork::ArtworkConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    /// No session open
    Idle,

    /// Host is opening the media
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Reached end of media on its own
    Ended,

    /// Last load attempt failed
    Failed,
}

impl TransportState {
    /// Whether a session is open and seekable
    pub fn has_session(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Queue navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Towards the end, wrapping to the first entry
    Next,

    /// Towards the start, wrapping to the last entry
    Previous,
}

/// Published playback progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Position in the current track
    pub elapsed: Duration,

    /// Time left until the end of the track
    pub remaining: Duration,

    /// `elapsed / duration`, clamped to [0, 1]; 0 when the duration is unknown
    pub fraction: f32,
}

impl Progress {
    /// Progress at `elapsed` into a track of length `duration`
    pub fn at(elapsed: Duration, duration: Duration) -> Self {
        let elapsed = elapsed.min(duration);
        let fraction = if duration.is_zero() {
            0.0
        } else {
            (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0) as f32
        };

        Self {
            elapsed,
            remaining: duration.saturating_sub(elapsed),
            fraction,
        }
    }

    /// Progress at the very start of a track
    pub fn start_of(duration: Duration) -> Self {
        Self::at(Duration::ZERO, duration)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::start_of(Duration::ZERO)
    }
}

/// Format a position as `m:ss`
pub fn format_clock(position: Duration) -> String {
    let secs = position.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Shortest allowed progress sampling interval
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// Longest allowed progress sampling interval
pub const MAX_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Progress sampling interval in milliseconds (default: 200)
    pub sample_interval_ms: u64,

    /// Initial linear volume, 0.0-1.0 (default: 0.7)
    pub initial_volume: f32,

    /// Artwork and backdrop settings
    pub artwork: ArtworkConfig,
}

impl PlaybackConfig {
    /// Sampling interval, clamped to the supported range
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
            .clamp(MIN_SAMPLE_INTERVAL, MAX_SAMPLE_INTERVAL)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 200,
            initial_volume: 0.7,
            artwork: ArtworkConfig::default(),
        }
    }
}
