//! Error types for playback management

use crate::host::HostError;
use crate::types::TransportState;
use harbor_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The host cannot decode this media
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Media path does not resolve to a file
    #[error("Audio file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Transient open/read failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output device unavailable or misbehaving
    #[error("Audio device error: {0}")]
    Device(String),

    /// Operation not allowed in the current transport state
    #[error("Cannot {action} while {state:?}")]
    InvalidState {
        /// What was attempted
        action: &'static str,
        /// State the transport was in
        state: TransportState,
    },

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Track id unknown to the catalog
    #[error("Track not found: {0}")]
    NotFound(String),

    /// Catalog request failed
    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl PlaybackError {
    /// Whether this error left the transport in `Failed`
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_) | Self::MissingFile(_) | Self::Io(_) | Self::Device(_)
        )
    }
}

impl From<HostError> for PlaybackError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::UnsupportedFormat(msg) => Self::UnsupportedFormat(msg),
            HostError::MissingFile(path) => Self::MissingFile(path),
            HostError::Io(e) => Self::Io(e),
            HostError::Device(msg) => Self::Device(msg),
        }
    }
}

impl From<CoreError> for PlaybackError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { id, .. } => Self::NotFound(id),
            other => Self::Catalog(other.to_string()),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
