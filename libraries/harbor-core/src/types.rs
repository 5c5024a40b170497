//! Domain types for Harbor
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Track identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random track ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Audio track as handed out by the catalog
///
/// Immutable value; whoever builds a queue owns its tracks.
/// A zero `duration` means the catalog had no usable length and the
/// transport should take it from the opened media instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Genre
    pub genre: Option<String>,

    /// Catalog-supplied duration (zero when unknown)
    #[serde(default)]
    pub duration: Duration,

    /// Audio file on disk
    pub media_path: PathBuf,

    /// Cover image on disk
    pub artwork_path: Option<PathBuf>,
}

impl Track {
    /// Create a track with an unknown duration and no artwork
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        media_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            genre: None,
            duration: Duration::ZERO,
            media_path: media_path.into(),
            artwork_path: None,
        }
    }

    /// Set the catalog duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the catalog duration from whole seconds
    ///
    /// Catalog rows store signed seconds; anything non-positive is "unknown".
    #[must_use]
    pub fn with_duration_secs(self, seconds: i64) -> Self {
        let secs = u64::try_from(seconds).unwrap_or(0);
        self.with_duration(Duration::from_secs(secs))
    }

    /// Set the artwork path
    #[must_use]
    pub fn with_artwork(mut self, path: impl Into<PathBuf>) -> Self {
        self.artwork_path = Some(path.into());
        self
    }

    /// Set the genre
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Catalog duration, if the catalog supplied a positive one
    pub fn known_duration(&self) -> Option<Duration> {
        (!self.duration.is_zero()).then_some(self.duration)
    }

    /// Audio file path
    pub fn media_path(&self) -> &Path {
        &self.media_path
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
