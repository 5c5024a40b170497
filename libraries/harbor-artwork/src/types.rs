use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Artwork for one track: the decoded cover and its blurred backdrop
///
/// Both are `None` when the track has no usable cover.
#[derive(Debug, Clone, Default)]
pub struct Backdrop {
    /// Decoded cover at its original resolution
    pub original: Option<Arc<RgbaImage>>,
    /// Small blurred wash derived from the cover
    pub blurred: Option<Arc<RgbaImage>>,
}

impl Backdrop {
    /// Backdrop for a track without artwork
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether a cover was found and decoded
    pub fn has_artwork(&self) -> bool {
        self.original.is_some()
    }
}

/// Artwork settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkConfig {
    /// Backdrop width in pixels (height follows the aspect ratio)
    pub backdrop_width: u32,

    /// Box blur radius in pixels
    pub blur_radius: u32,

    /// Number of box blur passes
    pub blur_passes: u32,

    /// Number of track backdrops kept in memory
    pub cache_size: usize,

    /// Extra directories searched for `<stem>.<ext>` covers
    pub search_dirs: Vec<PathBuf>,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            backdrop_width: 100,
            blur_radius: 8,
            blur_passes: 6,
            cache_size: 32,
            search_dirs: Vec::new(),
        }
    }
}
