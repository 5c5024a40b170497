//! Harbor Artwork - album art lookup and backdrop generation
//!
//! Turns a track's cover image into a soft, low-resolution backdrop that a
//! player screen can stretch behind its controls.
//!
//! # Features
//!
//! - Cover lookup (explicit path, sibling image of the audio file, search dirs)
//! - Downscale + repeated box blur ([`BlurPipeline`])
//! - LRU caching per track, so a backdrop is never recomputed per frame
//! - Background worker so decoding and blurring stay off the caller's thread
//!
//! Missing or undecodable artwork is not an error for playback: the result is
//! simply a [`Backdrop`] without images.
//!
//! # Example
//!
//! ```
//! use harbor_artwork::BlurPipeline;
//! use image::{Rgba, RgbaImage};
//!
//! let cover = RgbaImage::from_pixel(400, 400, Rgba([200, 40, 40, 255]));
//! let backdrop = BlurPipeline::default().process(Some(&cover)).unwrap();
//! assert_eq!(backdrop.dimensions(), (100, 100));
//! ```

mod blur;
mod cache;
mod error;
mod locate;
mod types;
mod worker;

// Re-export public API
pub use blur::{box_blur, BlurPipeline};
pub use cache::BackdropCache;
pub use error::{ArtworkError, Result};
pub use locate::{find_artwork, ARTWORK_EXTENSIONS};
pub use types::{ArtworkConfig, Backdrop};
pub use worker::{load_backdrop, BackdropWorker};

pub use image::RgbaImage;
