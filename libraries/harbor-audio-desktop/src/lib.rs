//! Desktop audio host using CPAL
//!
//! This crate provides [`CpalHost`], the `harbor_playback::AudioHost`
//! implementation for desktop playback.
//!
//! # Features
//!
//! - Decoding of every format Symphonia ships (MP3, FLAC, OGG, WAV, AAC, ...)
//! - Automatic sample rate conversion to the device rate (rubato)
//! - Gain control mapped onto a -80 dB to +6 dB range
//! - End-of-media reported from the audio callback, never from stop/close
//!
//! # Example
//!
//! ```no_run
//! use harbor_audio_desktop::CpalHost;
//! use harbor_playback::{PlaybackConfig, PlaybackEngine};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = PlaybackEngine::new(Arc::new(CpalHost::new()), None, PlaybackConfig::default())?;
//! engine.set_volume(0.5);
//! # Ok(())
//! # }
//! ```

mod decode;
mod error;
mod host;
mod output;

pub use decode::{decode_file, resample, DecodedAudio};
pub use error::{AudioError, Result};
pub use host::{CpalHost, CpalSession, MAX_GAIN_DB, MIN_GAIN_DB};
