//! Harbor CLI - terminal music player
//!
//! Thin shell around [`harbor_playback::PlaybackEngine`]: scans files into a
//! queue, plays them through the desktop audio host and reads commands
//! from stdin.

pub mod command;
pub mod config;
pub mod error;
pub mod library;
pub mod player;

pub use command::Command;
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use player::{describe, execute, status_line, Flow};
