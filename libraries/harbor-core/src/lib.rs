//! Harbor Core
//!
//! Platform-agnostic domain types shared by every Harbor crate.
//!
//! This crate defines:
//! - **Domain Types**: [`Track`] and [`TrackId`]
//! - **Catalog Contract**: the [`Catalog`] trait through which playback talks
//!   to the library/favorites service, plus an in-process [`MemoryCatalog`]
//! - **Error Handling**: [`CoreError`] and the crate [`Result`] alias
//!
//! # Example
//!
//! ```rust
//! use harbor_core::{Catalog, MemoryCatalog, Track, TrackId};
//! use std::time::Duration;
//!
//! let track = Track::new("a", "Intro", "Artist", "/music/intro.wav")
//!     .with_duration(Duration::from_secs(30));
//!
//! let catalog = MemoryCatalog::new();
//! catalog.insert(track.clone());
//!
//! assert_eq!(catalog.track(&TrackId::new("a")).unwrap(), Some(track));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{Catalog, MemoryCatalog};
pub use error::{CoreError, Result};
pub use types::{Track, TrackId};
