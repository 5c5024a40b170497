use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading artwork
#[derive(Debug, Error)]
pub enum ArtworkError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be decoded
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
}

/// Result type for artwork operations
pub type Result<T> = std::result::Result<T, ArtworkError>;
