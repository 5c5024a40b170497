/// Building a track list from files and directories
use crate::error::{CliError, Result};
use harbor_core::{Track, TrackId};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect playable files under `paths`
///
/// Files are taken as given (if their extension matches); directories are
/// walked recursively. The result is sorted by path with duplicates removed.
/// Durations stay unknown and are learned from the media on load.
pub fn scan(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<Track>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_playable(path, extensions) {
                files.push(path.clone());
            } else {
                tracing::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry.map_err(|e| CliError::Library(e.to_string()))?;
                if entry.file_type().is_file() && is_playable(entry.path(), extensions) {
                    files.push(entry.into_path());
                }
            }
        } else {
            return Err(CliError::Library(format!(
                "no such file or directory: {}",
                path.display()
            )));
        }
    }

    files.sort();
    files.dedup();
    tracing::info!("Found {} tracks", files.len());

    Ok(files.iter().map(|path| track_for(path)).collect())
}

/// Track for a file, titled after its stem
pub fn track_for(path: &Path) -> Track {
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let artist = path
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown Artist".to_string());

    Track::new(TrackId::generate(), title, artist, path)
}

fn is_playable(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
