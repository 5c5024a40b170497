//! Cover image lookup

use harbor_core::Track;
use std::path::{Path, PathBuf};

/// Image extensions tried when looking for a cover next to an audio file
pub const ARTWORK_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Find the cover image for `track`
///
/// Lookup order:
/// 1. The track's own `artwork_path`, if it exists
/// 2. `<stem>.<ext>` next to the audio file
/// 3. `<stem>.<ext>` in each of `search_dirs`
pub fn find_artwork(track: &Track, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    if let Some(path) = track.artwork_path.as_ref().filter(|p| p.is_file()) {
        return Some(path.clone());
    }

    let stem = track.media_path.file_stem()?;
    let siblings = track.media_path.parent().filter(|p| !p.as_os_str().is_empty());

    siblings
        .into_iter()
        .chain(search_dirs.iter().map(PathBuf::as_path))
        .find_map(|dir| probe_dir(dir, stem))
}

fn probe_dir(dir: &Path, stem: &std::ffi::OsStr) -> Option<PathBuf> {
    ARTWORK_EXTENSIONS.iter().find_map(|ext| {
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(ext);
        let candidate = dir.join(name);
        candidate.is_file().then_some(candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn explicit_path_wins() {
        let dir = tempdir().unwrap();
        let cover = dir.path().join("cover.png");
        fs::write(&cover, b"x").unwrap();
        fs::write(dir.path().join("song.jpg"), b"x").unwrap();

        let track = Track::new("1", "Song", "Artist", dir.path().join("song.wav"))
            .with_artwork(&cover);
        assert_eq!(find_artwork(&track, &[]), Some(cover));
    }

    #[test]
    fn missing_explicit_path_falls_back_to_sibling() {
        let dir = tempdir().unwrap();
        let sibling = dir.path().join("song.jpeg");
        fs::write(&sibling, b"x").unwrap();

        let track = Track::new("1", "Song", "Artist", dir.path().join("song.wav"))
            .with_artwork(dir.path().join("gone.png"));
        assert_eq!(find_artwork(&track, &[]), Some(sibling));
    }

    #[test]
    fn extensions_are_tried_in_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("song.webp"), b"x").unwrap();
        fs::write(dir.path().join("song.png"), b"x").unwrap();

        let track = Track::new("1", "Song", "Artist", dir.path().join("song.wav"));
        assert_eq!(find_artwork(&track, &[]), Some(dir.path().join("song.png")));
    }

    #[test]
    fn search_dirs_are_consulted_last() {
        let music = tempdir().unwrap();
        let covers = tempdir().unwrap();
        let cover = covers.path().join("song.jpg");
        fs::write(&cover, b"x").unwrap();

        let track = Track::new("1", "Song", "Artist", music.path().join("song.wav"));
        assert_eq!(
            find_artwork(&track, &[covers.path().to_path_buf()]),
            Some(cover)
        );
    }

    #[test]
    fn nothing_found() {
        let dir = tempdir().unwrap();
        let track = Track::new("1", "Song", "Artist", dir.path().join("song.wav"));
        assert_eq!(find_artwork(&track, &[dir.path().to_path_buf()]), None);
    }
}
