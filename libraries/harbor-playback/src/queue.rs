//! Circular playback queue
//!
//! An ordered snapshot of tracks plus a cursor. The snapshot is replaced
//! wholesale by each new play-intent; reordering means building a new
//! snapshot, never editing entries in place.

use crate::types::Direction;
use harbor_core::{Track, TrackId};

/// Ordered track list with a wrapping cursor
///
/// Invariant: `index < tracks.len()` whenever the queue is non-empty.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    tracks: Vec<Track>,
    index: usize,
}

impl PlaybackQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue
    ///
    /// `start_index` is clamped into range; an empty list empties the queue.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.index = start_index.min(tracks.len().saturating_sub(1));
        self.tracks = tracks;
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    /// Move the cursor one step with wraparound and return the new current track
    pub fn advance(&mut self, direction: Direction) -> Option<&Track> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        self.index = match direction {
            Direction::Next => (self.index + 1) % len,
            Direction::Previous => (self.index + len - 1) % len,
        };
        self.current()
    }

    /// Move the cursor to `index` without touching the order
    ///
    /// Returns `None` (cursor unchanged) when out of range.
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.index = index;
        self.current()
    }

    /// Position of a track in the queue
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// Cursor position (0 when empty)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Read-only view of the snapshot
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(i.to_string(), format!("Track {i}"), "Artist", format!("/music/{i}.wav")))
            .collect()
    }

    fn current_id(queue: &PlaybackQueue) -> String {
        queue.current().unwrap().id.to_string()
    }

    #[test]
    fn next_wraps_to_start() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(tracks(5), 2);

        let mut seen = vec![current_id(&queue)];
        for _ in 0..5 {
            seen.push(queue.advance(Direction::Next).unwrap().id.to_string());
        }
        assert_eq!(seen, vec!["2", "3", "4", "0", "1", "2"]);
    }

    #[test]
    fn previous_wraps_to_end() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(tracks(5), 0);
        assert_eq!(queue.advance(Direction::Previous).unwrap().id.as_str(), "4");
        assert_eq!(queue.index(), 4);
    }

    #[test]
    fn start_index_is_clamped() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(tracks(3), 99);
        assert_eq!(current_id(&queue), "2");
    }

    #[test]
    fn empty_queue_has_no_current() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(Vec::new(), 4);
        assert!(queue.is_empty());
        assert!(queue.current().is_none());
        assert!(queue.advance(Direction::Next).is_none());
        assert!(queue.advance(Direction::Previous).is_none());
        assert_eq!(queue.index(), 0);
    }

    #[test]
    fn single_track_wraps_onto_itself() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(tracks(1), 0);
        assert_eq!(queue.advance(Direction::Next).unwrap().id.as_str(), "0");
        assert_eq!(queue.advance(Direction::Previous).unwrap().id.as_str(), "0");
    }

    #[test]
    fn set_queue_replaces_wholesale() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(tracks(5), 4);
        queue.set_queue(tracks(2), 1);
        assert_eq!(queue.len(), 2);
        assert_eq!(current_id(&queue), "1");
    }

    #[test]
    fn select_moves_cursor_only_in_range() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(tracks(3), 0);
        assert!(queue.select(7).is_none());
        assert_eq!(queue.index(), 0);
        assert_eq!(queue.select(2).unwrap().id.as_str(), "2");
    }

    #[test]
    fn position_of_finds_track() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(tracks(3), 0);
        assert_eq!(queue.position_of(&"1".into()), Some(1));
        assert_eq!(queue.position_of(&"x".into()), None);
    }
}
