//! Command handling against an engine whose host rejects everything

use harbor_cli::{execute, status_line, Command, Flow};
use harbor_playback::{
    AudioHost, AudioSession, CompletionNotifier, HostError, HostResult, PlaybackConfig,
    PlaybackEngine, Track, TransportState,
};
use std::path::Path;
use std::sync::Arc;

struct NoAudio;

impl AudioHost for NoAudio {
    fn open(&self, path: &Path, _: CompletionNotifier) -> HostResult<Box<dyn AudioSession>> {
        Err(HostError::UnsupportedFormat(path.display().to_string()))
    }
}

fn engine() -> PlaybackEngine {
    PlaybackEngine::new(Arc::new(NoAudio), None, PlaybackConfig::default()).unwrap()
}

#[test]
fn idle_status_and_help() {
    let engine = engine();
    assert_eq!(status_line(&engine), "nothing loaded");

    let (flow, output) = execute(&engine, Command::Help).unwrap();
    assert_eq!(flow, Flow::Continue);
    assert!(output.unwrap().contains("seek"));
}

#[test]
fn quit_stops_the_loop() {
    let engine = engine();
    let (flow, output) = execute(&engine, Command::Quit).unwrap();
    assert_eq!(flow, Flow::Quit);
    assert!(output.is_none());
}

#[test]
fn volume_is_given_in_percent() {
    let engine = engine();
    execute(&engine, Command::Volume(40.0)).unwrap();
    assert!((engine.volume().level() - 0.4).abs() < 1e-6);
}

#[test]
fn jump_past_the_queue_is_reported() {
    let engine = engine();
    let (_, output) = execute(&engine, Command::Jump(3)).unwrap();
    assert_eq!(output.as_deref(), Some("queue has 0 entries"));
}

#[test]
fn jump_to_entry_zero_is_reported() {
    let engine = engine();
    let (flow, output) = execute(&engine, Command::Jump(0)).unwrap();
    assert_eq!(flow, Flow::Continue);
    assert_eq!(output.as_deref(), Some("queue has 0 entries"));
}

#[test]
fn unplayable_track_surfaces_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.flac");
    std::fs::write(&path, b"not audio").unwrap();

    let engine = engine();
    let result = engine.load_and_play(Track::new("x", "Broken", "Band", &path));
    assert!(result.is_err());
    assert_eq!(engine.state(), TransportState::Failed);
    assert!(execute(&engine, Command::Seek(10.0)).is_err());
}
