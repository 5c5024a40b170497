//! CpalHost against real files
//!
//! Tests that need an output device return early on headless machines.

use crossbeam_channel::Receiver;
use harbor_audio_desktop::CpalHost;
use harbor_playback::{AudioHost, CompletionNotifier, CompletionSignal, HostError};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn write_tone(dir: &TempDir, millis: u32) -> PathBuf {
    let path = dir.path().join("tone.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(44_100 * millis / 1000) {
        let value = ((i as f32 / 10.0).sin() * 1000.0) as i16;
        writer.write_sample(value).unwrap();
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn notifier() -> (CompletionNotifier, Receiver<CompletionSignal>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (CompletionNotifier::new(1, tx), rx)
}

#[test]
fn unsupported_file_is_rejected_before_touching_device() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.bin");
    std::fs::write(&path, [0u8; 64]).unwrap();

    let (on_complete, _rx) = notifier();
    let err = CpalHost::new().open(&path, on_complete).err().unwrap();
    assert!(matches!(err, HostError::UnsupportedFormat(_)), "{err:?}");
}

#[test]
fn missing_file_is_io_error() {
    let (on_complete, _rx) = notifier();
    let err = CpalHost::new()
        .open(std::path::Path::new("/no/such/file.flac"), on_complete)
        .err()
        .unwrap();
    assert!(matches!(err, HostError::Io(_)));
}

#[test]
fn session_reports_length_and_seeks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tone(&dir, 500);

    let (on_complete, _rx) = notifier();
    let mut session = match CpalHost::new().open(&path, on_complete) {
        Ok(session) => session,
        Err(HostError::Device(_)) => return, // No audio device
        Err(e) => panic!("Unexpected error: {e}"),
    };

    let length = session.length().unwrap();
    assert!(length >= Duration::from_millis(490), "{length:?}");
    assert_eq!(session.position(), Duration::ZERO);

    session.set_position(Duration::from_millis(250)).unwrap();
    let position = session.position();
    assert!(position >= Duration::from_millis(240) && position <= Duration::from_millis(260));

    session.set_gain_db(-80.0).unwrap();
    session.close();
}

#[test]
fn short_track_reports_completion_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tone(&dir, 100);

    let (on_complete, rx) = notifier();
    let mut session = match CpalHost::new().open(&path, on_complete) {
        Ok(session) => session,
        Err(HostError::Device(_)) => return, // No audio device
        Err(e) => panic!("Unexpected error: {e}"),
    };

    session.set_gain_db(-80.0).unwrap();
    if session.start().is_err() {
        return; // Device refused to start (CI sandbox)
    }

    if let Ok(signal) = rx.recv_timeout(Duration::from_secs(3)) {
        assert_eq!(signal.generation, 1);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
    session.close();
}
