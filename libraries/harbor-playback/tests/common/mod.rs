//! Shared fixtures: a scripted audio host and a temp-dir music library
#![allow(dead_code)]

use harbor_core::Track;
use harbor_playback::{
    AudioHost, AudioSession, CompletionNotifier, GainRange, HostError, HostResult,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// How the fake host treats a path
#[derive(Debug, Clone, Copy)]
pub enum Media {
    /// Opens fine; reports `length` (None = host doesn't know)
    Playable(Option<Duration>),
    /// Open fails with UnsupportedFormat
    Unsupported,
    /// Open fails with an IO error
    Broken,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub position: Duration,
    pub playing: bool,
    pub closed: bool,
    pub gain_db: Option<f32>,
}

/// One session opened by [`FakeHost`], observable from the test
pub struct SessionHandle {
    pub path: PathBuf,
    pub length: Option<Duration>,
    pub state: Mutex<SessionState>,
    notifier: CompletionNotifier,
}

impl SessionHandle {
    pub fn position(&self) -> Duration {
        self.state.lock().unwrap().position
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn gain_db(&self) -> Option<f32> {
        self.state.lock().unwrap().gain_db
    }

    pub fn generation(&self) -> u64 {
        self.notifier.generation()
    }

    /// Fire the completion notifier regardless of state
    pub fn fire_completion(&self) {
        self.notifier.notify();
    }
}

struct FakeSession(Arc<SessionHandle>);

impl AudioSession for FakeSession {
    fn start(&mut self) -> HostResult<()> {
        self.0.state.lock().unwrap().playing = true;
        Ok(())
    }

    fn stop(&mut self) -> HostResult<()> {
        self.0.state.lock().unwrap().playing = false;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.0.state.lock().unwrap();
        state.playing = false;
        state.closed = true;
    }

    fn position(&self) -> Duration {
        self.0.position()
    }

    fn set_position(&mut self, position: Duration) -> HostResult<()> {
        self.0.state.lock().unwrap().position = position;
        Ok(())
    }

    fn length(&self) -> Option<Duration> {
        self.0.length
    }

    fn gain_range(&self) -> Option<GainRange> {
        Some(GainRange {
            min_db: -80.0,
            max_db: 6.0206,
        })
    }

    fn set_gain_db(&mut self, db: f32) -> HostResult<()> {
        self.0.state.lock().unwrap().gain_db = Some(db);
        Ok(())
    }
}

/// Audio host driven by the test instead of a clock
#[derive(Default)]
pub struct FakeHost {
    media: Mutex<HashMap<PathBuf, Media>>,
    sessions: Mutex<Vec<Arc<SessionHandle>>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, path: impl Into<PathBuf>, media: Media) {
        self.media.lock().unwrap().insert(path.into(), media);
    }

    pub fn sessions(&self) -> Vec<Arc<SessionHandle>> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions().iter().filter(|s| !s.is_closed()).count()
    }

    /// The one session not yet closed
    pub fn current(&self) -> Arc<SessionHandle> {
        self.sessions()
            .into_iter()
            .rev()
            .find(|s| !s.is_closed())
            .expect("no open session")
    }

    /// Move every playing session forward by `by`
    pub fn advance(&self, by: Duration) {
        for session in self.sessions() {
            let mut state = session.state.lock().unwrap();
            if state.playing && !state.closed {
                let next = state.position + by;
                state.position = session.length.map_or(next, |len| next.min(len));
            }
        }
    }

    /// Play the current session to its end and report completion
    pub fn finish_current(&self) {
        let session = self.current();
        {
            let mut state = session.state.lock().unwrap();
            if let Some(length) = session.length {
                state.position = length;
            }
            state.playing = false;
        }
        session.fire_completion();
    }
}

impl AudioHost for FakeHost {
    fn open(
        &self,
        path: &Path,
        on_complete: CompletionNotifier,
    ) -> HostResult<Box<dyn AudioSession>> {
        let media = self
            .media
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(Media::Playable(None));

        let length = match media {
            Media::Playable(length) => length,
            Media::Unsupported => {
                return Err(HostError::UnsupportedFormat(path.display().to_string()))
            }
            Media::Broken => {
                return Err(HostError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "truncated",
                )))
            }
        };

        let handle = Arc::new(SessionHandle {
            path: path.to_path_buf(),
            length,
            state: Mutex::new(SessionState::default()),
            notifier: on_complete,
        });
        self.sessions.lock().unwrap().push(Arc::clone(&handle));
        Ok(Box::new(FakeSession(handle)))
    }
}

/// Media files on disk, scripted into a [`FakeHost`]
pub struct Library {
    pub dir: TempDir,
    pub host: Arc<FakeHost>,
}

impl Library {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            host: FakeHost::new(),
        }
    }

    /// Track whose catalog and media length are both `secs`
    pub fn track(&self, id: &str, secs: u64) -> Track {
        let track = self.file(id).with_duration(Duration::from_secs(secs));
        self.host.script(
            &track.media_path,
            Media::Playable(Some(Duration::from_secs(secs))),
        );
        track
    }

    /// Track with no catalog duration; the media reports `secs`
    pub fn untimed_track(&self, id: &str, secs: u64) -> Track {
        let track = self.file(id);
        self.host.script(
            &track.media_path,
            Media::Playable(Some(Duration::from_secs(secs))),
        );
        track
    }

    /// Track whose file exists but fails to open
    pub fn failing_track(&self, id: &str, media: Media) -> Track {
        let track = self.file(id).with_duration(Duration::from_secs(60));
        self.host.script(&track.media_path, media);
        track
    }

    fn file(&self, id: &str) -> Track {
        let path = self.dir.path().join(format!("{id}.wav"));
        std::fs::write(&path, b"RIFF").unwrap();
        Track::new(id, format!("Song {id}"), "Test Artist", path)
    }
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
