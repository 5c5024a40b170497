//! Transport controller - the single audio session and its state machine
//!
//! ```text
//!            load()                ok
//!   Idle ───────────▶ Loading ───────────▶ Playing ◀──┐
//!    ▲                   │                  │  │      │ resume()
//!    │ stop()            │ error            │  └──────┴─▶ Paused
//!    │                   ▼                  │ natural completion
//!    └────────────── Failed        Ended ◀──┘
//! ```
//!
//! Every transition and every position read goes through one mutex, so a
//! completion notification racing a user seek/stop sees a consistent state.
//! Each load bumps a generation counter; completions carrying an older
//! generation are ignored.

use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::host::{AudioHost, AudioSession, CompletionNotifier, CompletionSignal};
use crate::types::TransportState;
use crate::volume::{gain_db, DEFAULT_LEVEL};
use crossbeam_channel::Sender;
use harbor_core::{Track, TrackId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Point-in-time view of the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSnapshot {
    /// Current state
    pub state: TransportState,
    /// Session generation
    pub generation: u64,
    /// Position in the track
    pub elapsed: Duration,
    /// Track length (zero if unknown)
    pub duration: Duration,
    /// Track bound to the session
    pub track_id: Option<TrackId>,
}

/// Read-only access to transport position
///
/// This is all the progress sampler gets to see, so it cannot drive the
/// transport even by accident.
pub trait PositionSource: Send + Sync {
    /// Current state, position and length
    fn snapshot(&self) -> TransportSnapshot;
}

/// Result of a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedTrack {
    /// Generation of the new session
    pub generation: u64,
    /// Resolved track length
    pub duration: Duration,
}

struct Inner {
    state: TransportState,
    generation: u64,
    session: Option<Box<dyn AudioSession>>,
    track: Option<Track>,
    duration: Duration,
    /// Highest position observed while playing (monotonic elapsed)
    high_water: Duration,
    /// Position frozen at pause
    paused_at: Duration,
    /// End of media was reported while paused; delivered again on resume
    pending_end: bool,
    /// Linear volume applied to every new session
    volume: f32,
}

impl Inner {
    fn cap(&self, position: Duration) -> Duration {
        if self.duration.is_zero() {
            position
        } else {
            position.min(self.duration)
        }
    }

    fn elapsed(&mut self) -> Duration {
        match self.state {
            TransportState::Playing => {
                let reported = self
                    .session
                    .as_ref()
                    .map_or(self.high_water, |s| s.position());
                let reported = self.cap(reported);
                if reported > self.high_water {
                    self.high_water = reported;
                }
                self.high_water
            }
            TransportState::Paused => self.paused_at,
            TransportState::Ended => self.duration,
            TransportState::Idle | TransportState::Loading | TransportState::Failed => {
                Duration::ZERO
            }
        }
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.stop() {
                tracing::debug!("Stopping session before close failed: {}", e);
            }
            session.close();
        }
    }

    fn apply_volume(&mut self) {
        let volume = self.volume;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(range) = session.gain_range() else {
            return;
        };
        let db = gain_db(volume, range.min_db, range.max_db);
        if let Err(e) = session.set_gain_db(db) {
            tracing::warn!("Failed to apply gain {:.1} dB: {}", db, e);
        }
    }

    fn require(&self, action: &'static str, allowed: &[TransportState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PlaybackError::InvalidState {
                action,
                state: self.state,
            })
        }
    }
}

/// Owns the one active audio session
pub struct TransportController {
    host: Arc<dyn AudioHost>,
    inner: Mutex<Inner>,
    completions: Sender<CompletionSignal>,
    events: Arc<EventBus>,
}

impl TransportController {
    /// Create an idle controller
    ///
    /// Sessions report natural completion on `completions`.
    pub fn new(
        host: Arc<dyn AudioHost>,
        completions: Sender<CompletionSignal>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            host,
            inner: Mutex::new(Inner {
                state: TransportState::Idle,
                generation: 0,
                session: None,
                track: None,
                duration: Duration::ZERO,
                high_water: Duration::ZERO,
                paused_at: Duration::ZERO,
                pending_end: false,
                volume: DEFAULT_LEVEL,
            }),
            completions,
            events,
        }
    }

    /// Tear down any session, then open and start `track`
    ///
    /// The host opens the media outside the lock while the state reads
    /// `Loading`. If the transport moved on meanwhile (stop or another load),
    /// the freshly opened session is discarded.
    ///
    /// Failures leave the transport `Failed` and are not retried.
    pub fn load(&self, track: &Track) -> Result<LoadedTrack> {
        let generation = {
            let mut inner = self.lock();
            inner.close_session();
            inner.generation += 1;
            inner.track = Some(track.clone());
            inner.duration = track.duration;
            inner.high_water = Duration::ZERO;
            inner.paused_at = Duration::ZERO;
            inner.pending_end = false;
            self.transition(&mut inner, TransportState::Loading);
            inner.generation
        };

        tracing::info!(track = %track.id, generation, "Loading {}", track);

        if !track.media_path.is_file() {
            return Err(self.fail(
                generation,
                PlaybackError::MissingFile(track.media_path.clone()),
            ));
        }

        let notifier = CompletionNotifier::new(generation, self.completions.clone());
        let mut session = match self.host.open(&track.media_path, notifier) {
            Ok(session) => session,
            Err(e) => return Err(self.fail(generation, e.into())),
        };

        let mut inner = self.lock();
        if inner.generation != generation || inner.state != TransportState::Loading {
            tracing::debug!(generation, "Discarding superseded session");
            session.close();
            return Err(PlaybackError::InvalidState {
                action: "finish loading",
                state: inner.state,
            });
        }

        if track.known_duration().is_none() {
            if let Some(length) = session.length().filter(|l| !l.is_zero()) {
                inner.duration = length;
                self.events.emit(PlaybackEvent::DurationResolved {
                    track_id: track.id.clone(),
                    duration: length,
                });
            }
        }

        if let Err(e) = session.start() {
            session.close();
            drop(inner);
            return Err(self.fail(generation, e.into()));
        }

        inner.session = Some(session);
        inner.apply_volume();
        self.transition(&mut inner, TransportState::Playing);

        Ok(LoadedTrack {
            generation,
            duration: inner.duration,
        })
    }

    /// Pause output, freezing the position
    pub fn pause(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.require("pause", &[TransportState::Playing])?;

        let position = inner.elapsed();
        if let Some(session) = inner.session.as_mut() {
            session.stop()?;
        }
        inner.paused_at = position;
        self.transition(&mut inner, TransportState::Paused);
        Ok(())
    }

    /// Continue from the paused position
    ///
    /// An end of media that arrived while paused is re-sent on the
    /// completion channel, so the track still finishes exactly once.
    pub fn resume(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.require("resume", &[TransportState::Paused])?;

        let position = inner.paused_at;
        if let Some(session) = inner.session.as_mut() {
            session.set_position(position)?;
            session.start()?;
        }
        inner.high_water = position;
        self.transition(&mut inner, TransportState::Playing);

        if std::mem::take(&mut inner.pending_end) {
            tracing::debug!(generation = inner.generation, "Redelivering end of media");
            // Receiver gone means the engine shut down.
            let _ = self.completions.send(CompletionSignal {
                generation: inner.generation,
            });
        }
        Ok(())
    }

    /// Jump to `seconds`, clamped into `[0, duration]`
    ///
    /// Allowed while Playing or Paused; the state does not change. Returns
    /// the position actually applied.
    pub fn seek(&self, seconds: f64) -> Result<Duration> {
        let mut inner = self.lock();
        inner.require("seek", &[TransportState::Playing, TransportState::Paused])?;

        let target = clamp_seconds(seconds, inner.duration);
        if let Some(session) = inner.session.as_mut() {
            session.set_position(target)?;
        }
        inner.high_water = target;
        inner.paused_at = target;
        inner.pending_end = false;
        tracing::debug!(generation = inner.generation, "Seek to {:?}", target);
        Ok(target)
    }

    /// Close the session and return to Idle
    ///
    /// Also invalidates any completion still in flight for the old session.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.close_session();
        inner.generation += 1;
        inner.track = None;
        inner.duration = Duration::ZERO;
        inner.high_water = Duration::ZERO;
        inner.paused_at = Duration::ZERO;
        inner.pending_end = false;
        self.transition(&mut inner, TransportState::Idle);
    }

    /// Handle end-of-media reported by the host
    ///
    /// Accepted only for the current generation while Playing, so each
    /// session ends at most once and stale sessions never end the new one.
    /// While Paused the end is held until [`resume`](Self::resume).
    /// Returns the finished track when accepted.
    pub fn natural_completion(&self, generation: u64) -> Option<TrackId> {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == TransportState::Paused {
            tracing::debug!(generation, "End of media while paused");
            inner.pending_end = true;
            return None;
        }
        if inner.generation != generation || inner.state != TransportState::Playing {
            tracing::debug!(
                generation,
                current = inner.generation,
                state = ?inner.state,
                "Ignoring stale completion"
            );
            return None;
        }

        if let Some(session) = inner.session.as_mut() {
            if let Err(e) = session.stop() {
                tracing::debug!("Stopping finished session failed: {}", e);
            }
        }
        inner.high_water = inner.duration;
        self.transition(&mut inner, TransportState::Ended);

        let finished = inner.track.as_ref().map(|t| t.id.clone());
        tracing::info!(generation, track = ?finished, "Track finished");
        finished
    }

    /// Set the linear volume; applied now and to every later session
    pub fn set_volume(&self, linear: f32) {
        let mut inner = self.lock();
        inner.volume = linear.clamp(0.0, 1.0);
        inner.apply_volume();
    }

    /// Current state
    pub fn state(&self) -> TransportState {
        self.lock().state
    }

    /// Position in the current track
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed()
    }

    /// Length of the current track (zero if unknown)
    pub fn duration(&self) -> Duration {
        self.lock().duration
    }

    /// Current session generation
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Track bound to the transport
    pub fn current_track(&self) -> Option<Track> {
        self.lock().track.clone()
    }

    fn transition(&self, inner: &mut Inner, next: TransportState) {
        if inner.state == next {
            return;
        }
        tracing::debug!(from = ?inner.state, to = ?next, generation = inner.generation, "Transport");
        inner.state = next;
        self.events
            .emit(PlaybackEvent::StateChanged { state: next });
    }

    fn fail(&self, generation: u64, err: PlaybackError) -> PlaybackError {
        tracing::warn!(generation, "Load failed: {}", err);
        let mut inner = self.lock();
        if inner.generation == generation {
            inner.close_session();
            self.transition(&mut inner, TransportState::Failed);
        }
        err
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every mutation completes before the guard drops, so the state
        // behind a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PositionSource for TransportController {
    fn snapshot(&self) -> TransportSnapshot {
        let mut inner = self.lock();
        TransportSnapshot {
            elapsed: inner.elapsed(),
            state: inner.state,
            generation: inner.generation,
            duration: inner.duration,
            track_id: inner.track.as_ref().map(|t| t.id.clone()),
        }
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        self.lock().close_session();
    }
}

/// Clamp a requested position into `[0, duration]`
///
/// Negative and NaN requests go to the start.
pub fn clamp_seconds(seconds: f64, duration: Duration) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    if seconds >= duration.as_secs_f64() {
        return duration;
    }
    Duration::from_secs_f64(seconds)
}
