//! Playback engine - the facade the UI talks to
//!
//! Ties together the queue, the transport, the progress sampler and the
//! artwork worker. Every command (user-issued or auto-advance after a
//! natural completion) runs under one command lock, so they never interleave.

use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::host::{AudioHost, CompletionSignal};
use crate::queue::PlaybackQueue;
use crate::sampler::ProgressSampler;
use crate::transport::{PositionSource, TransportController};
use crate::types::{Direction, PlaybackConfig, Progress, TransportState};
use crate::volume::Volume;
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use harbor_artwork::{Backdrop, BackdropWorker};
use harbor_core::{Catalog, Track, TrackId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Past this point "previous" restarts the current track instead
pub const RESTART_THRESHOLD: Duration = Duration::from_secs(3);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backdrop currently shown, tagged with the track it was requested for
struct ArtworkSlot {
    track_id: Option<TrackId>,
    backdrop: Arc<Backdrop>,
}

struct EngineInner {
    transport: Arc<TransportController>,
    queue: Mutex<PlaybackQueue>,
    sampler: Mutex<Option<ProgressSampler>>,
    progress: Arc<Mutex<Progress>>,
    artwork: Arc<Mutex<ArtworkSlot>>,
    backdrops: BackdropWorker,
    catalog: Option<Arc<dyn Catalog>>,
    events: Arc<EventBus>,
    volume: Mutex<Volume>,
    config: PlaybackConfig,
    commands: Mutex<()>,
}

/// Playback engine
///
/// Owns one transport. Engines share nothing, so several can coexist.
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
    shutdown: Option<Sender<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl PlaybackEngine {
    /// Create an engine playing through `host`
    ///
    /// `catalog` backs favorites, recent plays and [`play_track_id`](Self::play_track_id);
    /// without one those calls fail with [`PlaybackError::Catalog`].
    pub fn new(
        host: Arc<dyn AudioHost>,
        catalog: Option<Arc<dyn Catalog>>,
        config: PlaybackConfig,
    ) -> Result<Self> {
        let events = Arc::new(EventBus::new());
        let (completion_tx, completion_rx) = unbounded();
        let transport = Arc::new(TransportController::new(
            host,
            completion_tx,
            Arc::clone(&events),
        ));

        let volume = Volume::new(config.initial_volume);
        transport.set_volume(volume.effective());

        let inner = Arc::new(EngineInner {
            transport,
            queue: Mutex::new(PlaybackQueue::new()),
            sampler: Mutex::new(None),
            progress: Arc::new(Mutex::new(Progress::default())),
            artwork: Arc::new(Mutex::new(ArtworkSlot {
                track_id: None,
                backdrop: Arc::new(Backdrop::empty()),
            })),
            backdrops: BackdropWorker::spawn(config.artwork.clone()),
            catalog,
            events,
            volume: Mutex::new(volume),
            config,
            commands: Mutex::new(()),
        });

        let (shutdown_tx, shutdown_rx) = unbounded();
        let weak = Arc::downgrade(&inner);
        let dispatcher = thread::Builder::new()
            .name("harbor-completion".into())
            .spawn(move || dispatch(&weak, &completion_rx, &shutdown_rx))?;

        tracing::debug!(
            interval = ?inner.config.sample_interval(),
            "Playback engine started"
        );

        Ok(Self {
            inner,
            shutdown: Some(shutdown_tx),
            dispatcher: Some(dispatcher),
        })
    }

    /// Play `track`
    ///
    /// If the track is already queued the cursor moves to it; otherwise the
    /// queue is replaced with just this track.
    pub fn load_and_play(&self, track: Track) -> Result<()> {
        let inner = &self.inner;
        let _cmd = lock(&inner.commands);
        inner.select_or_replace(&track);
        let result = inner.start_track(track);
        inner.report(result)
    }

    /// Replace the queue and start playing at `start_index`
    pub fn play_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        let inner = &self.inner;
        let _cmd = lock(&inner.commands);

        let result = inner.replace_queue(tracks, start_index);
        inner.report(result)
    }

    /// Look `id` up in the catalog and play it
    pub fn play_track_id(&self, id: &TrackId) -> Result<()> {
        let track = self
            .inner
            .report(self.inner.catalog().and_then(|catalog| {
                catalog
                    .track(id)?
                    .ok_or_else(|| PlaybackError::NotFound(id.to_string()))
            }))?;
        self.load_and_play(track)
    }

    /// Pause when playing, resume when paused, restart the current entry
    /// when stopped or finished
    ///
    /// No-op while a load is in progress.
    pub fn toggle_play_pause(&self) -> Result<()> {
        let inner = &self.inner;
        let _cmd = lock(&inner.commands);

        let result = match inner.transport.state() {
            TransportState::Playing => inner.transport.pause().map(|()| {
                let (elapsed, duration) = (inner.transport.elapsed(), inner.transport.duration());
                inner.publish_progress(Progress::at(elapsed, duration));
            }),
            TransportState::Paused => inner.transport.resume(),
            TransportState::Loading => Ok(()),
            TransportState::Idle | TransportState::Ended | TransportState::Failed => {
                let current = lock(&inner.queue).current().cloned();
                current
                    .ok_or(PlaybackError::QueueEmpty)
                    .and_then(|track| inner.start_track(track))
            }
        };
        inner.report(result)
    }

    /// Jump within the current track; returns the position applied
    pub fn seek(&self, seconds: f64) -> Result<Duration> {
        let inner = &self.inner;
        let _cmd = lock(&inner.commands);
        let result = inner.seek_locked(seconds);
        inner.report(result)
    }

    /// Advance to the next queue entry (wrapping) and play it
    pub fn skip_next(&self) -> Result<()> {
        let inner = &self.inner;
        let _cmd = lock(&inner.commands);
        let result = inner.skip(Direction::Next);
        inner.report(result)
    }

    /// Restart the current track if past [`RESTART_THRESHOLD`], otherwise
    /// play the previous queue entry (wrapping)
    pub fn skip_previous(&self) -> Result<()> {
        let inner = &self.inner;
        let _cmd = lock(&inner.commands);

        let result = if inner.transport.elapsed() > RESTART_THRESHOLD {
            if inner.transport.state().has_session() {
                inner.seek_locked(0.0).map(|_| ())
            } else {
                let current = lock(&inner.queue).current().cloned();
                current
                    .ok_or(PlaybackError::QueueEmpty)
                    .and_then(|track| inner.start_track(track))
            }
        } else {
            inner.skip(Direction::Previous)
        };
        inner.report(result)
    }

    /// Close the session; the queue is kept
    pub fn stop(&self) {
        let inner = &self.inner;
        let _cmd = lock(&inner.commands);
        inner.cancel_sampler();
        inner.transport.stop();
        inner.publish_progress(Progress::default());
    }

    /// Set the linear volume (0.0-1.0); also lifts mute
    pub fn set_volume(&self, level: f32) {
        self.inner.update_volume(|v| v.set_level(level));
    }

    /// Mute, or restore the level from before muting
    pub fn toggle_mute(&self) {
        self.inner.update_volume(Volume::toggle_mute);
    }

    /// Current volume state
    pub fn volume(&self) -> Volume {
        lock(&self.inner.volume).clone()
    }

    /// Flip the favorite flag of the current track; returns the new flag
    pub fn toggle_favorite(&self) -> Result<bool> {
        let result = match self.current_track() {
            Some(track) => self.inner.flip_favorite(&track.id),
            None => Err(PlaybackError::QueueEmpty),
        };
        self.inner.report(result)
    }

    /// Whether the current track is a favorite (false with no track)
    pub fn is_favorite(&self) -> Result<bool> {
        let Some(track) = self.current_track() else {
            return Ok(false);
        };
        let catalog = self.inner.catalog()?;
        Ok(catalog.is_favorite(&track.id)?)
    }

    /// Transport state
    pub fn state(&self) -> TransportState {
        self.inner.transport.state()
    }

    /// Last published progress
    pub fn progress(&self) -> Progress {
        *lock(&self.inner.progress)
    }

    /// Artwork of the current track
    pub fn artwork(&self) -> Arc<Backdrop> {
        Arc::clone(&lock(&self.inner.artwork).backdrop)
    }

    /// Track the transport is bound to, else the queue cursor
    pub fn current_track(&self) -> Option<Track> {
        self.inner
            .transport
            .current_track()
            .or_else(|| lock(&self.inner.queue).current().cloned())
    }

    /// Length of the current track (zero if unknown)
    pub fn duration(&self) -> Duration {
        self.inner.transport.duration()
    }

    /// Queue contents
    pub fn queue(&self) -> Vec<Track> {
        lock(&self.inner.queue).tracks().to_vec()
    }

    /// Queue cursor
    pub fn queue_index(&self) -> usize {
        lock(&self.inner.queue).index()
    }

    /// Receive playback events
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        self.inner.events.subscribe()
    }

    /// Engine configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.inner.config
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        drop(self.shutdown.take());
        if let Some(handle) = self.dispatcher.take() {
            if handle.join().is_err() {
                tracing::warn!("Completion dispatcher panicked");
            }
        }
        self.inner.cancel_sampler();
    }
}

impl EngineInner {
    fn catalog(&self) -> Result<&Arc<dyn Catalog>> {
        self.catalog
            .as_ref()
            .ok_or_else(|| PlaybackError::Catalog("no catalog configured".into()))
    }

    fn select_or_replace(&self, track: &Track) {
        let mut queue = lock(&self.queue);
        match queue.position_of(&track.id) {
            Some(index) => {
                queue.select(index);
            }
            None => queue.set_queue(vec![track.clone()], 0),
        }
        self.emit_queue(&queue);
    }

    fn replace_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }
        let track = {
            let mut queue = lock(&self.queue);
            queue.set_queue(tracks, start_index);
            self.emit_queue(&queue);
            queue.current().cloned().ok_or(PlaybackError::QueueEmpty)?
        };
        self.start_track(track)
    }

    fn flip_favorite(&self, id: &TrackId) -> Result<bool> {
        let catalog = self.catalog()?;
        let favorite = !catalog.is_favorite(id)?;
        catalog.set_favorite(id, favorite)?;
        self.events.emit(PlaybackEvent::FavoriteChanged {
            track_id: id.clone(),
            favorite,
        });
        Ok(favorite)
    }

    fn skip(&self, direction: Direction) -> Result<()> {
        let track = lock(&self.queue)
            .advance(direction)
            .cloned()
            .ok_or(PlaybackError::QueueEmpty)?;
        self.start_track(track)
    }

    fn seek_locked(&self, seconds: f64) -> Result<Duration> {
        let target = self.transport.seek(seconds)?;
        self.publish_progress(Progress::at(target, self.transport.duration()));
        Ok(target)
    }

    /// Switch the transport to `track`
    ///
    /// Caller holds the command lock.
    fn start_track(&self, track: Track) -> Result<()> {
        self.cancel_sampler();
        self.events.emit(PlaybackEvent::TrackChanged {
            track: track.clone(),
        });
        self.request_artwork(&track);

        let loaded = match self.transport.load(&track) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.publish_progress(Progress::start_of(track.duration));
                return Err(e);
            }
        };
        self.publish_progress(Progress::start_of(loaded.duration));

        if let Some(catalog) = &self.catalog {
            if let Err(e) = catalog.record_play(&track.id) {
                tracing::warn!(track = %track.id, "Failed to record play: {}", e);
            }
        }

        let progress = Arc::clone(&self.progress);
        let events = Arc::clone(&self.events);
        let source: Arc<dyn PositionSource> = self.transport.clone();
        let sampler = ProgressSampler::spawn(
            source,
            loaded.generation,
            self.config.sample_interval(),
            move |p| {
                *lock(&progress) = p;
                events.emit(PlaybackEvent::ProgressUpdated { progress: p });
            },
        );
        *lock(&self.sampler) = Some(sampler);
        Ok(())
    }

    fn request_artwork(&self, track: &Track) {
        lock(&self.artwork).track_id = Some(track.id.clone());

        let slot = Arc::clone(&self.artwork);
        let events = Arc::clone(&self.events);
        let track_id = track.id.clone();
        self.backdrops.request(track.clone(), move |backdrop| {
            let mut slot = lock(&slot);
            if slot.track_id.as_ref() != Some(&track_id) {
                return;
            }
            let has_artwork = backdrop.has_artwork();
            slot.backdrop = backdrop;
            drop(slot);
            events.emit(PlaybackEvent::ArtworkReady {
                track_id,
                has_artwork,
            });
        });
    }

    fn cancel_sampler(&self) {
        let sampler = lock(&self.sampler).take();
        if let Some(mut sampler) = sampler {
            sampler.cancel();
        }
    }

    fn publish_progress(&self, progress: Progress) {
        *lock(&self.progress) = progress;
        self.events.emit(PlaybackEvent::ProgressUpdated { progress });
    }

    fn emit_queue(&self, queue: &PlaybackQueue) {
        self.events.emit(PlaybackEvent::QueueChanged {
            length: queue.len(),
            index: queue.index(),
        });
    }

    fn update_volume(&self, change: impl FnOnce(&mut Volume)) {
        let (level, muted, effective) = {
            let mut volume = lock(&self.volume);
            change(&mut volume);
            (volume.level(), volume.is_muted(), volume.effective())
        };
        self.transport.set_volume(effective);
        self.events
            .emit(PlaybackEvent::VolumeChanged { level, muted });
    }

    fn on_completion(&self, signal: CompletionSignal) {
        let _cmd = lock(&self.commands);
        let Some(track_id) = self.transport.natural_completion(signal.generation) else {
            return;
        };

        let duration = self.transport.duration();
        self.cancel_sampler();
        self.publish_progress(Progress::at(duration, duration));
        self.events.emit(PlaybackEvent::TrackFinished { track_id });

        let result = self.skip(Direction::Next);
        let _ = self.report(result);
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!("Playback command failed: {}", e);
            self.events.emit(PlaybackEvent::Error {
                message: e.to_string(),
            });
        }
        result
    }
}

fn dispatch(
    engine: &Weak<EngineInner>,
    completions: &Receiver<CompletionSignal>,
    shutdown: &Receiver<()>,
) {
    loop {
        select! {
            recv(completions) -> signal => {
                let Ok(signal) = signal else { break };
                let Some(engine) = engine.upgrade() else { break };
                engine.on_completion(signal);
            }
            recv(shutdown) -> _ => break,
        }
    }
    tracing::debug!("Completion dispatcher stopped");
}
