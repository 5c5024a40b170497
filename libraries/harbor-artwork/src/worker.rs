//! Background backdrop generation
//!
//! Decoding and blurring run on a dedicated thread, triggered when a track is
//! loaded. Results are cached per track, so revisiting a track answers
//! straight from the cache.

use crate::blur::BlurPipeline;
use crate::cache::BackdropCache;
use crate::error::{ArtworkError, Result};
use crate::locate::find_artwork;
use crate::types::{ArtworkConfig, Backdrop};
use crossbeam_channel::{unbounded, Sender};
use harbor_core::Track;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Reply = Box<dyn FnOnce(Arc<Backdrop>) + Send>;

struct Job {
    track: Track,
    reply: Reply,
}

/// Load the cover for `track` and derive its backdrop
///
/// Never fails: a missing or undecodable cover produces an empty backdrop.
pub fn load_backdrop(track: &Track, config: &ArtworkConfig) -> Backdrop {
    let Some(path) = find_artwork(track, &config.search_dirs) else {
        tracing::debug!(track = %track.id, "No artwork found");
        return Backdrop::empty();
    };

    match decode(&path) {
        Ok(original) => {
            let blurred = BlurPipeline::from(config).process(Some(&original));
            Backdrop {
                original: Some(Arc::new(original)),
                blurred: blurred.map(Arc::new),
            }
        }
        Err(e) => {
            tracing::warn!(track = %track.id, path = %path.display(), "Artwork unusable: {}", e);
            Backdrop::empty()
        }
    }
}

fn decode(path: &Path) -> Result<RgbaImage> {
    if !path.is_file() {
        return Err(ArtworkError::FileNotFound(path.to_path_buf()));
    }
    Ok(image::open(path)?.to_rgba8())
}

/// Owns the backdrop thread
///
/// Dropping the worker finishes queued jobs and joins the thread.
pub struct BackdropWorker {
    jobs: Option<Sender<Job>>,
    cache: BackdropCache,
    config: ArtworkConfig,
    handle: Option<JoinHandle<()>>,
}

impl BackdropWorker {
    /// Spawn the worker thread
    pub fn spawn(config: ArtworkConfig) -> Self {
        let cache = BackdropCache::new(config.cache_size);
        let (tx, rx) = unbounded::<Job>();

        let thread_cache = cache.clone();
        let thread_config = config.clone();
        let handle = thread::Builder::new()
            .name("harbor-artwork".into())
            .spawn(move || {
                while let Ok(Job { track, reply }) = rx.recv() {
                    let backdrop = match thread_cache.get(&track.id) {
                        Some(hit) => hit,
                        None => {
                            let fresh = Arc::new(load_backdrop(&track, &thread_config));
                            thread_cache.put(track.id.clone(), Arc::clone(&fresh));
                            fresh
                        }
                    };
                    reply(backdrop);
                }
            })
            .map_err(|e| tracing::error!("Failed to spawn artwork thread: {}", e))
            .ok();

        Self {
            jobs: handle.as_ref().map(|_| tx),
            cache,
            config,
            handle,
        }
    }

    /// Produce the backdrop for `track` and hand it to `reply`
    ///
    /// Cached backdrops are answered immediately on the calling thread; others
    /// are computed on the worker thread. If the worker is gone the backdrop
    /// is computed inline.
    pub fn request<F>(&self, track: Track, reply: F)
    where
        F: FnOnce(Arc<Backdrop>) + Send + 'static,
    {
        if let Some(hit) = self.cache.get(&track.id) {
            reply(hit);
            return;
        }

        let job = Job {
            track,
            reply: Box::new(reply),
        };
        let job = match &self.jobs {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                Err(returned) => returned.into_inner(),
            },
            None => job,
        };

        let backdrop = Arc::new(load_backdrop(&job.track, &self.config));
        self.cache.put(job.track.id.clone(), Arc::clone(&backdrop));
        (job.reply)(backdrop);
    }

    /// Shared backdrop cache
    pub fn cache(&self) -> &BackdropCache {
        &self.cache
    }
}

impl Drop for BackdropWorker {
    fn drop(&mut self) {
        // Closing the channel ends the receive loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
