//! Periodic progress sampling

use crate::transport::PositionSource;
use crate::types::{Progress, TransportState};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Default)]
struct Control {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Background loop publishing [`Progress`] for one transport generation
///
/// The loop stays silent unless the transport is Playing the generation it
/// was started for, so pausing suppresses emissions and resuming picks up
/// again from the fresh position. Emissions happen while holding the cancel
/// lock; once [`cancel`](Self::cancel) returns nothing more is published.
pub struct ProgressSampler {
    control: Arc<Control>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressSampler {
    /// Start sampling `source` every `interval`
    pub fn spawn<F>(
        source: Arc<dyn PositionSource>,
        generation: u64,
        interval: Duration,
        sink: F,
    ) -> Self
    where
        F: Fn(Progress) + Send + 'static,
    {
        let control = Arc::new(Control::default());
        let loop_control = Arc::clone(&control);

        let handle = thread::Builder::new()
            .name(format!("harbor-progress-{generation}"))
            .spawn(move || run(&loop_control, source.as_ref(), generation, interval, sink));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Failed to start progress sampler: {}", e);
                None
            }
        };

        Self { control, handle }
    }

    /// Stop the loop and wait for it to exit
    pub fn cancel(&mut self) {
        {
            let mut cancelled = self
                .control
                .cancelled
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *cancelled = true;
            self.control.wake.notify_all();
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Progress sampler panicked");
            }
        }
    }

    /// Whether the loop thread is still attached
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run<F>(
    control: &Control,
    source: &dyn PositionSource,
    generation: u64,
    interval: Duration,
    sink: F,
) where
    F: Fn(Progress),
{
    let mut cancelled = control
        .cancelled
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    loop {
        if *cancelled {
            break;
        }

        let snapshot = source.snapshot();
        if snapshot.generation != generation {
            // Transport moved on; this sampler will never emit again.
            break;
        }
        if snapshot.state == TransportState::Playing {
            sink(Progress::at(snapshot.elapsed, snapshot.duration));
        }

        let (guard, _) = control
            .wake
            .wait_timeout(cancelled, interval)
            .unwrap_or_else(PoisonError::into_inner);
        cancelled = guard;
    }

    tracing::trace!(generation, "Progress sampler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportSnapshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        snapshot: Mutex<TransportSnapshot>,
    }

    impl Fixed {
        fn new(state: TransportState, generation: u64) -> Arc<Self> {
            Arc::new(Self {
                snapshot: Mutex::new(TransportSnapshot {
                    state,
                    generation,
                    elapsed: Duration::from_secs(3),
                    duration: Duration::from_secs(30),
                    track_id: None,
                }),
            })
        }

        fn set_state(&self, state: TransportState) {
            self.snapshot.lock().unwrap().state = state;
        }
    }

    impl PositionSource for Fixed {
        fn snapshot(&self) -> TransportSnapshot {
            self.snapshot.lock().unwrap().clone()
        }
    }

    fn counting(count: &Arc<AtomicUsize>) -> impl Fn(Progress) + Send + 'static {
        let count = Arc::clone(count);
        move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn emits_while_playing() {
        let source = Fixed::new(TransportState::Playing, 1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut sampler = ProgressSampler::spawn(source, 1, Duration::from_millis(10), move |p| {
            sink.lock().unwrap().push(p);
        });
        thread::sleep(Duration::from_millis(80));
        sampler.cancel();

        let seen = seen.lock().unwrap();
        assert!(seen.len() >= 2);
        assert_eq!(seen[0].elapsed, Duration::from_secs(3));
        assert!((seen[0].fraction - 0.1).abs() < 1e-6);
    }

    #[test]
    fn silent_while_paused_and_resumes() {
        let source = Fixed::new(TransportState::Paused, 1);
        let count = Arc::new(AtomicUsize::new(0));
        let mut sampler = ProgressSampler::spawn(
            source.clone(),
            1,
            Duration::from_millis(10),
            counting(&count),
        );

        thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        source.set_state(TransportState::Playing);
        thread::sleep(Duration::from_millis(60));
        sampler.cancel();
        assert!(count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn no_emission_after_cancel() {
        let source = Fixed::new(TransportState::Playing, 1);
        let count = Arc::new(AtomicUsize::new(0));
        let mut sampler =
            ProgressSampler::spawn(source, 1, Duration::from_millis(5), counting(&count));

        thread::sleep(Duration::from_millis(30));
        sampler.cancel();
        let after_cancel = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));

        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
        assert!(!sampler.is_running());
    }

    #[test]
    fn exits_when_generation_changes() {
        let source = Fixed::new(TransportState::Playing, 2);
        let count = Arc::new(AtomicUsize::new(0));
        let sampler =
            ProgressSampler::spawn(source, 1, Duration::from_millis(5), counting(&count));

        thread::sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!sampler.is_running());
    }

    #[test]
    fn cancel_is_prompt_with_long_interval() {
        let source = Fixed::new(TransportState::Playing, 1);
        let count = Arc::new(AtomicUsize::new(0));
        let mut sampler =
            ProgressSampler::spawn(source, 1, Duration::from_secs(60), counting(&count));

        let started = std::time::Instant::now();
        sampler.cancel();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
