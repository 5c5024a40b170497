/// CPAL output for one decoded track
///
/// **Architecture**: every session runs a dedicated audio thread that owns
/// the CPAL `Stream` (which is not `Send` on every platform). The session
/// handle talks to that thread over a channel; position, run flag and gain
/// are shared with the real-time callback through atomics.
use crate::decode::{frames_to_duration, DecodedAudio, CHANNELS};
use crate::error::{AudioError, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use harbor_playback::CompletionNotifier;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Commands sent to the audio thread
enum AudioCommand {
    /// Start or continue the stream
    Play(Sender<Result<()>>),
    /// Halt the stream
    Pause,
    /// Drop the stream and exit
    Shutdown,
}

/// State shared between the session handle and the audio callback
pub(crate) struct SharedState {
    /// Interleaved stereo samples at the device rate
    samples: Arc<Vec<f32>>,
    /// Read position, in samples (not frames)
    position: AtomicUsize,
    /// Callback produces sound only while set
    running: AtomicBool,
    /// Linear amplitude as `f32` bits
    amplitude: AtomicU32,
    /// Set once the session is closed
    closed: AtomicBool,
    /// Fired when the callback reaches the end while running
    on_complete: CompletionNotifier,
}

impl SharedState {
    pub(crate) fn new(samples: Vec<f32>, on_complete: CompletionNotifier) -> Self {
        Self {
            samples: Arc::new(samples),
            position: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            amplitude: AtomicU32::new(1.0_f32.to_bits()),
            closed: AtomicBool::new(false),
            on_complete,
        }
    }

    fn amplitude(&self) -> f32 {
        f32::from_bits(self.amplitude.load(Ordering::Relaxed))
    }

    /// Fill one device buffer with `device_channels` interleaved channels
    pub(crate) fn fill(&self, output: &mut [f32], device_channels: usize) {
        if !self.running.load(Ordering::Acquire) || device_channels == 0 {
            output.fill(0.0);
            return;
        }

        let gain = self.amplitude();
        let samples = &self.samples;
        let origin = self.position.load(Ordering::Acquire);
        let mut pos = origin;

        for frame in output.chunks_mut(device_channels) {
            if pos + CHANNELS > samples.len() {
                frame.fill(0.0);
                continue;
            }
            let (left, right) = (samples[pos] * gain, samples[pos + 1] * gain);
            match frame {
                [mono] => *mono = (left + right) * 0.5,
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
            pos += CHANNELS;
        }

        // A seek during the copy wins over our advance.
        let published = self
            .position
            .compare_exchange(origin, pos, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if published && pos + CHANNELS > samples.len() && !self.closed.load(Ordering::Acquire) {
            self.running.store(false, Ordering::Release);
            self.on_complete.notify();
        }
    }
}

/// An open, decoded track bound to the output device
pub struct OutputSession {
    shared: Arc<SharedState>,
    sample_rate: u32,
    commands: Sender<AudioCommand>,
    thread: Option<JoinHandle<()>>,
}

impl OutputSession {
    /// Build the stream on a new audio thread
    ///
    /// `audio` must already be at the device sample rate. Returns once the
    /// stream exists, so device failures surface here.
    pub fn open(
        device: Device,
        config: StreamConfig,
        audio: DecodedAudio,
        on_complete: CompletionNotifier,
    ) -> Result<Self> {
        let sample_rate = audio.sample_rate;
        let shared = Arc::new(SharedState::new(audio.samples, on_complete));
        let (commands, command_rx) = bounded::<AudioCommand>(8);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("harbor-audio".into())
            .spawn(move || {
                audio_thread_run(&device, &config, thread_shared, &command_rx, &ready_tx);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                shared,
                sample_rate,
                commands,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::DeviceError("audio thread exited".into()))
            }
        }
    }

    /// Start or continue output
    pub fn play(&self) -> Result<()> {
        let (tx, rx) = bounded(1);
        self.send(AudioCommand::Play(tx))?;
        rx.recv()
            .map_err(|_| AudioError::PlayError("audio thread exited".into()))?
    }

    /// Halt output, keeping the position
    pub fn pause(&self) -> Result<()> {
        self.shared.running.store(false, Ordering::Release);
        self.send(AudioCommand::Pause)
    }

    /// Current position
    pub fn position(&self) -> Duration {
        let samples = self.shared.position.load(Ordering::Acquire);
        frames_to_duration(samples / CHANNELS, self.sample_rate)
    }

    /// Move to `position`, clamped to the end
    pub fn seek(&self, position: Duration) {
        let frame = (position.as_secs_f64() * f64::from(self.sample_rate)) as usize;
        let sample = (frame * CHANNELS).min(self.shared.samples.len());
        self.shared.position.store(sample, Ordering::Release);
    }

    /// Track length
    pub fn length(&self) -> Duration {
        frames_to_duration(self.shared.samples.len() / CHANNELS, self.sample_rate)
    }

    /// Set linear output amplitude
    pub fn set_amplitude(&self, amplitude: f32) {
        self.shared
            .amplitude
            .store(amplitude.max(0.0).to_bits(), Ordering::Relaxed);
    }

    /// Release the device; no completion fires afterwards
    pub fn close(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.running.store(false, Ordering::Release);
        let _ = self.commands.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Audio thread panicked");
            }
        }
    }

    fn send(&self, command: AudioCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AudioError::DeviceError("audio thread exited".into()))
    }
}

impl Drop for OutputSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Audio thread main loop
///
/// Owns the CPAL stream for the whole session and reports whether it could
/// be built on `ready`.
fn audio_thread_run(
    device: &Device,
    config: &StreamConfig,
    shared: Arc<SharedState>,
    commands: &Receiver<AudioCommand>,
    ready: &Sender<Result<()>>,
) {
    let device_channels = usize::from(config.channels);
    let callback_state = Arc::clone(&shared);
    let stream: Stream = match device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            callback_state.fill(data, device_channels);
        },
        |err| tracing::error!("Audio stream error: {}", err),
        None,
    ) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return;
        }
    };

    // Streams may start running on creation on some backends.
    if let Err(e) = stream.pause() {
        tracing::debug!("Initial pause not supported: {}", e);
    }
    let _ = ready.send(Ok(()));

    while let Ok(command) = commands.recv() {
        match command {
            AudioCommand::Play(reply) => {
                let result = stream.play().map_err(AudioError::from);
                if result.is_ok() {
                    shared.running.store(true, Ordering::Release);
                }
                let _ = reply.send(result);
            }
            AudioCommand::Pause => {
                if let Err(e) = stream.pause() {
                    // The callback is already silent; keep going.
                    tracing::debug!("Stream pause failed: {}", e);
                }
            }
            AudioCommand::Shutdown => break,
        }
    }

    drop(stream);
    tracing::trace!("Audio thread stopped");
}
