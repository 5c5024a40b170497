//! [`AudioHost`] backed by the default CPAL output device

use crate::decode::{decode_file, resample};
use crate::error::{AudioError, Result};
use crate::output::OutputSession;
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, StreamConfig};
use harbor_playback::{
    db_to_amplitude, AudioHost, AudioSession, CompletionNotifier, GainRange, HostResult,
};
use std::path::Path;
use std::time::Duration;

/// Quietest gain offered; treated as silence
pub const MIN_GAIN_DB: f32 = -80.0;

/// Loudest gain offered (+6 dB, i.e. double amplitude)
pub const MAX_GAIN_DB: f32 = 6.0206;

/// Desktop audio host
///
/// Each `open` decodes the whole file, resamples it to the device rate and
/// spins up a stream on its own audio thread.
#[derive(Debug, Default, Clone)]
pub struct CpalHost {
    /// Substring of the preferred output device name; default device otherwise
    device_hint: Option<String>,
}

impl CpalHost {
    /// Host that plays through the system default output
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that prefers the first device whose name contains `hint`
    pub fn with_device(hint: impl Into<String>) -> Self {
        Self {
            device_hint: Some(hint.into()),
        }
    }

    /// Names of all output devices on the default host
    pub fn output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| AudioError::DeviceError(e.to_string()))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn device(&self) -> Result<(Device, StreamConfig)> {
        let host = cpal::default_host();

        let preferred = self.device_hint.as_deref().and_then(|hint| {
            host.output_devices()
                .ok()?
                .find(|d| d.name().is_ok_and(|name| name.contains(hint)))
        });
        if preferred.is_none() {
            if let Some(hint) = &self.device_hint {
                tracing::warn!("No output device matching '{}', using default", hint);
            }
        }

        let device = match preferred {
            Some(device) => device,
            None => host
                .default_output_device()
                .ok_or(AudioError::DeviceNotFound)?,
        };
        let config = device.default_output_config()?.config();
        Ok((device, config))
    }

    fn open_session(&self, path: &Path, on_complete: CompletionNotifier) -> Result<CpalSession> {
        let audio = decode_file(path)?;
        let length = audio.duration();
        let (device, config) = self.device()?;

        let audio = resample(audio, config.sample_rate)?;
        tracing::debug!(
            path = %path.display(),
            rate = config.sample_rate,
            channels = config.channels,
            "Opening output session"
        );

        let output = OutputSession::open(device, config, audio, on_complete)?;
        Ok(CpalSession { output, length })
    }
}

impl AudioHost for CpalHost {
    fn open(
        &self,
        path: &Path,
        on_complete: CompletionNotifier,
    ) -> HostResult<Box<dyn AudioSession>> {
        let session = self.open_session(path, on_complete)?;
        Ok(Box::new(session))
    }
}

/// One decoded track on the output device
pub struct CpalSession {
    output: OutputSession,
    length: Duration,
}

impl AudioSession for CpalSession {
    fn start(&mut self) -> HostResult<()> {
        self.output.play().map_err(Into::into)
    }

    fn stop(&mut self) -> HostResult<()> {
        self.output.pause().map_err(Into::into)
    }

    fn close(&mut self) {
        self.output.close();
    }

    fn position(&self) -> Duration {
        self.output.position()
    }

    fn set_position(&mut self, position: Duration) -> HostResult<()> {
        self.output.seek(position);
        Ok(())
    }

    fn length(&self) -> Option<Duration> {
        Some(self.length.max(self.output.length()))
    }

    fn gain_range(&self) -> Option<GainRange> {
        Some(GainRange {
            min_db: MIN_GAIN_DB,
            max_db: MAX_GAIN_DB,
        })
    }

    fn set_gain_db(&mut self, db: f32) -> HostResult<()> {
        let amplitude = if db <= MIN_GAIN_DB {
            0.0
        } else {
            db_to_amplitude(db)
        };
        self.output.set_amplitude(amplitude);
        Ok(())
    }
}
