//! Whole-file decoding with Symphonia
//!
//! Tracks are decoded up front into interleaved stereo f32 so the output
//! callback only copies samples. Every Symphonia sample type goes through
//! the same interleaving helper; only the normalization differs.

use crate::error::{AudioError, Result};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Output is always two interleaved channels
pub const CHANNELS: usize = 2;

/// Decoded PCM, interleaved stereo
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Samples, `L R L R ...`
    pub samples: Vec<f32>,
    /// Frames per second
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    /// Playing time
    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.sample_rate)
    }
}

/// Convert a frame count into a duration at `sample_rate`
pub fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / f64::from(sample_rate))
}

/// Decode the whole file at `path`
///
/// Unknown containers and codecs come back as
/// [`AudioError::UnsupportedFormat`]. Individual corrupt packets are skipped.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| AudioError::UnsupportedFormat("no audio track".into()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::UnsupportedFormat("unknown sample rate".into()))?;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    if let Some(frames) = track.codec_params.n_frames {
        samples.reserve(usize::try_from(frames).unwrap_or(0) * CHANNELS);
    }

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_stereo(decoded, &mut samples),
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::debug!(
        path = %path.display(),
        sample_rate,
        frames = samples.len() / CHANNELS,
        "Decoded"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Interleave a planar buffer as stereo, duplicating mono
fn interleave_stereo<T, F>(
    buf: &symphonia::core::audio::AudioBuffer<T>,
    normalize: F,
    out: &mut Vec<f32>,
) where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    if channels == 0 {
        return;
    }
    let left = buf.chan(0);
    let right = buf.chan(if channels > 1 { 1 } else { 0 });

    out.reserve(buf.frames() * CHANNELS);
    for (l, r) in left.iter().zip(right) {
        out.push(normalize(*l));
        out.push(normalize(*r));
    }
}

fn append_stereo(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => interleave_stereo(&buf, |s| s, out),
        AudioBufferRef::F64(buf) => interleave_stereo(&buf, |s| s as f32, out),
        AudioBufferRef::S8(buf) => {
            interleave_stereo(&buf, |s| f32::from(s) / f32::from(i8::MAX), out);
        }
        AudioBufferRef::S16(buf) => {
            interleave_stereo(&buf, |s| f32::from(s) / f32::from(i16::MAX), out);
        }
        AudioBufferRef::S24(buf) => {
            interleave_stereo(&buf, |s| s.inner() as f32 / 8_388_607.0, out);
        }
        AudioBufferRef::S32(buf) => interleave_stereo(&buf, |s| s as f32 / i32::MAX as f32, out),
        AudioBufferRef::U8(buf) => {
            interleave_stereo(&buf, |s| f32::from(s) / f32::from(u8::MAX) * 2.0 - 1.0, out);
        }
        AudioBufferRef::U16(buf) => {
            interleave_stereo(&buf, |s| f32::from(s) / f32::from(u16::MAX) * 2.0 - 1.0, out);
        }
        AudioBufferRef::U24(buf) => {
            interleave_stereo(&buf, |s| s.inner() as f32 / 16_777_215.0 * 2.0 - 1.0, out);
        }
        AudioBufferRef::U32(buf) => {
            interleave_stereo(&buf, |s| s as f32 / u32::MAX as f32 * 2.0 - 1.0, out);
        }
    }
}

/// Resample to `target_rate`
///
/// Returns the input unchanged when the rates already match.
pub fn resample(audio: DecodedAudio, target_rate: u32) -> Result<DecodedAudio> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
        WindowFunction,
    };

    if audio.sample_rate == target_rate || audio.samples.is_empty() {
        return Ok(audio);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    // Work in 0.1 s chunks so long tracks do not need one giant filter pass
    let chunk_frames = (audio.sample_rate as usize / 10).max(1);
    let ratio = f64::from(target_rate) / f64::from(audio.sample_rate);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_frames, CHANNELS)
        .map_err(|e| AudioError::ResampleError(e.to_string()))?;

    let frames = audio.frames();
    let mut out = Vec::with_capacity((frames as f64 * ratio) as usize * CHANNELS + CHANNELS);
    let mut offset = 0;

    while offset < frames {
        let take = chunk_frames.min(frames - offset);
        let mut planar = vec![vec![0.0_f32; chunk_frames]; CHANNELS];
        for i in 0..take {
            for (ch, plane) in planar.iter_mut().enumerate() {
                plane[i] = audio.samples[(offset + i) * CHANNELS + ch];
            }
        }

        let resampled = resampler
            .process(&planar, None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;

        // The final chunk is zero padded; keep only its share of output.
        let keep = if take == chunk_frames {
            resampled[0].len()
        } else {
            ((take as f64) * ratio).round() as usize
        };
        for i in 0..keep.min(resampled[0].len()) {
            for plane in &resampled {
                out.push(plane[i]);
            }
        }
        offset += take;
    }

    Ok(DecodedAudio {
        samples: out,
        sample_rate: target_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(
        dir: &TempDir,
        name: &str,
        rate: u32,
        channels: u16,
        frames: u32,
    ) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            for _ in 0..channels {
                let value = ((i as f32 / 20.0).sin() * 8000.0) as i16;
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn decodes_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(&dir, "tone.wav", 44_100, 2, 44_100);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.sample_rate, 44_100);
        assert_eq!(audio.frames(), 44_100);
        assert_eq!(audio.duration(), Duration::from_secs(1));
        assert!(audio.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn mono_is_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(&dir, "mono.wav", 8_000, 1, 800);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.frames(), 800);
        for frame in audio.samples.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn garbage_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        std::fs::write(&path, b"this is not audio at all").unwrap();

        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(_)), "{err:?}");
    }

    #[test]
    fn missing_file_is_io() {
        let err = decode_file(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, AudioError::Io(_)));
    }

    #[test]
    fn resample_scales_length() {
        let audio = DecodedAudio {
            samples: vec![0.25; 22_050 * CHANNELS],
            sample_rate: 22_050,
        };

        let out = resample(audio, 44_100).unwrap();
        assert_eq!(out.sample_rate, 44_100);
        let frames = out.frames() as i64;
        assert!((frames - 44_100).abs() < 2_000, "got {frames} frames");
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let audio = DecodedAudio {
            samples: vec![0.5, -0.5, 0.1, -0.1],
            sample_rate: 48_000,
        };
        let out = resample(audio.clone(), 48_000).unwrap();
        assert_eq!(out.samples, audio.samples);
    }
}
