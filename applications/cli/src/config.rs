/// Player configuration
use crate::error::{CliError, Result};
use harbor_playback::{PlaybackConfig, MAX_SAMPLE_INTERVAL, MIN_SAMPLE_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "harbor.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_library")]
    pub library: LibrarySettings,

    #[serde(default)]
    pub audio: AudioSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Scanned when no paths are given on the command line
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// File extensions treated as playable (lowercase, no dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AudioSettings {
    /// Substring of the output device name
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        default_library()
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `harbor.toml` is read if
    /// present. `HARBOR_*` variables override file values
    /// (e.g. `HARBOR_PLAYBACK__INITIAL_VOLUME=0.4`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with HARBOR_)
        settings = settings.add_source(
            config::Environment::with_prefix("HARBOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let volume = self.playback.initial_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(CliError::Config(format!(
                "playback.initial_volume must be within 0.0-1.0, got {volume}"
            )));
        }

        let interval = self.playback.sample_interval_ms;
        let (min, max) = (
            MIN_SAMPLE_INTERVAL.as_millis(),
            MAX_SAMPLE_INTERVAL.as_millis(),
        );
        if !(min..=max).contains(&u128::from(interval)) {
            tracing::warn!(
                "playback.sample_interval_ms {} outside {}-{}, clamping",
                interval,
                min,
                max
            );
        }

        let artwork = &self.playback.artwork;
        if artwork.backdrop_width == 0 {
            return Err(CliError::Config(
                "playback.artwork.backdrop_width must be positive".to_string(),
            ));
        }

        if self.library.extensions.is_empty() {
            return Err(CliError::Config(
                "library.extensions must name at least one extension".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_library() -> LibrarySettings {
    LibrarySettings {
        directories: Vec::new(),
        extensions: default_extensions(),
    }
}

fn default_extensions() -> Vec<String> {
    ["mp3", "flac", "ogg", "wav", "m4a", "aac", "opus"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.playback.sample_interval_ms, 200);
        assert!(config.library.extensions.contains(&"flac".to_string()));
    }

    #[test]
    fn loads_file_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[playback]
initial_volume = 0.4
sample_interval_ms = 100

[playback.artwork]
blur_radius = 4

[library]
directories = ["/music"]
extensions = ["flac"]

[audio]
device = "USB"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert!((config.playback.initial_volume - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.playback.sample_interval_ms, 100);
        assert_eq!(config.playback.artwork.blur_radius, 4);
        assert_eq!(config.playback.artwork.blur_passes, 6);
        assert_eq!(config.library.directories, vec![PathBuf::from("/music")]);
        assert_eq!(config.library.extensions, vec!["flac".to_string()]);
        assert_eq!(config.audio.device.as_deref(), Some("USB"));
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let mut config = AppConfig::default();
        config.playback.initial_volume = 1.5;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nope/harbor.toml"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
