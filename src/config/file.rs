//! Configuration file management for parleur.
//!
//! Configuration is stored as TOML in the user's config directory. A missing
//! file yields the defaults; a malformed file is an error the caller surfaces.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for the system default device
    /// - numeric index (0, 1, 2, etc.) from `parleur list-devices`
    /// - device name from `parleur list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested sample rate in Hz (16000 recommended for speech recognition).
    /// The device may record at a different rate; the actual rate is used.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

/// Speech recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Whisper language code for the spoken language (e.g., "fr", "en").
    #[serde(default = "default_language")]
    pub language: String,
    /// Path to the whisper model file. When the file is missing, the
    /// transcriber feature is reported as unavailable and disabled.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// How often to run interim inference on the current utterance, in ms.
    #[serde(default = "default_interim_interval_ms")]
    pub interim_interval_ms: u64,
    /// How long the input must stay silent before the current utterance is
    /// finalized, in ms.
    #[serde(default = "default_endpoint_silence_ms")]
    pub endpoint_silence_ms: u64,
    /// RMS level (0.0 - 1.0) below which a frame counts as silence.
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            model_path: default_model_path(),
            interim_interval_ms: default_interim_interval_ms(),
            endpoint_silence_ms: default_endpoint_silence_ms(),
            silence_threshold: default_silence_threshold(),
        }
    }
}

fn default_language() -> String {
    "fr".to_string()
}

fn default_model_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache/parleur/models/ggml-base.bin")
}

fn default_interim_interval_ms() -> u64 {
    900
}

fn default_endpoint_silence_ms() -> u64 {
    700
}

fn default_silence_threshold() -> f32 {
    0.012
}

/// Output configuration for saved audio artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory where recorded clips are saved.
    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            recordings_dir: default_recordings_dir(),
        }
    }
}

fn default_recordings_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local/share/parleur/recordings")
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleurConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ParleurConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// A missing config file yields the defaults (and writes them out so
    /// `parleur config` has something to edit).
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: ParleurConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating the parent directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_path = home.join(".config").join("parleur").join("parleur.toml");

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ParleurConfig::default();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.recognition.language, "fr");
        assert_eq!(config.recognition.interim_interval_ms, 900);
        assert_eq!(config.recognition.endpoint_silence_ms, 700);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: ParleurConfig = toml::from_str("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.recognition.language, "fr");
    }

    #[test]
    fn partial_toml_fills_missing_fields() {
        let config: ParleurConfig = toml::from_str(
            r#"
            [audio]
            device = "2"

            [recognition]
            language = "en"
            "#,
        )
        .unwrap();
        assert_eq!(config.audio.device, "2");
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.recognition.language, "en");
        assert_eq!(config.recognition.endpoint_silence_ms, 700);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = ParleurConfig::default();
        config.audio.device = "USB Microphone".to_string();
        config.recognition.silence_threshold = 0.02;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: ParleurConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.audio.device, "USB Microphone");
        assert!((parsed.recognition.silence_threshold - 0.02).abs() < f32::EPSILON);
    }
}
