//! The interactive recorder/transcriber app.
//!
//! Loads configuration, probes the speech-recognition capability, and hands
//! control to the TUI shell. A probe failure disables the transcriber with a
//! notice instead of aborting; only a broken config file is fatal.

use crate::config::ParleurConfig;
use crate::recognition::Recognizer;
use crate::ui::{self, Shell};

/// Launches the interactive app.
///
/// # Errors
/// - If the configuration file is malformed
/// - If the terminal cannot be initialized
pub async fn handle_run() -> Result<(), anyhow::Error> {
    tracing::info!("=== parleur started ===");

    let config = match ParleurConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/parleur/parleur.toml file and try again."
            );
            ui::show_fatal(&message)?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, language={}",
        config.audio.device,
        config.audio.sample_rate,
        config.recognition.language
    );

    // The recognizer is an optional capability: when probing fails the
    // transcriber screen is disabled with the reason, never a crash.
    let recognizer = match Recognizer::probe(&config.recognition) {
        Ok(recognizer) => Ok(recognizer),
        Err(e) => {
            tracing::warn!("Speech recognition unavailable: {e}");
            Err(e.to_string())
        }
    };

    let mut shell = Shell::new(config, recognizer)?;
    shell.run()?;

    tracing::info!("=== parleur exited ===");
    Ok(())
}
