//! Playing back saved clips with the system audio player.

use anyhow::{anyhow, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Launches the system audio player on the given file without waiting.
///
/// On macOS: uses `open`. On Linux: tries `xdg-open` first, then falls back
/// to common audio players. The player runs detached so the TUI keeps its
/// terminal.
///
/// # Errors
/// - If the file does not exist
/// - If no player can be launched
pub fn play_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("Audio file not found: {}", path.display()));
    }

    tracing::info!("Playing {}", path.display());

    #[cfg(target_os = "macos")]
    {
        spawn_detached("open", path)?;
        return Ok(());
    }

    #[cfg(target_os = "linux")]
    {
        if spawn_detached("xdg-open", path).is_ok() {
            return Ok(());
        }

        for player in ["mpv", "ffplay", "paplay", "aplay"] {
            if spawn_detached(player, path).is_ok() {
                return Ok(());
            }
        }

        return Err(anyhow!(
            "No audio player found. Install mpv, ffplay, paplay, or aplay"
        ));
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    Err(anyhow!("Playback is not supported on this platform"))
}

/// Spawns a player with its output detached from the terminal.
fn spawn_detached(program: &str, path: &Path) -> Result<()> {
    Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("Failed to launch {program}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_file_fails_for_missing_file() {
        let result = play_file(Path::new("/nonexistent/clip.wav"));
        assert!(result.is_err());
    }
}
