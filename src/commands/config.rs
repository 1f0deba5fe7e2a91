//! Configuration file editor command.

use crate::config::{file::config_path, ParleurConfig};
use anyhow::{anyhow, Result};
use std::process::Command;

/// Opens the configuration file in an editor: `$EDITOR` if set, otherwise
/// the first of nano and vi found on the PATH.
///
/// # Errors
/// - If no editor can be found
/// - If the editor fails to launch or exits with an error
pub fn handle_config() -> Result<()> {
    // Loading writes the default file if none exists yet
    let _ = ParleurConfig::load()?;
    let config_path = config_path()?;

    let editor = pick_editor()?;
    tracing::info!("Editing {} with {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| anyhow!("Failed to launch editor '{editor}': {e}"))?;

    if !status.success() {
        return Err(anyhow!(
            "Editor exited with status {}",
            status.code().unwrap_or(-1)
        ));
    }

    Ok(())
}

fn pick_editor() -> Result<String> {
    if let Some(editor) = std::env::var("EDITOR").ok().filter(|e| !e.is_empty()) {
        return Ok(editor);
    }

    ["nano", "vi"]
        .iter()
        .find(|editor| on_path(editor))
        .map(|editor| editor.to_string())
        .ok_or_else(|| anyhow!("No editor found. Set the $EDITOR environment variable."))
}

fn on_path(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
