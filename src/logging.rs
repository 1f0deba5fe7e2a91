//! File-based tracing setup.
//!
//! Logs go to daily-rotated files under the XDG state directory, never to
//! the terminal (which belongs to the TUI). The `RUST_LOG` variable selects
//! the filter; old rotations beyond a week are deleted at startup.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// Rotated files past this count are removed at startup.
const KEPT_ROTATIONS: usize = 7;

/// Keeps the non-blocking writer flushing for the program's lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Installs the global subscriber writing to `parleur.log.*` files.
///
/// Filter defaults to "info" when `RUST_LOG` is unset.
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> Result<()> {
    let log_dir = get_log_dir()?;

    if let Err(e) = prune_rotations(&log_dir) {
        eprintln!("Warning: could not prune old logs: {e}");
    }

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&log_dir, "parleur.log"));
    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow!("Logging already initialized"))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging to {}", log_dir.display());
    Ok(())
}

/// The per-user log directory: `$XDG_STATE_HOME/parleur`, falling back to
/// `~/.local/state/parleur`. Created if missing.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the directory cannot be created
pub fn get_log_dir() -> Result<PathBuf> {
    let log_dir = match std::env::var("XDG_STATE_HOME") {
        Ok(state) => PathBuf::from(state).join("parleur"),
        Err(_) => dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?
            .join(".local/state/parleur"),
    };
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Deletes all but the newest `KEPT_ROTATIONS` rotated log files.
///
/// Rotation suffixes are dates (`parleur.log.YYYY-MM-DD`), so sorting file
/// names descending orders them newest first.
fn prune_rotations(log_dir: &Path) -> Result<()> {
    let mut rotations: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let rotated = path.file_name()?.to_str()?.starts_with("parleur.log.");
            rotated.then_some(path)
        })
        .collect();

    rotations.sort();
    rotations.reverse();

    for stale in rotations.iter().skip(KEPT_ROTATIONS) {
        if let Err(e) = fs::remove_file(stale) {
            tracing::warn!("Could not delete old log file {}: {}", stale.display(), e);
        }
    }

    Ok(())
}
