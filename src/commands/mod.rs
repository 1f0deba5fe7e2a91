//! Application command handlers for parleur.
//!
//! # Commands
//! - `run`: the interactive recorder/transcriber app (default)
//! - `config`: open the configuration file in the user's preferred editor
//! - `list_devices`: list available audio input devices
//! - `logs`: display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod run;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use run::handle_run;
