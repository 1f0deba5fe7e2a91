//! Configuration management for parleur.
//!
//! Handles loading and saving application configuration from a TOML file in
//! the user's config directory.

pub mod file;

pub use file::{AudioConfig, OutputConfig, ParleurConfig, RecognitionConfig};
