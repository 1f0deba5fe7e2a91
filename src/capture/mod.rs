//! Microphone capture for parleur.
//!
//! A [`CaptureSession`] pairs a live cpal input stream with the chunk buffer
//! it fills; an [`AudioArtifact`] is the WAV blob assembled from those chunks
//! once capture stops.

pub mod artifact;
pub mod session;

pub use artifact::AudioArtifact;
pub use session::CaptureSession;
