//! Terminal user interface for parleur.
//!
//! The [`Shell`] owns the terminal and switches between the two screens:
//! the recorder and the live transcriber.

pub mod error;
pub mod recorder;
pub mod shell;
pub mod transcriber;

pub use error::show_fatal;
pub use recorder::RecorderScreen;
pub use shell::Shell;
pub use transcriber::TranscriberScreen;
