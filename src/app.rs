//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the appropriate
//! command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A terminal microphone recorder and live speech-to-text transcriber
#[derive(Parser)]
#[command(name = "parleur")]
#[command(version)]
#[command(about = "Record microphone audio and transcribe speech live, in your terminal")]
#[command(
    long_about = "parleur is a two-screen terminal application:\n\
    \n\
    - Recorder: capture microphone audio and save the clip as a WAV file.\n\
    - Transcriber: live continuous speech recognition (French by default)\n\
      with an editable transcript, recording the audio alongside.\n\
    \n\
    Press Tab inside the app to switch between the two screens.\n\
    \n\
    EXAMPLES:\n\
        # Open the interactive app (default command)\n\
        $ parleur\n\
        \n\
        # List audio input devices for the config file\n\
        $ parleur list-devices\n\
        \n\
        # Edit the configuration\n\
        $ parleur config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/parleur/parleur.toml\n    Recordings:         ~/.local/share/parleur/recordings\n    Logs:               ~/.local/state/parleur/parleur.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive recorder/transcriber app (default)
    ///
    /// Tab switches between the Recorder and the Transcriber screens.
    /// Escape or 'q' exits.
    Run,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in parleur.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Open configuration file in your preferred editor
    ///
    /// Edit the audio device, recognition language and model, and output
    /// settings. Uses $EDITOR or falls back to nano/vim.
    #[command(visible_alias = "c")]
    Config,

    /// Generate shell completion script
    ///
    /// Generate a completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "parleur", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Run) => {
            commands::handle_run().await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
