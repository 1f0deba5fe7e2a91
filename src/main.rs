mod app;
mod capture;
mod commands;
mod config;
mod logging;
mod playback;
mod recognition;
mod transcript;
mod ui;

use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
