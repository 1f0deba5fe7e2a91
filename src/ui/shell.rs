//! The navigation shell.
//!
//! Owns the terminal and the two screens. Tab switches between them; all
//! other input goes to the active screen. Exiting stops any active session
//! so the microphone is always released.

use crate::config::ParleurConfig;
use crate::recognition::Recognizer;
use crate::ui::{RecorderScreen, TranscriberScreen};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Padding, Paragraph, Tabs},
};
use std::io::{self, Stdout};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveScreen {
    Recorder,
    Transcriber,
}

/// The tabbed application shell.
pub struct Shell {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: ActiveScreen,
    recorder: RecorderScreen,
    transcriber: TranscriberScreen,
    cleaned_up: bool,
}

impl Shell {
    /// Creates the shell and enters alternate screen mode.
    ///
    /// `recognizer` carries either the probed capability or the reason it is
    /// unavailable; the transcriber screen renders accordingly.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new(config: ParleurConfig, recognizer: Result<Recognizer, String>) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let recorder = RecorderScreen::new(
            config.audio.clone(),
            config.output.recordings_dir.clone(),
        );
        let transcriber = TranscriberScreen::new(
            config.audio,
            config.output.recordings_dir,
            recognizer,
        );

        Ok(Self {
            terminal,
            active: ActiveScreen::Recorder,
            recorder,
            transcriber,
            cleaned_up: false,
        })
    }

    /// Runs the event loop until the user exits.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.transcriber.tick();
            self.draw()?;

            if !event::poll(Duration::from_millis(50))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };

            // While editing the transcript, every key belongs to the field
            if self.active == ActiveScreen::Transcriber && self.transcriber.is_editing() {
                self.transcriber.handle_key(key);
                continue;
            }

            match key.code {
                KeyCode::Tab => {
                    self.active = match self.active {
                        ActiveScreen::Recorder => ActiveScreen::Transcriber,
                        ActiveScreen::Transcriber => ActiveScreen::Recorder,
                    };
                }
                KeyCode::Char('q') | KeyCode::Esc => break,
                _ => match self.active {
                    ActiveScreen::Recorder => self.recorder.handle_key(key),
                    ActiveScreen::Transcriber => self.transcriber.handle_key(key),
                },
            }
        }

        // Release the microphone before leaving
        self.recorder.stop();
        self.transcriber.stop_listening();

        self.cleanup()
    }

    fn draw(&mut self) -> Result<()> {
        let active = self.active;
        let recorder = &self.recorder;
        let transcriber = &self.transcriber;

        self.terminal.draw(|frame| {
            let area = frame.area();
            let chunks = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

            let tabs = Tabs::new(vec!["Recorder", "Transcriber"])
                .select(match active {
                    ActiveScreen::Recorder => 0,
                    ActiveScreen::Transcriber => 1,
                })
                .highlight_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                );
            frame.render_widget(tabs, chunks[0]);

            match active {
                ActiveScreen::Recorder => recorder.render(frame, chunks[1]),
                ActiveScreen::Transcriber => transcriber.render(frame, chunks[1]),
            }

            let hints = match active {
                ActiveScreen::Recorder => "Tab switch screen   r start   s stop   q quit",
                ActiveScreen::Transcriber => {
                    if transcriber.is_editing() {
                        "Enter/Esc finish editing"
                    } else {
                        "Tab switch screen   Space toggle listening   e edit   p play clip   q quit"
                    }
                }
            };
            frame.render_widget(
                Paragraph::new(hints)
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().padding(Padding::horizontal(1))),
                chunks[2],
            );
        })?;

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        self.cleaned_up = true;
        Ok(())
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
