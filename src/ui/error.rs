//! Full-screen display for fatal, human-readable error messages.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};
use std::io;
use std::time::Duration;

/// Shows an error message on a full red screen and waits for a key press.
///
/// Used for unrecoverable startup problems (e.g., a malformed config file)
/// before the main shell is running.
///
/// # Errors
/// - If the terminal cannot be initialized or rendered to
pub fn show_fatal(message: &str) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = show_loop(&mut terminal, message);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn show_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    message: &str,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();

            let background = Block::default().style(Style::default().bg(Color::Red));
            frame.render_widget(background, area);

            let text_area = Rect {
                x: area.x + area.width / 10,
                y: area.height / 3,
                width: (area.width * 8) / 10,
                height: area.height.saturating_sub(area.height / 3),
            };

            let paragraph = Paragraph::new(message)
                .style(Style::default().fg(Color::White).bg(Color::Red))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });

            frame.render_widget(paragraph, text_area);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(_) = event::read()? {
                return Ok(());
            }
        }
    }
}
