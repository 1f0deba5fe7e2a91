//! The recorder screen.
//!
//! Start/stop microphone recording with mutually exclusive controls. On stop
//! the captured chunks are assembled into a WAV artifact and saved under the
//! recordings directory. A failed start surfaces a notice and leaves the
//! state unchanged; stop while idle is a safe no-op.

use crate::capture::{AudioArtifact, CaptureSession};
use crate::config::AudioConfig;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};
use std::path::PathBuf;

/// State and controls for the recorder feature.
pub struct RecorderScreen {
    audio: AudioConfig,
    recordings_dir: PathBuf,
    /// The active capture session, if recording.
    session: Option<CaptureSession>,
    /// Last user-visible notice (device errors, save results).
    notice: Option<String>,
    /// Path and duration of the most recently saved clip.
    last_saved: Option<(PathBuf, f32)>,
}

impl RecorderScreen {
    pub fn new(audio: AudioConfig, recordings_dir: PathBuf) -> Self {
        Self {
            audio,
            recordings_dir,
            session: None,
            notice: None,
            last_saved: None,
        }
    }

    /// Whether a recording is in progress. Drives control enablement.
    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => self.start(),
            KeyCode::Char('s') => self.stop(),
            _ => {}
        }
    }

    /// Requests the microphone and begins capture.
    ///
    /// Ignored while already recording (the start control is disabled). On
    /// device failure the notice is set and the state stays idle.
    fn start(&mut self) {
        if self.session.is_some() {
            return;
        }

        match CaptureSession::open(&self.audio.device, self.audio.sample_rate, None) {
            Ok(session) => {
                tracing::info!("Recording started");
                self.session = Some(session);
                self.notice = None;
            }
            Err(e) => {
                tracing::error!("Failed to start recording: {e}");
                self.notice = Some(format!("Microphone unavailable: {e}"));
            }
        }
    }

    /// Stops capture, releases the microphone, and saves the clip.
    ///
    /// Calling stop when nothing is recording does nothing.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        let sample_rate = session.sample_rate();
        let chunks = session.stop();
        tracing::info!("Recording stopped");

        match AudioArtifact::assemble(&chunks, sample_rate) {
            Ok(Some(artifact)) => match artifact.save_into(&self.recordings_dir) {
                Ok(path) => {
                    self.last_saved = Some((path, artifact.duration_secs()));
                    self.notice = None;
                }
                Err(e) => {
                    tracing::error!("Failed to save clip: {e}");
                    self.notice = Some(format!("Failed to save clip: {e}"));
                }
            },
            Ok(None) => {
                self.notice = Some("Nothing captured".to_string());
            }
            Err(e) => {
                tracing::error!("Failed to encode clip: {e}");
                self.notice = Some(format!("Failed to encode clip: {e}"));
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

        let status = if let Some(session) = &self.session {
            let secs = session.sample_count() as f32 / session.sample_rate() as f32;
            Line::from(vec![
                Span::styled("● Recording ", Style::default().fg(Color::Red)),
                Span::raw(format!("{:02}:{:04.1}", (secs / 60.0) as u32, secs % 60.0)),
            ])
        } else {
            Line::from(Span::styled("Idle", Style::default().fg(Color::DarkGray)))
        };

        frame.render_widget(
            Paragraph::new(status).block(
                Block::default()
                    .borders(Borders::ALL)
                    .padding(Padding::horizontal(1))
                    .title(" Recorder "),
            ),
            chunks[0],
        );

        // Start/stop hints, mutually exclusive by state
        let enabled = Style::default().fg(Color::White);
        let disabled = Style::default().fg(Color::DarkGray);
        let recording = self.is_recording();
        let keys = Line::from(vec![
            Span::styled("[r] start recording", if recording { disabled } else { enabled }),
            Span::raw("    "),
            Span::styled("[s] stop recording", if recording { enabled } else { disabled }),
        ]);
        frame.render_widget(
            Paragraph::new(keys).block(Block::default().padding(Padding::horizontal(1))),
            chunks[1],
        );

        if let Some((path, duration)) = &self.last_saved {
            let saved = Line::from(vec![
                Span::styled("Saved: ", Style::default().fg(Color::Green)),
                Span::raw(format!("{} ({duration:.1}s)", path.display())),
            ]);
            frame.render_widget(
                Paragraph::new(saved).block(Block::default().padding(Padding::horizontal(1))),
                chunks[2],
            );
        }

        if let Some(notice) = &self.notice {
            frame.render_widget(
                Paragraph::new(notice.as_str())
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().padding(Padding::horizontal(1))),
                chunks[3],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> RecorderScreen {
        let dir = tempfile::tempdir().unwrap();
        RecorderScreen::new(AudioConfig::default(), dir.path().to_path_buf())
    }

    #[test]
    fn starts_idle() {
        assert!(!screen().is_recording());
    }

    #[test]
    fn stop_while_idle_is_a_safe_noop() {
        let mut screen = screen();
        screen.stop();
        screen.stop();
        assert!(!screen.is_recording());
        assert!(screen.last_saved.is_none());
    }

    #[test]
    fn failed_start_leaves_state_idle_with_notice() {
        let mut screen = screen();
        // A device spec that cannot resolve behaves like a denied microphone
        screen.audio.device = "no-such-device-for-tests".to_string();
        screen.start();
        assert!(!screen.is_recording());
        assert!(screen.notice.is_some());
    }
}
