//! The transcriber screen.
//!
//! One toggle switches between idle and listening. While listening, the
//! capture stream feeds both the chunk buffer and the recognition engine;
//! recognition events update the transcript (finals accumulate, the interim
//! portion is replaced). On stop the captured audio becomes a saved WAV clip
//! with a playback affordance. The transcript field is editable at all times;
//! a subsequent recognition event overwrites the edit.

use crate::capture::{AudioArtifact, CaptureSession};
use crate::config::AudioConfig;
use crate::playback;
use crate::recognition::{RecognitionSession, Recognizer};
use crate::transcript::TranscriptState;
use crossterm::event::{Event, KeyCode, KeyEvent};
use crossbeam_channel::bounded;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};
use std::path::PathBuf;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Capacity of the capture-to-recognizer frame tap. The audio callback drops
/// frames rather than block when the recognizer falls behind.
const TAP_CAPACITY: usize = 64;

/// State and controls for the live transcription feature.
pub struct TranscriberScreen {
    audio: AudioConfig,
    recordings_dir: PathBuf,
    /// The probed recognition capability; `None` when unavailable.
    recognizer: Option<Recognizer>,
    /// Why the capability is unavailable, for the on-screen banner.
    unavailable: Option<String>,
    /// Active capture session while listening.
    session: Option<CaptureSession>,
    /// Active recognition session while listening.
    recognition: Option<RecognitionSession>,
    transcript: TranscriptState,
    /// Editable field mirroring the transcript text outside of edit mode.
    input: Input,
    editing: bool,
    notice: Option<String>,
    /// Last assembled clip and where it was saved.
    artifact: Option<(AudioArtifact, PathBuf)>,
}

impl TranscriberScreen {
    pub fn new(
        audio: AudioConfig,
        recordings_dir: PathBuf,
        recognizer: Result<Recognizer, String>,
    ) -> Self {
        let (recognizer, unavailable) = match recognizer {
            Ok(recognizer) => (Some(recognizer), None),
            Err(reason) => (None, Some(reason)),
        };

        Self {
            audio,
            recordings_dir,
            recognizer,
            unavailable,
            session: None,
            recognition: None,
            transcript: TranscriptState::new(),
            input: Input::default(),
            editing: false,
            notice: None,
            artifact: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Drains pending recognition events into the transcript.
    ///
    /// Called every frame by the shell. Events overwrite the displayed text
    /// (including any manual edit in progress, as the contract demands).
    pub fn tick(&mut self) {
        let Some(recognition) = &self.recognition else {
            return;
        };

        let mut updated = false;
        for event in recognition.events().try_iter() {
            tracing::debug!(
                "Recognition event: index={}, segments={}",
                event.result_index,
                event.segments.len()
            );
            self.transcript.apply_event(&event);
            updated = true;
        }

        if updated {
            self.input = Input::new(self.transcript.text().to_string());
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.editing {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.transcript.set_text(self.input.value());
                    self.editing = false;
                }
                _ => {
                    self.input.handle_event(&Event::Key(key));
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char(' ') => self.toggle(),
            KeyCode::Char('e') => self.editing = true,
            KeyCode::Char('p') => self.play(),
            _ => {}
        }
    }

    /// The single toggle between idle and listening.
    fn toggle(&mut self) {
        if self.is_listening() {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    /// Opens the microphone and starts recognition plus recording.
    ///
    /// On failure the notice is set and everything previous (transcript,
    /// artifact) is left untouched.
    fn start_listening(&mut self) {
        let Some(recognizer) = &self.recognizer else {
            self.notice = self
                .unavailable
                .clone()
                .or_else(|| Some("Speech recognition is unavailable".to_string()));
            return;
        };

        let (tap_tx, tap_rx) = bounded(TAP_CAPACITY);

        match CaptureSession::open(&self.audio.device, self.audio.sample_rate, Some(tap_tx)) {
            Ok(session) => {
                self.transcript.begin_session();
                self.recognition = Some(recognizer.start_session(session.sample_rate(), tap_rx));
                self.session = Some(session);
                self.notice = None;
                tracing::info!("Listening started");
            }
            Err(e) => {
                tracing::error!("Failed to start listening: {e}");
                self.notice = Some(format!("Microphone unavailable: {e}"));
            }
        }
    }

    /// Releases the microphone, signals recognition to wind down, and
    /// assembles the captured audio into a saved clip.
    ///
    /// The capture session goes first so the hardware is freed right away;
    /// stopping it also closes the frame tap, and the recognizer finishes in
    /// the background without ever blocking the toggle. Safe to call while
    /// idle.
    pub fn stop_listening(&mut self) {
        let captured = self.session.take().map(|mut session| {
            let sample_rate = session.sample_rate();
            (session.stop(), sample_rate)
        });

        if let Some(mut recognition) = self.recognition.take() {
            recognition.stop();
        }

        let Some((chunks, sample_rate)) = captured else {
            return;
        };
        tracing::info!("Listening stopped");

        match AudioArtifact::assemble(&chunks, sample_rate) {
            Ok(Some(artifact)) => match artifact.save_into(&self.recordings_dir) {
                Ok(path) => {
                    self.artifact = Some((artifact, path));
                }
                Err(e) => {
                    tracing::error!("Failed to save clip: {e}");
                    self.notice = Some(format!("Failed to save clip: {e}"));
                }
            },
            Ok(None) => {
                // Nothing captured: keep the previous artifact, if any
            }
            Err(e) => {
                tracing::error!("Failed to encode clip: {e}");
                self.notice = Some(format!("Failed to encode clip: {e}"));
            }
        }
    }

    fn play(&mut self) {
        if let Some((_, path)) = &self.artifact {
            if let Err(e) = playback::play_file(path) {
                self.notice = Some(format!("Playback failed: {e}"));
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(area);

        let status = if self.unavailable.is_some() {
            Line::from(Span::styled(
                "Speech recognition unavailable",
                Style::default().fg(Color::Yellow),
            ))
        } else if self.is_listening() {
            Line::from(vec![
                Span::styled("● Listening ", Style::default().fg(Color::Red)),
                Span::styled(
                    format!("({})", self.audio.device),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else {
            Line::from(Span::styled("Idle", Style::default().fg(Color::DarkGray)))
        };

        frame.render_widget(
            Paragraph::new(status).block(
                Block::default()
                    .borders(Borders::ALL)
                    .padding(Padding::horizontal(1))
                    .title(" Transcriber "),
            ),
            chunks[0],
        );

        // Transcript field: highlighted border while editing
        let border_style = if self.editing {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let transcript_text = if self.editing {
            self.input.value()
        } else {
            self.transcript.text()
        };
        let placeholder = transcript_text.is_empty();
        let body = if placeholder {
            Span::styled(
                "Votre transcription apparaîtra ici...",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(transcript_text)
        };
        frame.render_widget(
            Paragraph::new(Line::from(body))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .padding(Padding::horizontal(1))
                        .title(if self.editing {
                            " Transcript (editing) "
                        } else {
                            " Transcript "
                        }),
                ),
            chunks[1],
        );

        if self.editing {
            // Place the terminal cursor at the input position
            let inner_width = chunks[1].width.saturating_sub(4) as usize;
            if inner_width > 0 {
                let cursor = self.input.visual_cursor();
                let x = chunks[1].x + 2 + (cursor % inner_width) as u16;
                let y = chunks[1].y + 1 + (cursor / inner_width) as u16;
                frame.set_cursor_position((x, y));
            }
        }

        if let Some((artifact, path)) = &self.artifact {
            let line = Line::from(vec![
                Span::styled("Clip: ", Style::default().fg(Color::Green)),
                Span::raw(format!(
                    "{} ({:.1}s, {} bytes)",
                    path.display(),
                    artifact.duration_secs(),
                    artifact.size_bytes()
                )),
            ]);
            frame.render_widget(
                Paragraph::new(line).block(Block::default().padding(Padding::horizontal(1))),
                chunks[2],
            );
        }

        let footer = if let Some(notice) = &self.notice {
            Line::from(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Yellow),
            ))
        } else if let Some(reason) = &self.unavailable {
            Line::from(Span::styled(
                reason.as_str(),
                Style::default().fg(Color::Yellow),
            ))
        } else {
            Line::default()
        };
        frame.render_widget(
            Paragraph::new(footer)
                .wrap(Wrap { trim: true })
                .block(Block::default().padding(Padding::horizontal(1))),
            chunks[3],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn unavailable_screen() -> TranscriberScreen {
        let dir = tempfile::tempdir().unwrap();
        TranscriberScreen::new(
            AudioConfig::default(),
            dir.path().to_path_buf(),
            Err("model missing".to_string()),
        )
    }

    #[test]
    fn toggle_without_capability_stays_idle_with_notice() {
        let mut screen = unavailable_screen();
        screen.transcript.set_text("previous transcript");

        screen.handle_key(KeyEvent::from(KeyCode::Char(' ')));

        assert!(!screen.is_listening());
        assert!(screen.notice.is_some());
        // Previous transcript and artifact are untouched
        assert_eq!(screen.transcript.text(), "previous transcript");
        assert!(screen.artifact.is_none());
    }

    #[test]
    fn stop_while_idle_is_a_safe_noop() {
        let mut screen = unavailable_screen();
        screen.stop_listening();
        screen.stop_listening();
        assert!(!screen.is_listening());
    }

    #[test]
    fn manual_edit_commits_to_transcript() {
        let mut screen = unavailable_screen();

        screen.handle_key(KeyEvent::from(KeyCode::Char('e')));
        assert!(screen.is_editing());

        screen.handle_key(KeyEvent::from(KeyCode::Char('o')));
        screen.handle_key(KeyEvent::from(KeyCode::Char('u')));
        screen.handle_key(KeyEvent::from(KeyCode::Char('i')));
        screen.handle_key(KeyEvent::from(KeyCode::Enter));

        assert!(!screen.is_editing());
        assert_eq!(screen.transcript.text(), "oui");
    }

    #[test]
    fn edit_persists_while_idle() {
        let mut screen = unavailable_screen();
        screen.transcript.set_text("édité à la main");

        // Nothing running: ticks never mutate the transcript
        screen.tick();
        screen.tick();

        assert_eq!(screen.transcript.text(), "édité à la main");
    }
}
