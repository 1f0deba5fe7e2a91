//! Transcript accumulation state for the transcriber screen.
//!
//! Final segments append to a per-session buffer, each followed by a
//! separator space; the interim segment is wholly replaced on every event;
//! the displayed text is their concatenation. A manual edit overwrites the
//! displayed text verbatim without touching the buffers, so the next
//! recognition event overwrites the edit.

use crate::recognition::RecognitionEvent;

/// Mutable transcript state: accumulated finals, current interim, and the
/// text actually shown (which a user edit may have replaced).
#[derive(Debug, Default, Clone)]
pub struct TranscriptState {
    /// Concatenation of finalized segments, each followed by a space.
    /// Grows monotonically within one listening session.
    final_text: String,
    /// The most recent interim segment; replaced on every event.
    interim: String,
    /// Displayed text. Follows the buffers until a manual edit replaces it;
    /// the next event snaps it back to the buffers.
    text: String,
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the recognition buffers for a new listening session.
    ///
    /// The displayed text is kept; the first event of the new session
    /// overwrites it.
    pub fn begin_session(&mut self) {
        self.final_text.clear();
        self.interim.clear();
    }

    /// Applies one recognition event.
    ///
    /// Every final segment appends its best hypothesis plus a separator
    /// space; interim segments concatenate into the new interim portion.
    /// Relies on the engine delivering events in non-decreasing result-index
    /// order, so each final is appended exactly once and in spoken order.
    pub fn apply_event(&mut self, event: &RecognitionEvent) {
        let mut interim = String::new();

        for segment in &event.segments {
            if segment.is_final {
                self.final_text.push_str(segment.best());
                self.final_text.push(' ');
            } else {
                interim.push_str(segment.best());
            }
        }

        self.interim = interim;
        self.text = format!("{}{}", self.final_text, self.interim);
    }

    /// Replaces the displayed text wholesale (a manual edit).
    ///
    /// Not reconciled with the recognition buffers: a subsequent event
    /// overwrites the edit.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The displayed transcript.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::RecognitionSegment;

    fn event(result_index: usize, segments: Vec<RecognitionSegment>) -> RecognitionEvent {
        RecognitionEvent {
            result_index,
            segments,
        }
    }

    #[test]
    fn finals_accumulate_with_separator_spaces() {
        let mut state = TranscriptState::new();
        state.begin_session();

        state.apply_event(&event(
            0,
            vec![RecognitionSegment::final_text("Bonjour", 1.0)],
        ));
        state.apply_event(&event(
            1,
            vec![RecognitionSegment::final_text("le monde", 1.0)],
        ));

        assert_eq!(state.text(), "Bonjour le monde ");
    }

    #[test]
    fn final_and_interim_in_one_event_display_concatenated() {
        let mut state = TranscriptState::new();
        state.begin_session();

        state.apply_event(&event(
            0,
            vec![
                RecognitionSegment::final_text("Bonjour", 1.0),
                RecognitionSegment::interim("test", 0.5),
            ],
        ));

        assert_eq!(state.text(), "Bonjour test");
    }

    #[test]
    fn later_interim_replaces_previous_without_touching_finals() {
        let mut state = TranscriptState::new();
        state.begin_session();

        state.apply_event(&event(
            0,
            vec![
                RecognitionSegment::final_text("Bonjour", 1.0),
                RecognitionSegment::interim("test", 0.5),
            ],
        ));
        state.apply_event(&event(
            1,
            vec![RecognitionSegment::interim("test final", 0.5)],
        ));

        assert_eq!(state.text(), "Bonjour test final");
    }

    #[test]
    fn interim_cleared_when_event_has_no_interim() {
        let mut state = TranscriptState::new();
        state.begin_session();

        state.apply_event(&event(0, vec![RecognitionSegment::interim("bonj", 0.5)]));
        state.apply_event(&event(
            0,
            vec![RecognitionSegment::final_text("Bonjour", 1.0)],
        ));

        assert_eq!(state.text(), "Bonjour ");
    }

    #[test]
    fn manual_edit_persists_until_next_event() {
        let mut state = TranscriptState::new();
        state.begin_session();
        state.apply_event(&event(
            0,
            vec![RecognitionSegment::final_text("Bonjour", 1.0)],
        ));

        state.set_text("Salut tout le monde");
        assert_eq!(state.text(), "Salut tout le monde");

        // Idle code never mutates the text; only a new event does.
        state.apply_event(&event(
            1,
            vec![RecognitionSegment::final_text("encore", 1.0)],
        ));
        assert_eq!(state.text(), "Bonjour encore ");
    }

    #[test]
    fn begin_session_resets_buffers_but_keeps_display() {
        let mut state = TranscriptState::new();
        state.begin_session();
        state.apply_event(&event(
            0,
            vec![RecognitionSegment::final_text("Bonjour", 1.0)],
        ));

        state.begin_session();
        assert_eq!(state.text(), "Bonjour ");

        state.apply_event(&event(
            0,
            vec![RecognitionSegment::final_text("Rebonjour", 1.0)],
        ));
        assert_eq!(state.text(), "Rebonjour ");
    }
}
