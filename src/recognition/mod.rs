//! Continuous speech recognition for the transcriber screen.
//!
//! The engine is an optional capability resolved at startup: [`Recognizer::probe`]
//! succeeds only when the crate is built with the `whisper` feature and the
//! configured model file exists. When probing fails the transcriber feature is
//! disabled with a notice; nothing panics.
//!
//! A running [`RecognitionSession`] delivers [`RecognitionEvent`]s over a
//! channel. Events carry a non-decreasing result index; segments the engine
//! marks final will not change further, while interim segments are provisional
//! and fully replaced by the next event.

pub mod engine;

pub use engine::{RecognitionSession, Recognizer};

/// One recognized hypothesis for a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionAlternative {
    pub transcript: String,
    /// 0.0 - 1.0, engine's confidence in this hypothesis.
    pub confidence: f32,
}

/// A recognized stretch of speech, either settled or still revisable.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSegment {
    /// Hypotheses ordered best-first. Never empty.
    pub alternatives: Vec<RecognitionAlternative>,
    /// True once the engine asserts the text will not change further.
    pub is_final: bool,
}

impl RecognitionSegment {
    pub fn final_text(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative {
                transcript: transcript.into(),
                confidence,
            }],
            is_final: true,
        }
    }

    pub fn interim(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative {
                transcript: transcript.into(),
                confidence,
            }],
            is_final: false,
        }
    }

    /// Best hypothesis text.
    pub fn best(&self) -> &str {
        self.alternatives
            .first()
            .map(|a| a.transcript.as_str())
            .unwrap_or("")
    }
}

/// One delivery from the recognition engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionEvent {
    /// Index of the utterance the segments belong to. Non-decreasing across
    /// the events of one session; advances when an utterance is finalized.
    pub result_index: usize,
    pub segments: Vec<RecognitionSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_best_returns_first_alternative() {
        let seg = RecognitionSegment {
            alternatives: vec![
                RecognitionAlternative {
                    transcript: "bonjour".to_string(),
                    confidence: 0.9,
                },
                RecognitionAlternative {
                    transcript: "bon jour".to_string(),
                    confidence: 0.4,
                },
            ],
            is_final: true,
        };
        assert_eq!(seg.best(), "bonjour");
    }

    #[test]
    fn segment_best_is_empty_for_no_alternatives() {
        let seg = RecognitionSegment {
            alternatives: Vec::new(),
            is_final: false,
        };
        assert_eq!(seg.best(), "");
    }

    #[test]
    fn constructors_set_finality() {
        assert!(RecognitionSegment::final_text("a", 1.0).is_final);
        assert!(!RecognitionSegment::interim("a", 1.0).is_final);
    }
}
