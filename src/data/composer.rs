// ============================================================
// Layer 4 — Text Composer
// ============================================================
// Builds the single string a learned classifier sees for one
// comparison, and derives the class label of a training row.
//
// Template (byte-exact, shared by training and inference):
//
//   Question: {prompt}
//
//   Response A: {response_a}
//
//   Response B: {response_b}
//
// Label derivation checks the A indicator, then B, and falls
// back to tie without checking the tie column. Rows with no
// indicator (or several) therefore resolve silently. Strict
// mode rejects them instead.

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;
use crate::domain::example::{PreferenceExample, Winner, WinnerIndicators};

pub const QUESTION_MARKER:   &str = "Question: ";
pub const RESPONSE_A_MARKER: &str = "\n\nResponse A: ";
pub const RESPONSE_B_MARKER: &str = "\n\nResponse B: ";

/// How training labels are derived from the winner columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// A, else B, else tie. Malformed rows become ties.
    #[default]
    Lenient,
    /// Exactly one indicator must be set.
    Strict,
}

/// The three sections recovered from a composed string.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposedParts<'a> {
    pub prompt:     &'a str,
    pub response_a: &'a str,
    pub response_b: &'a str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextComposer {
    mode: LabelMode,
}

impl TextComposer {
    pub fn new(mode: LabelMode) -> Self {
        Self { mode }
    }

    /// Concatenate prompt and responses with the fixed section labels.
    pub fn compose(&self, prompt: &str, response_a: &str, response_b: &str) -> String {
        format!("{QUESTION_MARKER}{prompt}{RESPONSE_A_MARKER}{response_a}{RESPONSE_B_MARKER}{response_b}")
    }

    pub fn compose_example(&self, example: &PreferenceExample) -> String {
        self.compose(&example.prompt, &example.response_a, &example.response_b)
    }

    /// Split a composed string back into its sections.
    ///
    /// Assumes the section markers do not occur inside the prompt
    /// or response A. Returns `None` when a marker is missing.
    #[cfg(test)]
    pub fn decompose<'a>(&self, composed: &'a str) -> Option<ComposedParts<'a>> {
        let rest     = composed.strip_prefix(QUESTION_MARKER)?;
        let a_at     = rest.find(RESPONSE_A_MARKER)?;
        let prompt   = &rest[..a_at];
        let rest     = &rest[a_at + RESPONSE_A_MARKER.len()..];
        let b_at     = rest.find(RESPONSE_B_MARKER)?;
        Some(ComposedParts {
            prompt,
            response_a: &rest[..b_at],
            response_b: &rest[b_at + RESPONSE_B_MARKER.len()..],
        })
    }

    /// Derive the winner of a training row from its indicator columns.
    pub fn label(&self, id: &str, indicators: WinnerIndicators) -> Result<Winner, PipelineError> {
        if self.mode == LabelMode::Strict && indicators.set_count() != 1 {
            return Err(PipelineError::MalformedRow {
                id:     id.to_string(),
                reason: format!(
                    "expected exactly one winner indicator, found {}",
                    indicators.set_count()
                ),
            });
        }

        Ok(if indicators.model_a {
            Winner::A
        } else if indicators.model_b {
            Winner::B
        } else {
            Winner::Tie
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_byte_exact() {
        let c = TextComposer::default();
        assert_eq!(
            c.compose("What is 2+2?", "4", "Four."),
            "Question: What is 2+2?\n\nResponse A: 4\n\nResponse B: Four."
        );
    }

    #[test]
    fn test_decompose_recovers_sections() {
        let c = TextComposer::default();
        let cases = [
            ("What is the capital of France?", "Paris is the capital of France.", "The capital is London."),
            ("", "", ""),
            ("multi\nline prompt", "line one\n\nline two", "Response A: quoted"),
        ];
        for (prompt, a, b) in cases {
            let composed = c.compose(prompt, a, b);
            let parts    = c.decompose(&composed).expect("composed text decomposes");
            assert_eq!(parts.prompt, prompt);
            assert_eq!(parts.response_a, a);
            assert_eq!(parts.response_b, b);
        }
    }

    #[test]
    fn test_decompose_rejects_foreign_text() {
        assert!(TextComposer::default().decompose("just some text").is_none());
    }

    #[test]
    fn test_label_order() {
        let c = TextComposer::default();
        let label = |a, b, t| c.label("x", WinnerIndicators::new(a, b, t)).unwrap();
        assert_eq!(label(true, false, false), Winner::A);
        assert_eq!(label(false, true, false), Winner::B);
        assert_eq!(label(false, false, true), Winner::Tie);
    }

    #[test]
    fn test_lenient_mode_falls_back_to_tie() {
        let c = TextComposer::new(LabelMode::Lenient);
        assert_eq!(c.label("x", WinnerIndicators::default()).unwrap(), Winner::Tie);
        // A takes precedence when several are set
        assert_eq!(
            c.label("x", WinnerIndicators::new(true, true, true)).unwrap(),
            Winner::A
        );
    }

    #[test]
    fn test_strict_mode_rejects_malformed_rows() {
        let c = TextComposer::new(LabelMode::Strict);
        let err = c.label("row-7", WinnerIndicators::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRow { ref id, .. } if id == "row-7"));
        assert!(c.label("row-8", WinnerIndicators::new(false, true, true)).is_err());
        assert_eq!(
            c.label("row-9", WinnerIndicators::new(false, false, true)).unwrap(),
            Winner::Tie
        );
    }
}
