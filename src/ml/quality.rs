// ============================================================
// Layer 5 — Quality Scorer
// ============================================================
// Text-only heuristic proxy for response quality. Scores one
// response in isolation, never looking at the prompt or the
// other response.
//
// Terms (fixed weights):
//   word count        min(words / 10, 5.0)
//   punctuation       min(count of . , ! ? ; : / 5, 2.0)
//   capitalised start +1.0
//   contains a digit  +1.0
//   fewer than 3 words -2.0
//   shouting (all caps, > 10 chars) -1.0
//
// The sum is floored at 0.0.

use std::sync::LazyLock;

use regex::Regex;

const PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("static regex"));

/// Stateless scorer; `score` is a pure function of its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Quality score for a single response, always `>= 0.0`.
    pub fn score(&self, text: &str) -> f64 {
        let word_count = text.split_whitespace().count();
        let mut score  = 0.0f64;

        score += (word_count as f64 / 10.0).min(5.0);

        let punctuation = text.chars().filter(|c| PUNCTUATION.contains(c)).count();
        score += (punctuation as f64 / 5.0).min(2.0);

        if text.chars().next().is_some_and(char::is_uppercase) {
            score += 1.0;
        }

        if DIGIT.is_match(text) {
            score += 1.0;
        }

        if word_count < 3 {
            score -= 2.0;
        }

        if is_all_caps(text) && text.chars().count() > 10 {
            score -= 1.0;
        }

        score.max(0.0)
    }
}

/// At least one cased character and no lowercase ones.
fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(QualityScorer::new().score(""), 0.0);
    }

    #[test]
    fn test_never_negative() {
        let s = QualityScorer::new();
        for text in ["", " ", "no", "OK!", "AAAAAAAAAAAAAAAAAAAA", "\n\t", "x y"] {
            assert!(s.score(text) >= 0.0, "negative score for {text:?}");
        }
    }

    #[test]
    fn test_known_sentence() {
        // 6 words → 0.6, one period → 0.2, capital → 1.0
        let s = QualityScorer::new().score("Paris is the capital of France.");
        assert!((s - 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_word_term_is_capped() {
        let long = "word ".repeat(200);
        // 200 words → capped at 5.0, lowercase start, no punctuation
        assert!((QualityScorer::new().score(&long) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_punctuation_term_is_capped() {
        let text = "a b c ,,,,,,,,,,,,,,,,,,,,,,,,";
        // 4 words → 0.4, punctuation capped at 2.0
        assert!((QualityScorer::new().score(text) - 2.4).abs() < 1e-12);
    }

    #[test]
    fn test_digit_bonus() {
        let s = QualityScorer::new();
        let with    = s.score("bake for 12 minutes");
        let without = s.score("bake for twelve minutes");
        assert!((with - without - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_caps_penalty() {
        let s = QualityScorer::new();
        // 4 words → 0.4, capital → 1.0, all caps and > 10 chars → -1.0
        assert!((s.score("THIS IS VERY LOUD") - 0.4).abs() < 1e-12);
        // Short all-caps text is not penalised
        assert!((s.score("YES NO OK") - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_brevity_penalty_floors_at_zero() {
        // 2 words → 0.2 + capital 1.0 - 2.0 → floored
        assert_eq!(QualityScorer::new().score("Hi there"), 0.0);
    }
}
