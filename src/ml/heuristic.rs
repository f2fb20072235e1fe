// ============================================================
// Layer 5 — Heuristic Predictor
// ============================================================
// Turns two quality scores into a probability triple without
// any training. Total: every pair of strings yields a valid
// triple.
//
//   diff < 1.0         → (0.2, 0.2, 0.6)  near-tie
//   score_a > score_b  → (c, (1-c)/2, (1-c)/2)
//   otherwise          → ((1-c)/2, c, (1-c)/2)
//
//   where c = min(diff / 5.0, 0.8)

use crate::domain::triple::ProbabilityTriple;
use crate::ml::quality::QualityScorer;

/// Score gap below which the pair is treated as a near-tie
pub const TIE_MARGIN: f64 = 1.0;

/// Output for the near-tie regime
pub const NEAR_TIE: ProbabilityTriple = ProbabilityTriple::new(0.2, 0.2, 0.6);

/// Upper bound on the winner's probability
pub const MAX_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPredictor {
    scorer: QualityScorer,
}

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self { scorer: QualityScorer::new() }
    }

    pub fn predict(&self, response_a: &str, response_b: &str) -> ProbabilityTriple {
        let score_a = self.scorer.score(response_a);
        let score_b = self.scorer.score(response_b);
        let diff    = (score_a - score_b).abs();

        if diff < TIE_MARGIN {
            return NEAR_TIE;
        }

        let confidence = (diff / 5.0).min(MAX_CONFIDENCE);
        let rest       = (1.0 - confidence) / 2.0;

        tracing::trace!(score_a, score_b, confidence, "heuristic decision");

        if score_a > score_b {
            ProbabilityTriple::new(confidence, rest, rest)
        } else {
            ProbabilityTriple::new(rest, confidence, rest)
        }
    }
}
