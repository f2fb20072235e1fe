// ============================================================
// Layer 3 — ProbabilityTriple Domain Type
// ============================================================
// The single output contract shared by every prediction
// strategy: (p_a, p_b, p_tie), each in [0, 1], summing to 1.

use serde::{Deserialize, Serialize};

use crate::domain::example::Winner;

/// Default tolerance when checking that a triple sums to 1
pub const SUM_TOLERANCE: f64 = 1e-6;

/// A probability distribution over {A wins, B wins, tie}.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityTriple {
    pub a:   f64,
    pub b:   f64,
    pub tie: f64,
}

impl ProbabilityTriple {
    pub const fn new(a: f64, b: f64, tie: f64) -> Self {
        Self { a, b, tie }
    }

    /// Numerically stable softmax over raw class scores in label order.
    /// Every learned backend routes its output through here.
    pub fn from_logits(logits: [f64; 3]) -> Self {
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps = logits.map(|z| (z - max).exp());
        let total: f64 = exps.iter().sum();
        Self::new(exps[0] / total, exps[1] / total, exps[2] / total)
    }

    /// Components in label order (A, B, tie)
    pub fn as_array(&self) -> [f64; 3] {
        [self.a, self.b, self.tie]
    }

    pub fn sum(&self) -> f64 {
        self.a + self.b + self.tie
    }

    /// The same distribution with the A and B components exchanged
    #[cfg(test)]
    pub fn swap_ab(&self) -> Self {
        Self::new(self.b, self.a, self.tie)
    }

    /// Probability assigned to one outcome
    pub fn probability_of(&self, winner: Winner) -> f64 {
        self.as_array()[winner.label()]
    }

    /// Most likely outcome. Equal components resolve toward A, then B.
    pub fn argmax(&self) -> Winner {
        Winner::ALL.into_iter().fold(Winner::A, |best, w| {
            if self.probability_of(w) > self.probability_of(best) { w } else { best }
        })
    }

    /// True when every component is in [0, 1] and the sum is within `tolerance` of 1
    pub fn is_valid(&self, tolerance: f64) -> bool {
        self.as_array()
            .iter()
            .all(|p| p.is_finite() && (0.0..=1.0).contains(p))
            && (self.sum() - 1.0).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_logits_is_distribution() {
        let t = ProbabilityTriple::from_logits([2.0, -1.0, 0.5]);
        assert!(t.is_valid(1e-12));
        assert!(t.a > t.tie && t.tie > t.b);
    }

    #[test]
    fn test_from_logits_large_values_stay_finite() {
        let t = ProbabilityTriple::from_logits([1000.0, 999.0, -1000.0]);
        assert!(t.is_valid(1e-12));
        assert_eq!(t.tie, 0.0);
    }

    #[test]
    fn test_equal_logits_are_uniform() {
        let t = ProbabilityTriple::from_logits([0.3, 0.3, 0.3]);
        assert!((t.a - 1.0 / 3.0).abs() < 1e-12);
        assert!((t.tie - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_swap_ab() {
        let t = ProbabilityTriple::new(0.5, 0.2, 0.3).swap_ab();
        assert_eq!(t, ProbabilityTriple::new(0.2, 0.5, 0.3));
    }

    #[test]
    fn test_argmax_prefers_a_on_ties() {
        assert_eq!(ProbabilityTriple::new(0.4, 0.4, 0.2).argmax(), Winner::A);
        assert_eq!(ProbabilityTriple::new(0.2, 0.2, 0.6).argmax(), Winner::Tie);
        assert_eq!(ProbabilityTriple::new(0.1, 0.6, 0.3).argmax(), Winner::B);
    }

    #[test]
    fn test_is_valid_rejects_bad_triples() {
        assert!(!ProbabilityTriple::new(0.5, 0.5, 0.5).is_valid(SUM_TOLERANCE));
        assert!(!ProbabilityTriple::new(-0.1, 0.6, 0.5).is_valid(SUM_TOLERANCE));
        assert!(!ProbabilityTriple::new(f64::NAN, 0.5, 0.5).is_valid(SUM_TOLERANCE));
    }
}
