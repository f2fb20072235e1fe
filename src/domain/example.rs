// ============================================================
// Layer 3 — PreferenceExample Domain Type
// ============================================================
// One row of the comparison data: a prompt, two candidate
// responses, and (for training rows only) which one a human
// rater preferred.
//
// Rows are created once at load time and never mutated.

use serde::{Deserialize, Serialize};

/// Which side a rater preferred.
///
/// The discriminants are the classifier labels:
///   0 = response A wins, 1 = response B wins, 2 = tie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    Tie,
}

impl Winner {
    /// All winners in label order
    pub const ALL: [Winner; 3] = [Winner::A, Winner::B, Winner::Tie];

    /// Integer class label used by the learned classifiers
    pub fn label(self) -> usize {
        match self {
            Winner::A   => 0,
            Winner::B   => 1,
            Winner::Tie => 2,
        }
    }
}

/// The three `{0,1}` winner columns of a training row, as read.
/// Mutual exclusivity is NOT guaranteed by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WinnerIndicators {
    pub model_a: bool,
    pub model_b: bool,
    pub tie:     bool,
}

impl WinnerIndicators {
    pub fn new(model_a: bool, model_b: bool, tie: bool) -> Self {
        Self { model_a, model_b, tie }
    }

    /// Number of indicators that are set
    pub fn set_count(&self) -> usize {
        [self.model_a, self.model_b, self.tie]
            .iter()
            .filter(|&&set| set)
            .count()
    }
}

/// A single comparison row.
/// `winner` is `Some` for training rows and `None` for evaluation rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceExample {
    /// Row identifier, kept verbatim so the output can echo it back
    pub id: String,

    /// The prompt both responses answer
    pub prompt: String,

    /// The first candidate response
    pub response_a: String,

    /// The second candidate response
    pub response_b: String,

    /// The rater's preference, absent on evaluation rows
    pub winner: Option<Winner>,
}

impl PreferenceExample {
    pub fn new(
        id:         impl Into<String>,
        prompt:     impl Into<String>,
        response_a: impl Into<String>,
        response_b: impl Into<String>,
        winner:     Option<Winner>,
    ) -> Self {
        Self {
            id:         id.into(),
            prompt:     prompt.into(),
            response_a: response_a.into(),
            response_b: response_b.into(),
            winner,
        }
    }
}

/// Count of each winner across a set of labelled rows, in label order.
pub fn winner_distribution(examples: &[PreferenceExample]) -> [usize; 3] {
    let mut counts = [0usize; 3];
    for winner in examples.iter().filter_map(|e| e.winner) {
        counts[winner.label()] += 1;
    }
    counts
}
