// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Typed failures that other layers raise and the orchestrator
// inspects. They travel inside anyhow::Error; callers use
// `downcast_ref::<PipelineError>()` when they need to branch.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input file does not exist. Fatal.
    #[error("required input file not found: '{}'", path.display())]
    MissingInput { path: PathBuf },

    /// A training row whose winner columns are not mutually exclusive.
    /// Only raised in strict label mode.
    #[error("malformed row '{id}': {reason}")]
    MalformedRow { id: String, reason: String },

    /// A prediction backend cannot be built in this process.
    /// Not fatal: the orchestrator moves down the strategy order.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Classifier fitting failed. Fatal for the run.
    #[error("training failed: {0}")]
    TrainingFailure(String),

    /// A backend produced an output that violates the triple contract.
    #[error("invalid prediction for row {row}: {reason}")]
    InvalidPrediction { row: usize, reason: String },
}

impl PipelineError {
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// True for the one error kind that triggers strategy fallback
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DependencyUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_dependency_errors_are_recoverable() {
        assert!(PipelineError::DependencyUnavailable("burn".into()).is_recoverable());
        assert!(!PipelineError::TrainingFailure("nan".into()).is_recoverable());
        assert!(!PipelineError::missing_input("train.csv").is_recoverable());
    }

    #[test]
    fn test_missing_input_names_the_path() {
        let msg = PipelineError::missing_input("data/train.csv").to_string();
        assert!(msg.contains("data/train.csv"));
    }
}
