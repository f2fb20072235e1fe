// ============================================================
// Layer 2 — BaselineUseCase
// ============================================================
// Training-free entry point: scores each evaluation pair with
// the HeuristicPredictor and writes the same submission format
// as the learned pipeline.
//
// The training file is optional. When present it is only used
// to report how well the heuristic matches the known winners.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::orchestrator::Prediction;
use crate::data::{
    composer::LabelMode,
    loader::{require_file, EvaluationCsv, TrainingCsv},
    submission::{write_submission, SubmissionRow},
};
use crate::domain::example::PreferenceExample;
use crate::domain::traits::ExampleSource;
use crate::infra::metrics;
use crate::ml::heuristic::HeuristicPredictor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    pub train_path:  Option<String>,
    pub test_path:   String,
    pub output_path: String,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            train_path:  Some("data/train.csv".to_string()),
            test_path:   "data/test.csv".to_string(),
            output_path: "submission.csv".to_string(),
        }
    }
}

/// Heuristic agreement with the training labels
#[derive(Debug, Clone, Copy)]
pub struct TrainingFit {
    pub rows:     usize,
    pub accuracy: f64,
    pub log_loss: f64,
}

#[derive(Debug, Clone)]
pub struct BaselineReport {
    pub training:    Option<TrainingFit>,
    pub predictions: Vec<Prediction>,
}

pub struct BaselineUseCase {
    config:    BaselineConfig,
    predictor: HeuristicPredictor,
}

impl BaselineUseCase {
    pub fn new(config: BaselineConfig) -> Self {
        Self { config, predictor: HeuristicPredictor::new() }
    }

    pub fn execute(&self) -> Result<BaselineReport> {
        let cfg = &self.config;
        tracing::debug!("Baseline config: {}", serde_json::to_string(cfg)?);

        require_file(cfg.test_path.as_ref())?;

        let training = match cfg.train_path.as_deref().map(Path::new) {
            Some(path) if path.is_file() => {
                let train = TrainingCsv::new(path, LabelMode::Lenient).load_all()?;
                self.training_fit(&train)
            }
            Some(path) => {
                tracing::info!("No training file at '{}', skipping accuracy report", path.display());
                None
            }
            None => None,
        };

        let eval        = EvaluationCsv::new(&cfg.test_path).load_all()?;
        let predictions = self.predict_all(&eval);

        let rows: Vec<SubmissionRow> = predictions
            .iter()
            .map(|p| SubmissionRow::new(p.id.clone(), p.probabilities))
            .collect();
        write_submission(cfg.output_path.as_ref(), &rows)?;

        Ok(BaselineReport { training, predictions })
    }

    fn predict_all(&self, examples: &[PreferenceExample]) -> Vec<Prediction> {
        examples
            .iter()
            .map(|e| Prediction {
                id:            e.id.clone(),
                probabilities: self.predictor.predict(&e.response_a, &e.response_b),
            })
            .collect()
    }

    fn training_fit(&self, train: &[PreferenceExample]) -> Option<TrainingFit> {
        let (triples, labels): (Vec<_>, Vec<_>) = train
            .iter()
            .filter_map(|e| {
                e.winner.map(|w| (self.predictor.predict(&e.response_a, &e.response_b), w.label()))
            })
            .unzip();

        let fit = TrainingFit {
            rows:     labels.len(),
            accuracy: metrics::accuracy(&triples, &labels)?,
            log_loss: metrics::log_loss(&triples, &labels)?,
        };
        tracing::info!(
            "Heuristic on {} training rows: accuracy={:.4} log_loss={:.4}",
            fit.rows, fit.accuracy, fit.log_loss
        );
        Some(fit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_data::SampleDataGenerator;
    use crate::data::submission::read_submission;
    use crate::domain::error::PipelineError;

    #[test]
    fn test_baseline_with_training_report() {
        let dir = tempfile::tempdir().unwrap();
        SampleDataGenerator::new(42).write(dir.path(), 30, 8).unwrap();

        let cfg = BaselineConfig {
            train_path:  Some(dir.path().join("train.csv").display().to_string()),
            test_path:   dir.path().join("test.csv").display().to_string(),
            output_path: dir.path().join("baseline.csv").display().to_string(),
        };
        let report = BaselineUseCase::new(cfg.clone()).execute().unwrap();

        let fit = report.training.unwrap();
        assert_eq!(fit.rows, 30);
        assert!((0.0..=1.0).contains(&fit.accuracy));
        assert!(fit.log_loss > 0.0);

        assert_eq!(report.predictions.len(), 8);
        assert_eq!(read_submission(cfg.output_path.as_ref()).unwrap().len(), 8);
    }

    #[test]
    fn test_baseline_without_training_file() {
        let dir = tempfile::tempdir().unwrap();
        SampleDataGenerator::new(7).write(dir.path(), 5, 4).unwrap();

        let cfg = BaselineConfig {
            train_path:  Some(dir.path().join("absent.csv").display().to_string()),
            test_path:   dir.path().join("test.csv").display().to_string(),
            output_path: dir.path().join("baseline.csv").display().to_string(),
        };
        let report = BaselineUseCase::new(cfg).execute().unwrap();
        assert!(report.training.is_none());
        assert_eq!(report.predictions.len(), 4);
    }

    #[test]
    fn test_baseline_requires_evaluation_file() {
        let cfg = BaselineConfig {
            train_path:  None,
            test_path:   "/nonexistent/test.csv".to_string(),
            output_path: "/nonexistent/out.csv".to_string(),
        };
        let err = BaselineUseCase::new(cfg).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingInput { .. })
        ));
    }
}
