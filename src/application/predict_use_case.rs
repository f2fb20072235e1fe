// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Runs the learned pipeline end to end:
//
//   Step 1: Check both input files exist    (Layer 4 - data)
//   Step 2: Load training + evaluation rows (Layer 4 - data)
//   Step 3: Log the winner distribution     (Layer 3 - domain)
//   Step 4: Resolve strategy, fit, predict  (Layer 2 - orchestrator)
//   Step 5: Write the submission CSV        (Layer 4 - data)
//
// Nothing is written unless every evaluation row received a
// valid probability triple.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::orchestrator::{Capabilities, PipelineOrchestrator, PipelineRun};
use crate::data::{
    composer::LabelMode,
    loader::{require_file, EvaluationCsv, TrainingCsv},
    submission::{write_submission, SubmissionRow},
    tfidf::TfidfConfig,
};
use crate::domain::example::{winner_distribution, Winner};
use crate::domain::traits::ExampleSource;
use crate::ml::logistic::LogisticConfig;

// ─── Linear strategy configuration ────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearConfig {
    pub tfidf:    TfidfConfig,
    pub logistic: LogisticConfig,
}

// ─── Fine-tuning configuration ────────────────────────────────────────────────
// Hyperparameters for the transformer strategies. The model
// dimensions describe the encoder that is initialised (and
// optionally overwritten by --encoder-weights) before training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTuneConfig {
    /// Pretrained tokenizer.json; built from the corpus when absent
    pub tokenizer:           Option<String>,
    /// CompactRecorder file with pretrained encoder weights
    pub encoder_weights:     Option<String>,
    pub vocab_size:          usize,
    pub max_seq_len:         usize,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub eval_batch_size:     usize,
    pub lr:                  f64,
    pub weight_decay:        f64,
    pub warmup_steps:        usize,
    pub validation_fraction: f64,
    pub seed:                u64,
    pub d_model:             usize,
    pub num_heads:           usize,
    pub num_layers:          usize,
    pub d_ff:                usize,
    pub dropout:             f64,
    /// Directory for per-epoch metrics.csv
    pub metrics_dir:         Option<String>,
}

impl Default for FineTuneConfig {
    fn default() -> Self {
        Self {
            tokenizer:           None,
            encoder_weights:     None,
            vocab_size:          30522,
            max_seq_len:         512,
            epochs:              3,
            batch_size:          8,
            eval_batch_size:     16,
            lr:                  5e-5,
            weight_decay:        0.01,
            warmup_steps:        500,
            validation_fraction: 0.1,
            seed:                42,
            d_model:             256,
            num_heads:           8,
            num_layers:          6,
            d_ff:                1024,
            dropout:             0.1,
            metrics_dir:         None,
        }
    }
}

// ─── Pipeline configuration ───────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub train_path:  String,
    pub test_path:   String,
    pub output_path: String,
    pub label_mode:  LabelMode,
    /// False declares the fine-tuning libraries unavailable
    pub finetune:    bool,
    pub accelerated: bool,
    pub linear:      LinearConfig,
    pub fine_tune:   FineTuneConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_path:  "data/train.csv".to_string(),
            test_path:   "data/test.csv".to_string(),
            output_path: "submission.csv".to_string(),
            label_mode:  LabelMode::default(),
            finetune:    true,
            accelerated: false,
            linear:      LinearConfig::default(),
            fine_tune:   FineTuneConfig::default(),
        }
    }
}

// ─── PredictUseCase ───────────────────────────────────────────────────────────
pub struct PredictUseCase {
    config: PipelineConfig,
}

impl PredictUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PipelineRun> {
        let cfg = &self.config;
        tracing::debug!("Pipeline config: {}", serde_json::to_string(cfg)?);

        // ── Step 1: Both inputs must exist before any work starts ─────────────
        require_file(cfg.train_path.as_ref())?;
        require_file(cfg.test_path.as_ref())?;

        // ── Step 2: Load rows ─────────────────────────────────────────────────
        let train = TrainingCsv::new(&cfg.train_path, cfg.label_mode).load_all()?;
        let eval  = EvaluationCsv::new(&cfg.test_path).load_all()?;
        tracing::info!("Loaded {} training rows and {} evaluation rows", train.len(), eval.len());

        // ── Step 3: Winner distribution ───────────────────────────────────────
        let counts = winner_distribution(&train);
        tracing::info!(
            "Winner distribution: A={} B={} tie={}",
            counts[Winner::A.label()],
            counts[Winner::B.label()],
            counts[Winner::Tie.label()],
        );

        // ── Step 4: Strategy selection, training, prediction ──────────────────
        let capabilities = Capabilities::detect(cfg.finetune, cfg.accelerated);
        tracing::info!(
            "Capabilities: finetune={} accelerated={}",
            capabilities.finetune, capabilities.accelerated
        );
        let orchestrator = PipelineOrchestrator::new(capabilities, cfg.linear, cfg.fine_tune.clone());
        let run = orchestrator.run(&train, &eval)?;

        // ── Step 5: Submission ────────────────────────────────────────────────
        let rows: Vec<SubmissionRow> = run
            .predictions
            .iter()
            .map(|p| SubmissionRow::new(p.id.clone(), p.probabilities))
            .collect();
        write_submission(cfg.output_path.as_ref(), &rows)?;

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::orchestrator::StrategyKind;
    use crate::data::sample_data::SampleDataGenerator;
    use crate::data::submission::read_submission;
    use crate::domain::error::PipelineError;
    use crate::domain::triple::SUM_TOLERANCE;

    fn linear_config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            train_path:  dir.join("train.csv").display().to_string(),
            test_path:   dir.join("test.csv").display().to_string(),
            output_path: dir.join("out/submission.csv").display().to_string(),
            finetune:    false,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_linear_submission() {
        let dir = tempfile::tempdir().unwrap();
        SampleDataGenerator::new(42).write(dir.path(), 100, 20).unwrap();

        let cfg = linear_config(dir.path());
        let run = PredictUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(run.strategy, StrategyKind::Linear);

        let written = read_submission(cfg.output_path.as_ref()).unwrap();
        assert_eq!(written.len(), 20);

        let eval = EvaluationCsv::new(&cfg.test_path).load_all().unwrap();
        for (row, example) in written.iter().zip(&eval) {
            assert_eq!(row.id, example.id);
            assert!((row.probabilities().sum() - 1.0).abs() <= SUM_TOLERANCE);
        }
    }

    #[test]
    fn test_missing_training_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        SampleDataGenerator::new(42).write(dir.path(), 10, 5).unwrap();
        std::fs::remove_file(dir.path().join("train.csv")).unwrap();

        let cfg = linear_config(dir.path());
        let err = PredictUseCase::new(cfg.clone()).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingInput { .. })
        ));
        assert!(!std::path::Path::new(&cfg.output_path).exists());
    }
}
