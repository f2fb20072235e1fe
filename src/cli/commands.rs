// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands:
//   predict      — learned pipeline (fine-tuned or linear)
//   baseline     — heuristic scorer, no training
//   sample-data  — write a small synthetic train/test pair
//
// Defaults mirror the application configs so a bare
// `predict` behaves exactly like PipelineConfig::default().
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    baseline_use_case::BaselineConfig,
    predict_use_case::{FineTuneConfig, LinearConfig, PipelineConfig},
};
use crate::data::{composer::LabelMode, tfidf::TfidfConfig};
use crate::ml::logistic::LogisticConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on the labelled CSV and write probabilities for the evaluation CSV
    Predict(PredictArgs),

    /// Score the evaluation CSV with the training-free heuristic
    Baseline(BaselineArgs),

    /// Write reproducible synthetic train.csv / test.csv files
    SampleData(SampleDataArgs),
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Labelled training CSV
    #[arg(long, default_value = "data/train.csv")]
    pub train: String,

    /// Evaluation CSV to predict
    #[arg(long, default_value = "data/test.csv")]
    pub test: String,

    /// Where to write the submission CSV
    #[arg(long, default_value = "submission.csv")]
    pub output: String,

    /// Reject training rows that do not set exactly one winner column
    #[arg(long)]
    pub strict_labels: bool,

    /// Treat the fine-tuning libraries as unavailable (forces the linear strategy)
    #[arg(long)]
    pub no_finetune: bool,

    /// Accelerated compute is available
    #[arg(long, env = "PREFERENCE_ACCELERATED")]
    pub accelerated: bool,

    // ── Linear strategy ──────────────────────────────────────────────────────
    /// Vocabulary cap for the TF-IDF features
    #[arg(long, default_value_t = 5000)]
    pub max_features: usize,

    /// Iteration cap for logistic regression
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    // ── Fine-tuned strategy ──────────────────────────────────────────────────
    /// Pretrained tokenizer.json (otherwise built from the training rows)
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Pretrained encoder weights saved with CompactRecorder
    #[arg(long)]
    pub encoder_weights: Option<String>,

    /// Directory for the per-epoch metrics.csv
    #[arg(long)]
    pub metrics_dir: Option<String>,

    /// Vocabulary cap for a tokenizer built from the corpus
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    /// Maximum tokens per input: [CLS] text [SEP] + padding
    #[arg(long, default_value_t = 512)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 16)]
    pub eval_batch_size: usize,

    /// Peak learning rate reached at the end of warm-up
    #[arg(long, default_value_t = 5e-5)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    #[arg(long, default_value_t = 500)]
    pub warmup_steps: usize,

    /// Share of training rows held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub validation_fraction: f64,

    /// Seed for splits, shuffling, and initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Hidden dimension of the encoder
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

impl From<PredictArgs> for PipelineConfig {
    fn from(a: PredictArgs) -> Self {
        PipelineConfig {
            train_path:  a.train,
            test_path:   a.test,
            output_path: a.output,
            label_mode:  if a.strict_labels { LabelMode::Strict } else { LabelMode::Lenient },
            finetune:    !a.no_finetune,
            accelerated: a.accelerated,
            linear: LinearConfig {
                tfidf:    TfidfConfig { max_features: a.max_features, ..TfidfConfig::default() },
                logistic: LogisticConfig { max_iter: a.max_iter, seed: a.seed, ..LogisticConfig::default() },
            },
            fine_tune: FineTuneConfig {
                tokenizer:           a.tokenizer,
                encoder_weights:     a.encoder_weights,
                vocab_size:          a.vocab_size,
                max_seq_len:         a.max_seq_len,
                epochs:              a.epochs,
                batch_size:          a.batch_size,
                eval_batch_size:     a.eval_batch_size,
                lr:                  a.lr,
                weight_decay:        a.weight_decay,
                warmup_steps:        a.warmup_steps,
                validation_fraction: a.validation_fraction,
                seed:                a.seed,
                d_model:             a.d_model,
                num_heads:           a.num_heads,
                num_layers:          a.num_layers,
                d_ff:                a.d_ff,
                dropout:             a.dropout,
                metrics_dir:         a.metrics_dir,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct BaselineArgs {
    /// Labelled CSV used only for the accuracy report (skipped if absent)
    #[arg(long, default_value = "data/train.csv")]
    pub train: String,

    /// Evaluation CSV to score
    #[arg(long, default_value = "data/test.csv")]
    pub test: String,

    #[arg(long, default_value = "submission.csv")]
    pub output: String,
}

impl From<BaselineArgs> for BaselineConfig {
    fn from(a: BaselineArgs) -> Self {
        BaselineConfig {
            train_path:  Some(a.train),
            test_path:   a.test,
            output_path: a.output,
        }
    }
}

#[derive(Args, Debug)]
pub struct SampleDataArgs {
    /// Directory that receives train.csv and test.csv
    #[arg(long, default_value = "data")]
    pub out_dir: String,

    #[arg(long, default_value_t = 100)]
    pub train_rows: usize,

    #[arg(long, default_value_t = 20)]
    pub test_rows: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
