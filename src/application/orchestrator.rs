// ============================================================
// Layer 2 — Pipeline Orchestrator
// ============================================================
// Picks one learned strategy per run and drives it:
//
//   Capabilities ──► RESOLUTION_ORDER ──► build_strategy
//                                             │
//        DependencyUnavailable ◄──────────────┤ (try next entry)
//                                             ▼
//   compose texts ─► strategy.fit ─► strategy.predict ─► validate
//
// Resolution order (first satisfied predicate wins):
//   1. FineTunedAccelerated  fine-tuning available and accelerated
//   2. FineTunedCpu          fine-tuning available
//   3. Linear                always
//
// Capabilities are passed in by the caller; nothing here reads
// the process environment.

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::application::predict_use_case::{FineTuneConfig, LinearConfig};
use crate::data::composer::{LabelMode, TextComposer};
use crate::data::tfidf::TfidfVectorizer;
use crate::domain::{
    error::PipelineError,
    example::PreferenceExample,
    traits::PredictionStrategy,
    triple::{ProbabilityTriple, SUM_TOLERANCE},
};
use crate::ml::{logistic::LogisticRegression, strategy::PairedStrategy};

// ─── Capabilities ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Fine-tuning libraries can be used in this process
    pub finetune:    bool,
    /// Accelerated compute is available
    pub accelerated: bool,
}

impl Capabilities {
    pub fn new(finetune: bool, accelerated: bool) -> Self {
        Self { finetune, accelerated }
    }

    /// Fine-tuning is available only when compiled in and not switched off.
    pub fn detect(finetune_requested: bool, accelerated: bool) -> Self {
        Self::new(cfg!(feature = "finetune") && finetune_requested, accelerated)
    }
}

// ─── Resolution table ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrategyKind {
    FineTunedAccelerated,
    FineTunedCpu,
    Linear,
}

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::FineTunedAccelerated => "fine-tuned transformer (accelerated)",
            Self::FineTunedCpu         => "fine-tuned transformer (cpu)",
            Self::Linear               => "tf-idf + logistic regression",
        }
    }
}

type Predicate = fn(&Capabilities) -> bool;

fn finetune_accelerated(c: &Capabilities) -> bool { c.finetune && c.accelerated }
fn finetune_any(c: &Capabilities) -> bool { c.finetune }
fn always(_: &Capabilities) -> bool { true }

pub const RESOLUTION_ORDER: [(StrategyKind, Predicate); 3] = [
    (StrategyKind::FineTunedAccelerated, finetune_accelerated),
    (StrategyKind::FineTunedCpu,         finetune_any),
    (StrategyKind::Linear,               always),
];

/// Every strategy whose predicate holds, in priority order.
pub fn candidates(caps: &Capabilities) -> Vec<StrategyKind> {
    RESOLUTION_ORDER
        .iter()
        .filter(|(_, holds)| holds(caps))
        .map(|(kind, _)| *kind)
        .collect()
}

/// The strategy the table selects for `caps`, before any build is attempted.
pub fn resolve(caps: &Capabilities) -> StrategyKind {
    candidates(caps).first().copied().unwrap_or(StrategyKind::Linear)
}

/// Construct the strategy for `kind`.
/// Fails with DependencyUnavailable when the kind was not compiled in.
pub fn build_strategy(
    kind:      StrategyKind,
    linear:    &LinearConfig,
    fine_tune: &FineTuneConfig,
) -> Result<Box<dyn PredictionStrategy>> {
    match kind {
        StrategyKind::Linear => Ok(Box::new(PairedStrategy::new(
            kind.name(),
            TfidfVectorizer::new(linear.tfidf),
            LogisticRegression::new(linear.logistic),
        ))),
        StrategyKind::FineTunedAccelerated => {
            fine_tuned::build::<fine_tuned::Accelerated>(kind.name(), fine_tune)
        }
        StrategyKind::FineTunedCpu => fine_tuned::build::<fine_tuned::Cpu>(kind.name(), fine_tune),
    }
}

#[cfg(feature = "finetune")]
mod fine_tuned {
    use std::path::PathBuf;

    use anyhow::Result;
    use burn::tensor::backend::AutodiffBackend;

    use crate::application::predict_use_case::FineTuneConfig;
    use crate::data::token_features::TokenFeatures;
    use crate::domain::traits::PredictionStrategy;
    use crate::ml::classifier::{AcceleratedBackend, CpuBackend, FineTunedClassifier};
    use crate::ml::strategy::PairedStrategy;

    pub type Accelerated = AcceleratedBackend;
    pub type Cpu         = CpuBackend;

    pub fn build<B: AutodiffBackend>(name: &str, cfg: &FineTuneConfig) -> Result<Box<dyn PredictionStrategy>> {
        let features = TokenFeatures {
            max_seq_len: cfg.max_seq_len,
            vocab_size:  cfg.vocab_size,
            pretrained:  cfg.tokenizer.as_ref().map(PathBuf::from),
        };
        Ok(Box::new(PairedStrategy::new(
            name,
            features,
            FineTunedClassifier::<B>::new(cfg.clone()),
        )))
    }
}

#[cfg(not(feature = "finetune"))]
mod fine_tuned {
    use anyhow::Result;

    use crate::application::predict_use_case::FineTuneConfig;
    use crate::domain::{error::PipelineError, traits::PredictionStrategy};

    pub struct Accelerated;
    pub struct Cpu;

    pub fn build<B>(name: &str, _cfg: &FineTuneConfig) -> Result<Box<dyn PredictionStrategy>> {
        Err(PipelineError::DependencyUnavailable(format!(
            "{name}: built without the `finetune` feature"
        ))
        .into())
    }
}

// ─── Orchestrator ─────────────────────────────────────────────────────────────
/// One evaluation row's output
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id:            String,
    pub probabilities: ProbabilityTriple,
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub strategy:    StrategyKind,
    pub predictions: Vec<Prediction>,
}

pub struct PipelineOrchestrator {
    capabilities: Capabilities,
    linear:       LinearConfig,
    fine_tune:    FineTuneConfig,
    composer:     TextComposer,
}

impl PipelineOrchestrator {
    pub fn new(capabilities: Capabilities, linear: LinearConfig, fine_tune: FineTuneConfig) -> Self {
        Self {
            capabilities,
            linear,
            fine_tune,
            composer: TextComposer::new(LabelMode::Lenient),
        }
    }

    /// Walk the resolution table, skipping entries whose dependencies are
    /// unavailable. Any other build error is returned as-is.
    pub fn select(&self) -> Result<(StrategyKind, Box<dyn PredictionStrategy>)> {
        let preferred = resolve(&self.capabilities);
        for kind in candidates(&self.capabilities) {
            match build_strategy(kind, &self.linear, &self.fine_tune) {
                Ok(strategy) => {
                    if kind != preferred {
                        tracing::warn!("Using {} instead of {}", strategy.name(), preferred.name());
                    }
                    tracing::info!("Selected strategy: {}", strategy.name());
                    return Ok((kind, strategy));
                }
                Err(e) if e.downcast_ref::<PipelineError>().is_some_and(PipelineError::is_recoverable) => {
                    tracing::warn!("{} unavailable, falling back: {}", kind.name(), e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(anyhow!("No prediction strategy could be built"))
    }

    /// Fit on `train`, predict `eval`, one validated triple per eval row in order.
    pub fn run(&self, train: &[PreferenceExample], eval: &[PreferenceExample]) -> Result<PipelineRun> {
        if train.is_empty() {
            return Err(PipelineError::TrainingFailure("training set is empty".into()).into());
        }

        let train_texts: Vec<String> = train.iter().map(|e| self.composer.compose_example(e)).collect();
        let labels = train
            .iter()
            .map(|e| {
                e.winner.map(|w| w.label()).ok_or_else(|| {
                    PipelineError::TrainingFailure(format!("training row '{}' has no label", e.id))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let eval_texts: Vec<String> = eval.iter().map(|e| self.composer.compose_example(e)).collect();

        let (kind, mut strategy) = self.select()?;

        tracing::info!("Fitting on {} training rows", train_texts.len());
        strategy.fit(&train_texts, &labels)?;

        tracing::info!("Predicting {} evaluation rows", eval_texts.len());
        let triples = strategy.predict(&eval_texts)?;

        let predictions = Self::assemble(eval, triples)?;
        Ok(PipelineRun { strategy: kind, predictions })
    }

    /// Pair triples with row ids, rejecting any count mismatch or invalid triple.
    fn assemble(eval: &[PreferenceExample], triples: Vec<ProbabilityTriple>) -> Result<Vec<Prediction>> {
        if triples.len() != eval.len() {
            return Err(PipelineError::InvalidPrediction {
                row:    triples.len().min(eval.len()),
                reason: format!("{} predictions for {} rows", triples.len(), eval.len()),
            }
            .into());
        }

        eval.iter()
            .zip(triples)
            .enumerate()
            .map(|(row, (example, p))| {
                if !p.is_valid(SUM_TOLERANCE) {
                    return Err(PipelineError::InvalidPrediction {
                        row,
                        reason: format!("({}, {}, {}) is not a distribution", p.a, p.b, p.tie),
                    }
                    .into());
                }
                Ok(Prediction { id: example.id.clone(), probabilities: p })
            })
            .collect()
    }
}
