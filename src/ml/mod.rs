// ============================================================
// Layer 5 — ML Layer
// ============================================================
// Everything that turns features into probability triples.
//
//   quality.rs    — hand-written response quality score
//   heuristic.rs  — score gap → triple, no training
//   logistic.rs   — multinomial logistic regression (sparse input)
//   strategy.rs   — FeatureBackend + ClassifierBackend as one strategy
//
// Compiled only with the `finetune` feature (Burn):
//
//   model.rs      — transformer encoder with a 3-way [CLS] head
//   trainer.rs    — AdamW fine-tuning loop with validation
//   classifier.rs — the encoder behind the ClassifierBackend trait
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Devlin et al. (2019) BERT

/// Response quality score
pub mod quality;

/// Heuristic predictor over quality scores
pub mod heuristic;

/// Multinomial logistic regression
pub mod logistic;

/// Feature/classifier pairing
pub mod strategy;

#[cfg(feature = "finetune")]
pub mod model;

#[cfg(feature = "finetune")]
pub mod trainer;

#[cfg(feature = "finetune")]
pub mod classifier;
