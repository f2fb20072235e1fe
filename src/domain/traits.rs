// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The learned path is a pairing of two interchangeable parts:
//
//   FeatureBackend    → turns composed texts into model-ready features
//   ClassifierBackend → learns from those features, emits triples
//
// A PredictionStrategy is anything that can be fitted on
// (text, label) pairs and then asked for triples. The
// orchestrator only ever sees `dyn PredictionStrategy`, so new
// backends plug in without touching orchestration.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Trait Objects)

use anyhow::Result;

use crate::domain::example::PreferenceExample;
use crate::domain::triple::ProbabilityTriple;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can load comparison rows.
///
/// Implementations:
///   - TrainingCsv   → labelled rows
///   - EvaluationCsv → unlabelled rows
pub trait ExampleSource {
    /// Load every row, preserving source order.
    fn load_all(&self) -> Result<Vec<PreferenceExample>>;
}

// ─── FeatureBackend ───────────────────────────────────────────────────────────
/// Turns composed input strings into features.
///
/// Implementations:
///   - TfidfVectorizer → sparse unigram + bigram vectors
///   - TokenFeatures   → padded token ids + attention masks
pub trait FeatureBackend {
    /// State learned from the training corpus (vocabulary, tokenizer)
    type Fitted;

    /// Features for a batch of texts
    type Features;

    /// Learn the feature space from training texts only.
    fn fit(&self, texts: &[String]) -> Result<Self::Fitted>;

    /// Map texts into the already-fitted feature space.
    /// `fitted` is borrowed immutably: transforming never refits.
    fn transform(&self, texts: &[String], fitted: &Self::Fitted) -> Result<Self::Features>;
}

// ─── ClassifierBackend ────────────────────────────────────────────────────────
/// A trainable three-way classifier.
///
/// Implementations:
///   - LogisticRegression   → over sparse vectors
///   - FineTunedClassifier  → transformer over token ids (feature `finetune`)
pub trait ClassifierBackend {
    type Features;

    /// Train on features with labels in {0, 1, 2}.
    fn fit(&mut self, features: &Self::Features, labels: &[usize]) -> Result<()>;

    /// One normalised triple per input row, in input order.
    fn predict_proba(&self, features: &Self::Features) -> Result<Vec<ProbabilityTriple>>;
}

// ─── PredictionStrategy ───────────────────────────────────────────────────────
/// Uniform fit / predict surface the orchestrator drives.
pub trait PredictionStrategy {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Fit on composed training texts and their labels.
    fn fit(&mut self, texts: &[String], labels: &[usize]) -> Result<()>;

    /// Predict one triple per composed evaluation text, in order.
    fn predict(&self, texts: &[String]) -> Result<Vec<ProbabilityTriple>>;
}
