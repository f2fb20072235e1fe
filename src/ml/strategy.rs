// ============================================================
// Layer 5 — Paired Strategy
// ============================================================
// Glues one FeatureBackend to one ClassifierBackend whose
// feature types line up, exposing the pair as a
// PredictionStrategy:
//
//   fit:     fitted = features.fit(train)
//            classifier.fit(features.transform(train, fitted))
//   predict: classifier.predict_proba(features.transform(eval, fitted))
//
// The fitted feature state is kept from `fit` and reused
// unchanged by `predict`.

use anyhow::{Context, Result};

use crate::domain::error::PipelineError;
use crate::domain::traits::{ClassifierBackend, FeatureBackend, PredictionStrategy};
use crate::domain::triple::ProbabilityTriple;

pub struct PairedStrategy<F: FeatureBackend, C> {
    name:       String,
    features:   F,
    classifier: C,
    fitted:     Option<F::Fitted>,
}

impl<F: FeatureBackend, C> PairedStrategy<F, C> {
    pub fn new(name: impl Into<String>, features: F, classifier: C) -> Self {
        Self { name: name.into(), features, classifier, fitted: None }
    }
}

impl<F, C> PredictionStrategy for PairedStrategy<F, C>
where
    F: FeatureBackend,
    C: ClassifierBackend<Features = F::Features>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, texts: &[String], labels: &[usize]) -> Result<()> {
        let fitted = self.features.fit(texts).context("fitting features")?;
        let x      = self.features.transform(texts, &fitted)?;
        self.classifier.fit(&x, labels).context("fitting classifier")?;
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, texts: &[String]) -> Result<Vec<ProbabilityTriple>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            PipelineError::TrainingFailure(format!("{}: predict called before fit", self.name))
        })?;
        let x = self.features.transform(texts, fitted)?;
        self.classifier.predict_proba(&x)
    }
}
