// ============================================================
// Layer 5 — Fine-tuned Classifier
// ============================================================
// Adapts the Burn encoder to the ClassifierBackend seam so the
// orchestrator can treat it exactly like logistic regression.
//
//   fit:      split → init encoder → (load weights) → fine_tune
//   predict:  chunk rows → forward → softmax per row
//
// The backend is a type parameter: AcceleratedBackend for the
// GPU path, CpuBackend for the CPU path. Both run the same code.

use anyhow::{anyhow, Result};
use burn::{
    backend::{Autodiff, NdArray, Wgpu},
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::predict_use_case::FineTuneConfig;
use crate::data::{
    batcher::PreferenceBatcher,
    dataset::{PreferenceDataset, PreferenceSample},
    splitter::split_train_val,
    token_features::TokenBatch,
};
use crate::domain::{error::PipelineError, traits::ClassifierBackend, triple::ProbabilityTriple};
use crate::infra::checkpoint::PretrainedWeights;
use crate::ml::model::{PreferenceEncoder, NUM_CLASSES};
use crate::ml::trainer::{encoder_config, fine_tune, to_samples};

pub type AcceleratedBackend = Autodiff<Wgpu>;
pub type CpuBackend         = Autodiff<NdArray>;

pub struct FineTunedClassifier<B: AutodiffBackend> {
    config: FineTuneConfig,
    device: B::Device,
    model:  Option<PreferenceEncoder<B::InnerBackend>>,
}

impl<B: AutodiffBackend> FineTunedClassifier<B> {
    pub fn new(config: FineTuneConfig) -> Self {
        Self { config, device: Default::default(), model: None }
    }
}

impl<B: AutodiffBackend> ClassifierBackend for FineTunedClassifier<B> {
    type Features = TokenBatch;

    fn fit(&mut self, features: &TokenBatch, labels: &[usize]) -> Result<()> {
        if features.rows.len() != labels.len() {
            return Err(PipelineError::TrainingFailure(format!(
                "{} token rows but {} labels",
                features.rows.len(),
                labels.len()
            ))
            .into());
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= NUM_CLASSES) {
            return Err(PipelineError::TrainingFailure(format!("label {bad} out of range")).into());
        }

        let cfg = &self.config;
        let (train, val) = split_train_val(
            to_samples(&features.rows, labels),
            1.0 - cfg.validation_fraction,
            cfg.seed,
        );
        tracing::info!("Fine-tune split: {} train / {} validation", train.len(), val.len());

        B::seed(cfg.seed);
        let mut model: PreferenceEncoder<B> =
            encoder_config(cfg, features.vocab_size, features.max_seq_len).init(&self.device);

        if let Some(path) = &cfg.encoder_weights {
            model = PretrainedWeights::new(path).load_into(model, &self.device)?;
        }

        let best = fine_tune::<B>(
            cfg,
            model,
            PreferenceDataset::new(train),
            PreferenceDataset::new(val),
            &self.device,
        )?;
        self.model = Some(best);
        Ok(())
    }

    fn predict_proba(&self, features: &TokenBatch) -> Result<Vec<ProbabilityTriple>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("Fine-tuned classifier used before fit"))?;

        let batcher = PreferenceBatcher::<B::InnerBackend>::new(self.device.clone());
        let mut out = Vec::with_capacity(features.rows.len());

        // Sequential chunks keep output order aligned with input rows
        for chunk in features.rows.chunks(self.config.eval_batch_size.max(1)) {
            let items = chunk
                .iter()
                .map(|row| PreferenceSample {
                    input_ids:      row.input_ids.clone(),
                    attention_mask: row.attention_mask.clone(),
                    label:          0,
                })
                .collect();
            let batch  = batcher.batch(items);
            let logits = model.forward(batch.input_ids, batch.attention_mask);

            let values = logits
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("Cannot read logits: {e:?}"))?;

            out.extend(values.chunks_exact(NUM_CLASSES).map(|z| {
                ProbabilityTriple::from_logits([z[0] as f64, z[1] as f64, z[2] as f64])
            }));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::token_features::TokenizedInput;

    fn tiny_config() -> FineTuneConfig {
        FineTuneConfig {
            epochs:          1,
            batch_size:      4,
            eval_batch_size: 3,
            warmup_steps:    2,
            d_model:         8,
            num_heads:       2,
            num_layers:      1,
            d_ff:            16,
            dropout:         0.0,
            ..FineTuneConfig::default()
        }
    }

    fn tiny_batch(n: usize) -> TokenBatch {
        let rows = (0..n)
            .map(|i| TokenizedInput {
                input_ids:      vec![101, 104 + (i % 5) as u32, 102, 0],
                attention_mask: vec![1, 1, 1, 0],
            })
            .collect();
        TokenBatch { rows, vocab_size: 110, max_seq_len: 4 }
    }

    #[test]
    fn test_fit_then_predict_valid_triples() {
        let _rng = crate::ml::model::BACKEND_RNG.lock().unwrap_or_else(|e| e.into_inner());
        let mut clf = FineTunedClassifier::<CpuBackend>::new(tiny_config());
        let labels: Vec<usize> = (0..10).map(|i| i % 3).collect();
        clf.fit(&tiny_batch(10), &labels).unwrap();
        assert!(clf.model.is_some());

        let preds = clf.predict_proba(&tiny_batch(7)).unwrap();
        assert_eq!(preds.len(), 7);
        for p in &preds {
            assert!(p.is_valid(1e-6));
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let _rng = crate::ml::model::BACKEND_RNG.lock().unwrap_or_else(|e| e.into_inner());
        let labels: Vec<usize> = (0..10).map(|i| i % 3).collect();
        let fit_and_predict = || {
            let cfg = FineTuneConfig { dropout: 0.1, ..tiny_config() };
            let mut clf = FineTunedClassifier::<CpuBackend>::new(cfg);
            clf.fit(&tiny_batch(10), &labels).unwrap();
            clf.predict_proba(&tiny_batch(6)).unwrap()
        };

        let first  = fit_and_predict();
        let second = fit_and_predict();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            for (x, y) in a.as_array().iter().zip(b.as_array()) {
                assert!((x - y).abs() < 1e-6, "{x} vs {y}");
            }
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let clf = FineTunedClassifier::<CpuBackend>::new(tiny_config());
        assert!(clf.predict_proba(&tiny_batch(2)).is_err());
    }

    #[test]
    fn test_label_count_mismatch() {
        let mut clf = FineTunedClassifier::<CpuBackend>::new(tiny_config());
        let err = clf.fit(&tiny_batch(3), &[0, 1]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::TrainingFailure(_))
        ));
    }
}
