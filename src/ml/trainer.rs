// ============================================================
// Layer 5 — Fine-tuning Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and AdamW.
//
//   - Training runs on B (an Autodiff backend) for gradients
//   - model.valid() returns the model on B::InnerBackend,
//     which the validation batcher must also use
//   - Learning rate: linear warm-up then linear decay to 0
//   - After each epoch the validation loss decides whether the
//     epoch's weights become the kept model; with no
//     validation rows the last epoch is kept
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::predict_use_case::FineTuneConfig;
use crate::data::{
    batcher::{PreferenceBatch, PreferenceBatcher},
    dataset::{PreferenceDataset, PreferenceSample},
};
use crate::domain::error::PipelineError;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{PreferenceEncoder, PreferenceEncoderConfig};

/// Architecture for a run, sized to the fitted tokenizer's id space.
pub fn encoder_config(cfg: &FineTuneConfig, vocab_size: usize, max_seq_len: usize) -> PreferenceEncoderConfig {
    PreferenceEncoderConfig::new(
        vocab_size, max_seq_len, cfg.d_model,
        cfg.num_heads, cfg.num_layers, cfg.d_ff, cfg.dropout,
    )
}

/// Learning rate for optimiser step `step` (0-based): ramps from 0 to
/// `base_lr` over `warmup_steps`, then decays linearly to 0 at `total_steps`.
pub fn linear_warmup_lr(step: usize, total_steps: usize, warmup_steps: usize, base_lr: f64) -> f64 {
    if step < warmup_steps {
        return base_lr * step as f64 / warmup_steps as f64;
    }
    let remaining = total_steps.saturating_sub(step) as f64;
    let decay     = total_steps.saturating_sub(warmup_steps).max(1) as f64;
    base_lr * (remaining / decay).max(0.0)
}

/// Fine-tune `model` and return the kept weights on the inner backend.
pub fn fine_tune<B: AutodiffBackend>(
    cfg:           &FineTuneConfig,
    mut model:     PreferenceEncoder<B>,
    train_dataset: PreferenceDataset,
    val_dataset:   PreferenceDataset,
    device:        &B::Device,
) -> Result<PreferenceEncoder<B::InnerBackend>> {
    let n_train = train_dataset.sample_count();
    if n_train == 0 {
        return Err(PipelineError::TrainingFailure("no training samples after validation split".into()).into());
    }
    if cfg.epochs == 0 {
        return Err(PipelineError::TrainingFailure("epochs must be at least 1".into()).into());
    }

    let metrics = cfg.metrics_dir.as_deref().map(MetricsLogger::new).transpose()?;
    if let Some(logger) = &metrics {
        tracing::info!("Writing epoch metrics to '{}'", logger.csv_path().display());
    }

    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay as f32)
        .init();

    let train_loader = DataLoaderBuilder::new(PreferenceBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::new(PreferenceBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.eval_batch_size)
        .build(val_dataset);

    let total_steps = cfg.epochs * n_train.div_ceil(cfg.batch_size.max(1));
    let mut step    = 0usize;
    let mut best_val_loss = f64::INFINITY;
    let mut best: Option<PreferenceEncoder<B::InnerBackend>> = None;

    tracing::info!(
        "Fine-tuning for {} epochs ({} steps, warm-up {})",
        cfg.epochs, total_steps, cfg.warmup_steps
    );

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(PipelineError::TrainingFailure(format!(
                    "non-finite loss at epoch {epoch}, step {step}"
                ))
                .into());
            }
            train_loss_sum += loss_val;
            train_batches  += 1;

            let lr    = linear_warmup_lr(step, total_steps, cfg.warmup_steps, cfg.lr);
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
            step += 1;
        }

        let avg_train_loss = train_loss_sum / train_batches.max(1) as f64;

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let (val_loss, val_acc) = evaluate(&model_valid, val_loader.as_ref());

        tracing::info!(
            "Epoch {:>2}/{} | train_loss={:.4} | val_loss={} | val_acc={:.1}%",
            epoch, cfg.epochs, avg_train_loss,
            val_loss.map_or_else(|| "n/a".to_string(), |l| format!("{l:.4}")),
            val_acc * 100.0,
        );

        let epoch_metrics = EpochMetrics::new(epoch, avg_train_loss, val_loss.unwrap_or(f64::NAN), val_acc);
        if let Some(logger) = &metrics {
            logger.log(&epoch_metrics)?;
        }

        if epoch_metrics.is_improvement(best_val_loss) {
            tracing::debug!("Keeping weights from epoch {}", epoch);
            best_val_loss = epoch_metrics.val_loss;
            best          = Some(model_valid);
        }
    }

    best.ok_or_else(|| PipelineError::TrainingFailure("no epoch completed".into()).into())
}

/// Size-weighted mean loss and accuracy over a loader.
/// Loss is `None` when the loader is empty.
fn evaluate<B: Backend>(
    model:  &PreferenceEncoder<B>,
    loader: &dyn DataLoader<PreferenceBatch<B>>,
) -> (Option<f64>, f64) {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let n = batch.labels.dims()[0];
        let (loss, logits) = model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels.clone());
        loss_sum += loss.into_scalar().elem::<f64>() * n as f64;

        // argmax(1) returns shape [batch, 1] — flatten to [batch]
        let hits: i64 = logits
            .argmax(1)
            .flatten::<1>(0, 1)
            .equal(batch.labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        correct += hits as usize;
        total   += n;
    }

    if total == 0 {
        (None, 0.0)
    } else {
        (Some(loss_sum / total as f64), correct as f64 / total as f64)
    }
}

/// Pair token rows with their labels.
pub fn to_samples(
    rows:   &[crate::data::token_features::TokenizedInput],
    labels: &[usize],
) -> Vec<PreferenceSample> {
    rows.iter()
        .zip(labels)
        .map(|(row, &label)| PreferenceSample {
            input_ids:      row.input_ids.clone(),
            attention_mask: row.attention_mask.clone(),
            label,
        })
        .collect()
}
