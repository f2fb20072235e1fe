// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two kinds of measurement:
//
//   accuracy / log_loss — score a set of probability triples
//                         against known labels
//   MetricsLogger       — append one CSV row per fine-tuning
//                         epoch
//
// Output file: {dir}/metrics.csv
//
//   epoch,train_loss,val_loss,val_accuracy
//   1,1.098612,1.097015,0.400000
//   ...

#[cfg(feature = "finetune")]
use anyhow::Result;
#[cfg(feature = "finetune")]
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
#[cfg(feature = "finetune")]
use serde::{Deserialize, Serialize};

use crate::domain::triple::ProbabilityTriple;

/// Probabilities are clipped into [EPS, 1 - EPS] before taking logs
const LOG_LOSS_EPS: f64 = 1e-15;

/// Fraction of rows whose argmax matches the label. `None` on empty input.
pub fn accuracy(predictions: &[ProbabilityTriple], labels: &[usize]) -> Option<f64> {
    if predictions.is_empty() || predictions.len() != labels.len() {
        return None;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, &y)| p.argmax().label() == y)
        .count();
    Some(correct as f64 / predictions.len() as f64)
}

/// Mean multi-class cross-entropy. `None` on empty input.
pub fn log_loss(predictions: &[ProbabilityTriple], labels: &[usize]) -> Option<f64> {
    if predictions.is_empty() || predictions.len() != labels.len() {
        return None;
    }
    let total: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(p, &y)| {
            let arr   = p.as_array();
            let sum   = p.sum();
            let prob  = (arr.get(y).copied().unwrap_or(0.0) / sum).clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            -prob.ln()
        })
        .sum();
    Some(total / predictions.len() as f64)
}

/// One row of metrics data for a single fine-tuning epoch
#[cfg(feature = "finetune")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy over all training batches
    pub train_loss: f64,

    /// Average cross-entropy on the validation split (NaN if empty)
    pub val_loss: f64,

    /// Fraction of validation rows classified correctly
    pub val_accuracy: f64,
}

#[cfg(feature = "finetune")]
impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, val_accuracy: f64) -> Self {
        Self { epoch, train_loss, val_loss, val_accuracy }
    }

    /// True if this epoch's weights should replace those kept so far:
    /// a strictly lower validation loss, or no validation loss at all
    /// (NaN), in which case the latest epoch wins.
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss.is_nan() || self.val_loss < best_val_loss
    }
}

/// Appends epoch metrics to a CSV file.
#[cfg(feature = "finetune")]
pub struct MetricsLogger {
    csv_path: PathBuf,
}

#[cfg(feature = "finetune")]
impl MetricsLogger {
    /// Create the directory and write the CSV header if the file is new.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,val_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.val_accuracy,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "finetune")]
    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 1.05, 0.98, 0.4);
        assert!(m.is_improvement(f64::INFINITY));
        assert!(m.is_improvement(1.0));
        assert!(!m.is_improvement(0.98));
        assert!(!m.is_improvement(0.9));
    }

    #[cfg(feature = "finetune")]
    #[test]
    fn test_missing_validation_loss_always_improves() {
        let m = EpochMetrics::new(3, 0.7, f64::NAN, 0.0);
        assert!(m.is_improvement(0.1));
        assert!(m.is_improvement(f64::NAN));
    }

    #[test]
    fn test_accuracy() {
        let preds = [
            ProbabilityTriple::new(0.7, 0.2, 0.1),
            ProbabilityTriple::new(0.2, 0.2, 0.6),
            ProbabilityTriple::new(0.1, 0.8, 0.1),
        ];
        assert_eq!(accuracy(&preds, &[0, 2, 0]), Some(2.0 / 3.0));
        assert_eq!(accuracy(&[], &[]), None);
    }

    #[test]
    fn test_log_loss_of_uniform_is_ln3() {
        let third = 1.0 / 3.0;
        let preds = vec![ProbabilityTriple::new(third, third, third); 4];
        let loss  = log_loss(&preds, &[0, 1, 2, 0]).unwrap();
        assert!((loss - 3.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_loss_clips_zero_probability() {
        let loss = log_loss(&[ProbabilityTriple::new(1.0, 0.0, 0.0)], &[1]).unwrap();
        assert!(loss.is_finite());
        assert!((loss + LOG_LOSS_EPS.ln()).abs() < 1e-9);
    }

    #[cfg(feature = "finetune")]
    #[test]
    fn test_logger_appends_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.1, 1.0, 0.5)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.9, 0.95, 0.6)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,val_loss,val_accuracy");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("2,0.900000"));
    }
}
