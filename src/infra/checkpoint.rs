// ============================================================
// Layer 6 — Pretrained Encoder Weights
// ============================================================
// Loads encoder weights saved with Burn's CompactRecorder into
// a freshly initialised PreferenceEncoder before fine-tuning.
//
// The record must come from an encoder with the same
// architecture (vocab size, d_model, layers, ...) or loading
// fails. Fine-tuned weights are never written back: the model
// lives only for the duration of the run.
//
// File naming: CompactRecorder appends `.mpk`, so
//   --encoder-weights weights/encoder      → weights/encoder.mpk
//   --encoder-weights weights/encoder.mpk  → same file
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::error::PipelineError;
use crate::ml::model::PreferenceEncoder;

const RECORD_EXTENSION: &str = "mpk";

pub struct PretrainedWeights {
    /// Record path without the recorder's extension
    stem: PathBuf,
}

impl PretrainedWeights {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let stem = if path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION) {
            path.with_extension("")
        } else {
            path.to_path_buf()
        };
        Self { stem }
    }

    /// The file the recorder will read
    pub fn file(&self) -> PathBuf {
        self.stem.with_extension(RECORD_EXTENSION)
    }

    /// Replace `model`'s parameters with the stored ones.
    pub fn load_into<B: Backend>(
        &self,
        model:  PreferenceEncoder<B>,
        device: &B::Device,
    ) -> Result<PreferenceEncoder<B>> {
        let file = self.file();
        if !file.is_file() {
            return Err(PipelineError::missing_input(file).into());
        }

        let record = CompactRecorder::new()
            .load(self.stem.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load encoder weights '{}'. Does the architecture match?",
                    file.display()
                )
            })?;

        tracing::info!("Loaded pretrained encoder weights from '{}'", file.display());
        Ok(model.load_record(record))
    }
}
