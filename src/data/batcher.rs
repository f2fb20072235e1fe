// ============================================================
// Layer 4 — Preference Batcher
// ============================================================
// Implements Burn's Batcher trait to stack PreferenceSamples
// into tensors:
//
//   Input:  Vec of N samples, each padded to length S
//   Output: PreferenceBatch with input_ids / attention_mask
//           of shape [N, S] and labels of shape [N]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::PreferenceSample;

/// A batch of classifier inputs. B is the Burn Backend
/// (Wgpu, NdArray, or their Autodiff wrappers).
#[derive(Debug, Clone)]
pub struct PreferenceBatch<B: Backend> {
    /// Token ids — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding — shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class labels — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct PreferenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> PreferenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<PreferenceSample, PreferenceBatch<B>> for PreferenceBatcher<B> {
    fn batch(&self, items: Vec<PreferenceSample>) -> PreferenceBatch<B> {
        let batch_size = items.len();
        // All sequences have the same length (pre-padded)
        let seq_len    = items.first().map_or(0, |s| s.input_ids.len());

        let input_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i64))
            .collect();

        let mask_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i64))
            .collect();

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let input_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(input_flat, [batch_size, seq_len]), &self.device,
        );
        let attention_mask = Tensor::<B, 2, Int>::from_data(
            TensorData::new(mask_flat, [batch_size, seq_len]), &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]), &self.device,
        );

        PreferenceBatch { input_ids, attention_mask, labels }
    }
}
