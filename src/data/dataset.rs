use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised, padded classifier input with its class label.
/// Sequence format: [CLS] tokens [SEP] [PAD]...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

pub struct PreferenceDataset {
    samples: Vec<PreferenceSample>,
}

impl PreferenceDataset {
    pub fn new(samples: Vec<PreferenceSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<PreferenceSample> for PreferenceDataset {
    fn get(&self, index: usize) -> Option<PreferenceSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
