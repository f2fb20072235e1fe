use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation, TensorData},
};

/// Output classes: A wins, B wins, tie
pub const NUM_CLASSES: usize = 3;

/// Serialises tests that draw from the NdArray backend's global RNG,
/// so a seeded run is not interleaved with another test's draws.
#[cfg(test)]
pub(crate) static BACKEND_RNG: std::sync::Mutex<()> = std::sync::Mutex::new(());

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct PreferenceEncoderConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
}

impl PreferenceEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PreferenceEncoder<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm     = LayerNormConfig::new(self.d_model).init(device);
        let pre_classifier = LinearConfig::new(self.d_model, self.d_model).init(device);
        let classifier     = LinearConfig::new(self.d_model, NUM_CLASSES).init(device);
        let dropout        = DropoutConfig::new(self.dropout).init();
        PreferenceEncoder {
            token_embedding, position_embedding, layers,
            final_norm, pre_classifier, classifier, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask` is true at padding positions, which attention ignores.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let input       = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Transformer encoder with a three-way sequence classification head
/// read off the first ([CLS]) position.
#[derive(Module, Debug)]
pub struct PreferenceEncoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub pre_classifier:     Linear<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> PreferenceEncoder<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, 3]
    ///
    /// Logits are unnormalised; callers apply softmax.
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let device   = input_ids.device();
        let pad_mask = attention_mask.equal_elem(0);

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions: Vec<i64> = (0..batch_size)
            .flat_map(|_| 0..seq_len as i64)
            .collect();
        let positions = Tensor::<B, 2, Int>::from_data(
            TensorData::new(positions, [batch_size, seq_len]),
            &device,
        );
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        let [_, _, d_model] = x.dims();
        let cls = x
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);

        let hidden = activation::relu(self.pre_classifier.forward(cls));
        self.classifier.forward(self.dropout.forward(hidden))
    }

    /// Cross-entropy against labels in {0, 1, 2}.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids, attention_mask);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), labels);
        (loss, logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny() -> PreferenceEncoderConfig {
        PreferenceEncoderConfig::new(50, 8, 16, 2, 1, 32, 0.0)
    }

    #[test]
    fn test_forward_shape() {
        let _rng = crate::ml::model::BACKEND_RNG.lock().unwrap_or_else(|e| e.into_inner());
        let device = Default::default();
        let model: PreferenceEncoder<TestBackend> = tiny().init(&device);

        let ids  = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![101i64, 7, 9, 102, 0, 0, 0, 0, 101, 3, 102, 0, 0, 0, 0, 0], [2, 8]),
            &device,
        );
        let mask = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![1i64, 1, 1, 1, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0], [2, 8]),
            &device,
        );

        let logits = model.forward(ids, mask);
        assert_eq!(logits.dims(), [2, NUM_CLASSES]);
    }

    #[test]
    fn test_padding_does_not_change_logits() {
        let _rng = crate::ml::model::BACKEND_RNG.lock().unwrap_or_else(|e| e.into_inner());
        let device = Default::default();
        let model: PreferenceEncoder<TestBackend> = tiny().init(&device);

        let run = |pad_token: i64| {
            let ids = Tensor::<TestBackend, 2, Int>::from_data(
                TensorData::new(vec![101i64, 7, 102, pad_token, pad_token, pad_token, pad_token, pad_token], [1, 8]),
                &device,
            );
            let mask = Tensor::<TestBackend, 2, Int>::from_data(
                TensorData::new(vec![1i64, 1, 1, 0, 0, 0, 0, 0], [1, 8]),
                &device,
            );
            model.forward(ids, mask).into_data().convert::<f32>().to_vec::<f32>().unwrap()
        };

        let a = run(0);
        let b = run(11);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-4);
        }
    }
}
