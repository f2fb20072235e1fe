// ============================================================
// Layer 4 — Token Features
// ============================================================
// Feature backend for the fine-tuned classifier. Fitting
// obtains a tokenizer (pretrained or built from the training
// corpus); transforming encodes every composed text as
//
//   [CLS] tokens [SEP] [PAD] ... [PAD]
//
// truncated and padded to exactly `max_seq_len` positions, with
// an attention mask of 1 for real tokens and 0 for padding.

use std::path::PathBuf;

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::domain::traits::FeatureBackend;
use crate::infra::tokenizer_store::{self, TokenizerStore, CLS_ID, PAD_ID, SEP_ID};

/// One encoded text, both vectors exactly `max_seq_len` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedInput {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl TokenizedInput {
    /// Wrap `ids` in [CLS] ... [SEP], truncate, and pad to `max_seq_len`.
    pub fn pack(ids: &[u32], special: SpecialIds, max_seq_len: usize) -> Self {
        let body = max_seq_len.saturating_sub(2);

        let mut input_ids = Vec::with_capacity(max_seq_len);
        input_ids.push(special.cls);
        input_ids.extend(ids.iter().take(body).copied());
        input_ids.push(special.sep);
        input_ids.truncate(max_seq_len);

        let mut attention_mask = vec![1u32; input_ids.len()];
        input_ids.resize(max_seq_len, special.pad);
        attention_mask.resize(max_seq_len, 0);

        Self { input_ids, attention_mask }
    }
}

/// Ids of the structural tokens for one tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialIds {
    pub cls: u32,
    pub sep: u32,
    pub pad: u32,
}

impl Default for SpecialIds {
    fn default() -> Self {
        Self { cls: CLS_ID, sep: SEP_ID, pad: PAD_ID }
    }
}

impl SpecialIds {
    /// Look the tokens up in `tokenizer`, keeping BERT defaults for any it lacks.
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Self {
        let d = Self::default();
        Self {
            cls: tokenizer.token_to_id("[CLS]").unwrap_or(d.cls),
            sep: tokenizer.token_to_id("[SEP]").unwrap_or(d.sep),
            pad: tokenizer.token_to_id("[PAD]").unwrap_or(d.pad),
        }
    }
}

/// A tokenizer fitted on (or loaded for) the training corpus.
pub struct FittedTokenizer {
    pub tokenizer:  Tokenizer,
    pub special:    SpecialIds,
    pub vocab_size: usize,
}

/// Encoded texts plus the id space the classifier must embed.
#[derive(Debug, Clone)]
pub struct TokenBatch {
    pub rows:        Vec<TokenizedInput>,
    pub vocab_size:  usize,
    pub max_seq_len: usize,
}

#[derive(Debug, Clone)]
pub struct TokenFeatures {
    pub max_seq_len: usize,
    pub vocab_size:  usize,
    pub pretrained:  Option<PathBuf>,
}

impl FeatureBackend for TokenFeatures {
    type Fitted   = FittedTokenizer;
    type Features = TokenBatch;

    fn fit(&self, texts: &[String]) -> Result<FittedTokenizer> {
        let tokenizer = TokenizerStore::new(self.pretrained.clone())
            .load_or_build(texts, self.vocab_size)?;
        let special    = SpecialIds::from_tokenizer(&tokenizer);
        let vocab_size = tokenizer_store::id_space(&tokenizer)
            .max(special.cls.max(special.sep).max(special.pad) as usize + 1);
        Ok(FittedTokenizer { tokenizer, special, vocab_size })
    }

    fn transform(&self, texts: &[String], fitted: &FittedTokenizer) -> Result<TokenBatch> {
        let rows = texts
            .iter()
            .map(|text| {
                let enc = fitted
                    .tokenizer
                    .encode(text.as_str(), false)
                    .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
                Ok(TokenizedInput::pack(enc.get_ids(), fitted.special, self.max_seq_len))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TokenBatch {
            rows,
            vocab_size:  fitted.vocab_size,
            max_seq_len: self.max_seq_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_pads_short_input() {
        let t = TokenizedInput::pack(&[7, 8], SpecialIds::default(), 6);
        assert_eq!(t.input_ids, vec![CLS_ID, 7, 8, SEP_ID, PAD_ID, PAD_ID]);
        assert_eq!(t.attention_mask, vec![1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_pack_truncates_long_input() {
        let ids: Vec<u32> = (200..800).collect();
        let t = TokenizedInput::pack(&ids, SpecialIds::default(), 512);
        assert_eq!(t.input_ids.len(), 512);
        assert_eq!(t.input_ids[0], CLS_ID);
        assert_eq!(t.input_ids[511], SEP_ID);
        assert_eq!(t.input_ids[510], 200 + 509);
        assert!(t.attention_mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_transform_aligns_ids_and_masks() {
        let backend = TokenFeatures { max_seq_len: 16, vocab_size: 100, pretrained: None };
        let train   = vec!["Question: hi\n\nResponse A: hello\n\nResponse B: hey".to_string()];
        let fitted  = backend.fit(&train).unwrap();

        let batch = backend.transform(&[train[0].clone(), "unseen words".to_string()], &fitted).unwrap();
        assert_eq!(batch.rows.len(), 2);
        for row in &batch.rows {
            assert_eq!(row.input_ids.len(), 16);
            assert_eq!(row.attention_mask.len(), 16);
            assert!(row.input_ids.iter().all(|&id| (id as usize) < batch.vocab_size));
        }
    }
}
