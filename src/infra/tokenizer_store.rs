// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Supplies the tokenizer for the token feature backend:
//
//   - a pretrained HuggingFace `tokenizer.json`, when a path is
//     configured (e.g. the encoder's own tokenizer), or
//   - a word-level vocabulary built from the training corpus,
//     assembled as tokenizer JSON in memory and parsed back.
//
// Corpus words are counted by running each text through the
// same normalizer (BERT cleaning, lowercase, accents kept) and
// Whitespace pre-tokenizer the built tokenizer uses, so every
// vocabulary entry is a token the tokenizer can actually
// produce. Frequency ties are broken alphabetically so the same
// corpus always yields the same ids.
//
// Reference: HuggingFace tokenizers JSON format

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tokenizers::{
    normalizers::BertNormalizer, pre_tokenizers::whitespace::Whitespace, NormalizedString,
    Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer,
};

use crate::domain::error::PipelineError;

pub const PAD_ID:  u32 = 0;
pub const UNK_ID:  u32 = 1;
pub const CLS_ID:  u32 = 101;
pub const SEP_ID:  u32 = 102;
pub const MASK_ID: u32 = 103;

/// First id handed to a corpus word
const FIRST_WORD_ID: usize = 104;

// BertNormalizer settings, shared by word counting and the tokenizer JSON
const CLEAN_TEXT:           bool = true;
const HANDLE_CHINESE_CHARS: bool = true;
const STRIP_ACCENTS:        bool = false;
const LOWERCASE:            bool = true;

pub struct TokenizerStore {
    pretrained: Option<PathBuf>,
}

impl TokenizerStore {
    pub fn new(pretrained: Option<PathBuf>) -> Self {
        Self { pretrained }
    }

    /// Load the pretrained tokenizer if configured, else build one from `texts`.
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        match &self.pretrained {
            Some(path) => {
                tracing::info!("Loading pretrained tokenizer from '{}'", path.display());
                self.load(path)
            }
            None => {
                tracing::info!("Building word-level tokenizer (vocab_size={})", vocab_size);
                build(texts, vocab_size)
            }
        }
    }

    fn load(&self, path: &PathBuf) -> Result<Tokenizer> {
        if !path.is_file() {
            return Err(PipelineError::missing_input(path).into());
        }
        Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }
}

/// Build a word-level tokenizer whose vocabulary holds the most
/// frequent `vocab_size - 5` corpus tokens plus the special tokens.
pub fn build(texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
    let normalizer = BertNormalizer::new(CLEAN_TEXT, HANDLE_CHINESE_CHARS, Some(STRIP_ACCENTS), LOWERCASE);
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in pre_tokenize(&normalizer, text)? {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(String, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(vocab_size.saturating_sub(5));

    let mut vocab = serde_json::json!({
        "[PAD]":  PAD_ID,
        "[UNK]":  UNK_ID,
        "[CLS]":  CLS_ID,
        "[SEP]":  SEP_ID,
        "[MASK]": MASK_ID,
    });

    let mut next_id = FIRST_WORD_ID;
    for (word, _) in &words {
        if vocab.get(word).is_none() {
            vocab[word] = serde_json::json!(next_id);
            next_id += 1;
        }
    }

    let special = |id: u32, content: &str| serde_json::json!({
        "id": id, "content": content, "single_word": false, "lstrip": false,
        "rstrip": false, "normalized": false, "special": true
    });

    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            special(PAD_ID, "[PAD]"),
            special(UNK_ID, "[UNK]"),
            special(CLS_ID, "[CLS]"),
            special(SEP_ID, "[SEP]"),
            special(MASK_ID, "[MASK]"),
        ],
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": CLEAN_TEXT,
            "handle_chinese_chars": HANDLE_CHINESE_CHARS,
            "strip_accents": STRIP_ACCENTS,
            "lowercase": LOWERCASE
        },
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    });

    tracing::info!("Tokenizer built with {} corpus words", next_id - FIRST_WORD_ID);

    serde_json::to_string(&tokenizer_json)
        .context("Cannot serialise tokenizer JSON")?
        .parse::<Tokenizer>()
        .map_err(|e| anyhow!("Cannot parse built tokenizer: {e}"))
}

/// Split `text` exactly as the built tokenizer will before vocabulary lookup.
fn pre_tokenize(normalizer: &BertNormalizer, text: &str) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    normalizer
        .normalize(&mut normalized)
        .map_err(|e| anyhow!("Cannot normalise corpus text: {e}"))?;

    let mut pre = PreTokenizedString::from(normalized);
    Whitespace::default()
        .pre_tokenize(&mut pre)
        .map_err(|e| anyhow!("Cannot pre-tokenize corpus text: {e}"))?;

    Ok(pre
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}

/// Embedding rows needed to cover every id the tokenizer can emit.
pub fn id_space(tokenizer: &Tokenizer) -> usize {
    tokenizer
        .get_vocab(true)
        .values()
        .copied()
        .max()
        .map_or(0, |max| max as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Question: Hi?\n\nResponse A: Hello there.\n\nResponse B: Hey".to_string(),
            "Question: Why?\n\nResponse A: Because.\n\nResponse B: No idea".to_string(),
        ]
    }

    #[test]
    fn test_built_tokenizer_encodes_corpus_words() {
        let tok = build(&corpus(), 1000).unwrap();
        let enc = tok.encode("Hello there", false).unwrap();
        assert_eq!(enc.get_ids().len(), 2);
        assert!(enc.get_ids().iter().all(|&id| id >= FIRST_WORD_ID as u32));
    }

    #[test]
    fn test_accented_corpus_words_are_in_vocabulary() {
        let tok = build(&["Café résumé naïve".to_string()], 1000).unwrap();
        let enc = tok.encode("café RÉSUMÉ naïve", false).unwrap();
        assert_eq!(enc.get_ids().len(), 3);
        assert!(enc.get_ids().iter().all(|&id| id >= FIRST_WORD_ID as u32));
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let tok = build(&corpus(), 1000).unwrap();
        let enc = tok.encode("zebra", false).unwrap();
        assert_eq!(enc.get_ids(), &[UNK_ID]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build(&corpus(), 1000).unwrap();
        let b = build(&corpus(), 1000).unwrap();
        let text = "Response A: Hello because no idea";
        assert_eq!(
            a.encode(text, false).unwrap().get_ids(),
            b.encode(text, false).unwrap().get_ids()
        );
    }

    #[test]
    fn test_id_space_covers_special_tokens() {
        let tok = build(&corpus(), 10).unwrap();
        // 5 corpus words after reserving the special tokens
        assert_eq!(id_space(&tok), FIRST_WORD_ID + 5);
    }

    #[test]
    fn test_missing_pretrained_file_is_missing_input() {
        let store = TokenizerStore::new(Some(PathBuf::from("/nonexistent/tokenizer.json")));
        let err   = store.load_or_build(&corpus(), 100).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingInput { .. })
        ));
    }
}
