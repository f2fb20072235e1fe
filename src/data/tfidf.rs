// ============================================================
// Layer 4 — Sparse N-gram Features (TF-IDF)
// ============================================================
// Bag-of-n-grams feature backend for the linear classifier.
//
// Fitting (training texts only):
//   1. Lowercase, extract tokens of 2+ word characters
//   2. Emit word n-grams for n in [ngram_min, ngram_max]
//   3. Keep the `max_features` most frequent n-grams
//      (corpus count, ties broken lexicographically)
//   4. Assign column indices in lexicographic term order
//   5. idf(t) = ln((1 + n_docs) / (1 + df(t))) + 1
//
// Transforming:
//   value(t) = count(t) * idf(t), then L2-normalise the row.
//   Terms outside the fitted vocabulary are dropped.
//
// The fitted vocabulary is only ever borrowed by `transform`,
// so evaluation text can never change it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;
use crate::domain::traits::FeatureBackend;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("static regex"));

// ─── Sparse rows ──────────────────────────────────────────────────────────────
/// One sparse row: parallel `indices` / `values`, indices ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values:  Vec<f64>,
}

impl SparseVector {
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// A batch of sparse rows sharing one column space.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    pub rows:       Vec<SparseVector>,
    pub n_features: usize,
}

impl SparseMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

// ─── Vectorizer ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TfidfConfig {
    pub max_features: usize,
    pub ngram_min:    usize,
    pub ngram_max:    usize,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self { max_features: 5000, ngram_min: 1, ngram_max: 2 }
    }
}

/// Vocabulary and idf weights learned from the training corpus.
#[derive(Debug, Clone)]
pub struct TfidfVocabulary {
    index: HashMap<String, usize>,
    terms: Vec<String>,
    idf:   Vec<f64>,
}

impl TfidfVocabulary {
    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.terms.len()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Terms in column order
    #[cfg(test)]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[cfg(test)]
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
}

impl TfidfVectorizer {
    pub fn new(config: TfidfConfig) -> Self {
        Self { config }
    }

    /// Lowercased word n-grams of one document, in order of appearance.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lower  = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN.find_iter(&lower).map(|m| m.as_str()).collect();

        let mut grams = Vec::new();
        for n in self.config.ngram_min.max(1)..=self.config.ngram_max {
            grams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        grams
    }
}

impl FeatureBackend for TfidfVectorizer {
    type Fitted   = TfidfVocabulary;
    type Features = SparseMatrix;

    fn fit(&self, texts: &[String]) -> Result<TfidfVocabulary> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let grams = self.analyze(text);
            let unique: HashSet<&String> = grams.iter().collect();
            for gram in unique {
                *doc_freq.entry(gram.clone()).or_insert(0) += 1;
            }
            for gram in grams {
                *counts.entry(gram).or_insert(0) += 1;
            }
        }

        if counts.is_empty() {
            return Err(PipelineError::TrainingFailure(
                "empty vocabulary: training texts contain no tokens".into(),
            )
            .into());
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_features);

        // BTreeMap gives lexicographic column order
        let kept: BTreeMap<String, usize> = ranked
            .into_iter()
            .map(|(term, _)| {
                let df = doc_freq.get(&term).copied().unwrap_or(0);
                (term, df)
            })
            .collect();

        let n_docs = texts.len() as f64;
        let mut index = HashMap::with_capacity(kept.len());
        let mut terms = Vec::with_capacity(kept.len());
        let mut idf   = Vec::with_capacity(kept.len());
        for (i, (term, df)) in kept.into_iter().enumerate() {
            idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
            index.insert(term.clone(), i);
            terms.push(term);
        }

        tracing::info!("TF-IDF vocabulary fitted: {} terms from {} texts", terms.len(), texts.len());
        Ok(TfidfVocabulary { index, terms, idf })
    }

    fn transform(&self, texts: &[String], fitted: &TfidfVocabulary) -> Result<SparseMatrix> {
        let rows = texts
            .iter()
            .map(|text| {
                let mut tf: BTreeMap<usize, f64> = BTreeMap::new();
                for gram in self.analyze(text) {
                    if let Some(i) = fitted.index_of(&gram) {
                        *tf.entry(i).or_insert(0.0) += 1.0;
                    }
                }

                let mut row = SparseVector {
                    indices: tf.keys().copied().collect(),
                    values:  tf.iter().map(|(&i, &c)| c * fitted.idf[i]).collect(),
                };
                let norm = row.l2_norm();
                if norm > 0.0 {
                    row.values.iter_mut().for_each(|v| *v /= norm);
                }
                row
            })
            .collect();

        Ok(SparseMatrix { rows, n_features: fitted.n_features() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_analyze_unigrams_and_bigrams() {
        let v = TfidfVectorizer::default();
        // Single-character tokens are dropped
        assert_eq!(
            v.analyze("The cat, a Dog"),
            vec!["the", "cat", "dog", "the cat", "cat dog"]
        );
    }

    #[test]
    fn test_vocabulary_is_sorted_and_capped() {
        let v = TfidfVectorizer::new(TfidfConfig { max_features: 3, ngram_min: 1, ngram_max: 1 });
        let vocab = v.fit(&texts(&["zz yy yy xx xx xx", "ww xx"])).unwrap();
        // Top 3 by count: xx(4), yy(2), then ww/zz tie → ww
        assert_eq!(vocab.terms(), &["ww", "xx", "yy"]);
    }

    #[test]
    fn test_rows_are_l2_normalised() {
        let v      = TfidfVectorizer::default();
        let corpus = texts(&["good answer here", "bad answer", "another good one"]);
        let vocab  = v.fit(&corpus).unwrap();
        let m      = v.transform(&corpus, &vocab).unwrap();
        for row in &m.rows {
            assert!((row.l2_norm() - 1.0).abs() < 1e-12);
            assert!(row.indices.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(m.n_features, vocab.n_features());
    }

    #[test]
    fn test_idf_is_smoothed() {
        let v     = TfidfVectorizer::new(TfidfConfig { max_features: 10, ngram_min: 1, ngram_max: 1 });
        let vocab = v.fit(&texts(&["aa bb", "aa"])).unwrap();
        let aa    = vocab.index_of("aa").unwrap();
        let bb    = vocab.index_of("bb").unwrap();
        assert!((vocab.idf()[aa] - 1.0).abs() < 1e-12);
        assert!((vocab.idf()[bb] - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_text_does_not_touch_vocabulary() {
        let v     = TfidfVectorizer::default();
        let vocab = v.fit(&texts(&["paris is the capital"])).unwrap();
        let before: Vec<String> = vocab.terms().to_vec();

        let m = v.transform(&texts(&["zebra quantum xylophone"]), &vocab).unwrap();
        assert!(m.rows[0].indices.is_empty());
        assert_eq!(vocab.terms(), before.as_slice());
    }

    #[test]
    fn test_empty_corpus_is_training_failure() {
        let err = TfidfVectorizer::default().fit(&texts(&["", "a"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::TrainingFailure(_))
        ));
    }
}
