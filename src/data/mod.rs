// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From CSV rows to model-ready features and back to CSV:
//
//   train.csv / test.csv
//       │
//       ▼
//   TrainingCsv / EvaluationCsv → PreferenceExample rows
//       │
//       ▼
//   TextComposer   → "Question: … Response A: … Response B: …"
//       │
//       ├──► TfidfVectorizer   → sparse rows (linear strategy)
//       │
//       └──► TokenFeatures     → ids + masks (fine-tuned strategy)
//               │
//               ▼
//            PreferenceDataset → PreferenceBatcher → DataLoader
//
//   predictions ──► write_submission → submission.csv
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// CSV readers for training and evaluation files
pub mod loader;

/// Single-string composition and label derivation
pub mod composer;

/// Submission CSV writer / reader
pub mod submission;

/// Seeded train/validation split
#[cfg(feature = "finetune")]
pub mod splitter;

/// Reproducible synthetic train/test files
pub mod sample_data;

/// TF-IDF feature backend
pub mod tfidf;

/// Tokenizer-based feature backend
#[cfg(feature = "finetune")]
pub mod token_features;

/// Burn Dataset over token rows
#[cfg(feature = "finetune")]
pub mod dataset;

/// Burn Batcher producing tensor batches
#[cfg(feature = "finetune")]
pub mod batcher;
