// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   metrics.rs         — accuracy / log loss, per-epoch metrics CSV
//   tokenizer_store.rs — load a pretrained tokenizer.json or build
//                        a word-level one from the training corpus
//   checkpoint.rs      — pretrained encoder weights (CompactRecorder)
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Evaluation metrics and the metrics CSV logger
pub mod metrics;

/// Tokenizer loading and building
#[cfg(feature = "finetune")]
pub mod tokenizer_store;

/// Pretrained encoder weight loading
#[cfg(feature = "finetune")]
pub mod checkpoint;
