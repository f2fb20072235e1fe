// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only:
//   - No ML math here (Layer 5)
//   - No printing here (Layer 1)
//   - File formats belong to Layer 4
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Strategy resolution and the fit → predict → validate flow
pub mod orchestrator;

// The learned pipeline: CSV in, submission out
pub mod predict_use_case;

// The training-free heuristic entry point
pub mod baseline_use_case;
