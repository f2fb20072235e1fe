// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that define the core
// concepts of the system:
//
//   - a labelled or unlabelled comparison row  (example.rs)
//   - the (p_a, p_b, p_tie) output distribution (triple.rs)
//   - the error taxonomy                        (error.rs)
//   - the backend abstractions                  (traits.rs)
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// One comparison row and its winner
pub mod example;

/// The canonical probability triple every strategy emits
pub mod triple;

/// Error taxonomy shared by every layer
pub mod error;

/// Feature / classifier / strategy abstractions
pub mod traits;
