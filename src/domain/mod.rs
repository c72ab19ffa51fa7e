// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what flows through the system:
// input windows and projected outputs, plus the traits that
// produce and consume them.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A validated [seq_len][batch][features] input window
pub mod sequence;

// One feasible point per batch element
pub mod projection;

// Source / sink abstractions
pub mod traits;
