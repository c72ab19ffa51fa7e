// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From an input source to a model-ready tensor:
//
//   JSON file / seeded generator
//       │
//       ▼
//   SequenceWindow     → validated [seq][batch][feature] values
//       │
//       ▼
//   SequenceBatcher    → Tensor [seq_len, batch, features]
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads input windows from JSON files
pub mod loader;

/// Seeded random windows for smoke runs
pub mod synthetic;

/// Converts windows into tensors
pub mod batcher;
