// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to inputs and outputs only
// through these traits, so a JSON file, a generated sequence
// or a future streaming source are interchangeable.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::projection::ProjectedBatch;
use crate::domain::sequence::SequenceWindow;

// ─── SequenceSource ───────────────────────────────────────────────────────────
/// Anything that can produce one model input window.
///
/// Implementations:
///   - JsonSequenceLoader → reads [seq][batch][feature] from a file
///   - SyntheticSequence  → seeded uniform noise for smoke runs
pub trait SequenceSource {
    fn load(&self) -> Result<SequenceWindow>;
}

// ─── ProjectionSink ───────────────────────────────────────────────────────────
/// Anything that can persist projected outputs.
///
/// Implementations:
///   - CsvProjectionWriter → one CSV row per batch element
pub trait ProjectionSink {
    fn write(&self, batch: &ProjectedBatch) -> Result<()>;
}
