// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   checkpoint.rs        — model weights via Burn's CompactRecorder
//                          plus model_settings.json, so inference
//                          can rebuild the architecture
//
//   projection_writer.rs — projected outputs as CSV
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Projected output CSV writer
pub mod projection_writer;
