// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here. The QP solver itself is
// framework-free (crate::qp); this layer only wraps it.
//
//   encoder.rs    — one encoder stage: stacked LSTM layers
//                   with fresh zero state on every call
//
//   qp_layer.rs   — differentiable projection: host-side solve
//                   plus a Jacobian term that carries ∂z*/∂p
//                   back into the autodiff graph
//
//   model.rs      — RegressorConfig and the full network:
//                   encoder ×3 → dropout → decoder → QP
//
//   inferencer.rs — loads a checkpoint and runs sequences
//                   through the model in evaluation mode
//
//   error.rs      — configuration, shape and projection errors
//
// Reference: Burn Book §3 (Building Blocks)
//            Amos & Kolter (2017) OptNet

/// Typed model errors
pub mod error;

/// Stacked LSTM encoder stage
pub mod encoder;

/// Differentiable QP projection layer
pub mod qp_layer;

/// Regressor architecture and configuration
pub mod model;

/// Inference engine: loads a checkpoint and projects sequences
pub mod inferencer;
