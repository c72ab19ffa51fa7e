// ============================================================
// Layer 5 — Model Errors
// ============================================================
use thiserror::Error;

use crate::qp::QpError;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Constructor configuration cannot describe a valid model
    #[error("invalid model configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Input tensor does not match [seq_len, batch, input_size]
    #[error("input shape mismatch: expected {expected}, got {actual:?}")]
    InputShape { expected: String, actual: Vec<usize> },

    /// A sequence with no time steps or no batch elements
    #[error("input sequence is empty (dims {dims:?})")]
    EmptyInput { dims: Vec<usize> },

    /// The projection failed for one batch element; fatal for the pass
    #[error("QP projection failed for batch element {index}: {source}")]
    Projection {
        index:  usize,
        #[source]
        source: QpError,
    },

    /// The constraint system itself could not be built
    #[error("constraint system: {0}")]
    Constraints(#[from] QpError),
}
