// ============================================================
// Layer 5 — QP Error Types
// ============================================================
use thiserror::Error;

/// Errors raised while building or solving a quadratic program.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QpError {
    /// A matrix or vector does not have the size the problem requires
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what:     &'static str,
        expected: String,
        actual:   String,
    },

    /// The quadratic cost Q is not symmetric positive definite
    #[error("cost matrix Q is not symmetric positive definite")]
    NotPositiveDefinite,

    /// Box-constraint builder received parameters it cannot encode
    #[error("invalid box constraint: {reason}")]
    InvalidBox { reason: String },

    /// The Newton (KKT) system could not be factorised
    #[error("KKT system is singular at iteration {iteration}")]
    SingularKkt { iteration: usize },

    /// An iterate became NaN or infinite
    #[error("solver produced a non-finite iterate at iteration {iteration}")]
    NonFinite { iteration: usize },

    /// Iteration budget exhausted before the residuals reached tolerance
    #[error(
        "solver did not converge after {iterations} iterations \
         (primal={primal_residual:.3e}, dual={dual_residual:.3e}, gap={gap:.3e})"
    )]
    NotConverged {
        iterations:      usize,
        primal_residual: f64,
        dual_residual:   f64,
        gap:             f64,
    },
}

pub type QpResult<T> = std::result::Result<T, QpError>;
