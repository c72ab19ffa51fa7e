// ============================================================
// Layer 5 — Quadratic Program Solver
// ============================================================
// Everything needed to use a convex QP as a network layer,
// independent of Burn:
//
//   problem.rs     — constant problem data (Q, G, h, A, b) and
//                    the box-constraint builder used by the model
//
//   solver.rs      — dense primal-dual interior point method
//                    (Mehrotra predictor-corrector) in f64
//
//   sensitivity.rs — implicit differentiation of the KKT
//                    conditions: ∂z*/∂p and full input gradients
//
//   error.rs       — typed errors for invalid problems and
//                    solver failures
//
// The ml layer wraps these in a Burn-aware projection layer.
//
// Reference: Amos & Kolter (2017) OptNet: Differentiable
//            Optimization as a Layer in Neural Networks

pub mod error;
pub mod problem;
pub mod sensitivity;
pub mod solver;

pub use error::QpError;
pub use problem::QpProblem;
pub use sensitivity::{backward, solution_jacobian, QpGradients};
pub use solver::{PdipmSolver, QpSolution};
