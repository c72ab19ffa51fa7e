// ============================================================
// Layer 2 — ProjectUseCase
// ============================================================
// Runs the model's projection on its own: takes a raw vector
// (what the decoder would emit) and solves the box-constrained
// QP for it, without any network in front.
//
// Given an upstream gradient ∂L/∂z*, it also reports how L
// responds to each QP input, the same quantities the model
// layer differentiates through.

use anyhow::{ensure, Result};

use crate::ml::qp_layer::QpProjection;
use crate::qp::{PdipmSolver, QpGradients, QpProblem};

/// Outcome of one standalone projection.
#[derive(Debug, Clone)]
pub struct ProjectionReport {
    pub z:          Vec<f64>,
    pub active:     Vec<usize>,
    pub iterations: usize,
    pub objective:  f64,
    /// Present when an upstream gradient was supplied
    pub gradients:  Option<QpGradients>,
}

pub struct ProjectUseCase {
    projection: QpProjection,
}

impl ProjectUseCase {
    /// `nineq = None` selects the double-sided box (2·nz rows).
    pub fn new(nz: usize, nineq: Option<usize>, q_penalty: f64) -> Result<Self> {
        let problem = QpProblem::box_constrained(nz, nineq.unwrap_or(2 * nz), q_penalty)?;
        Ok(Self { projection: QpProjection::new(problem, PdipmSolver::default()) })
    }

    pub fn execute(&self, raw: &[f64], upstream: Option<&[f64]>) -> Result<ProjectionReport> {
        let solution = self.projection.solve(raw)?;
        tracing::info!(
            "Projection solved in {} iterations, {} active constraints",
            solution.iterations,
            solution.active_constraints().len()
        );

        let gradients = match upstream {
            Some(grad_z) => {
                ensure!(
                    grad_z.len() == raw.len(),
                    "upstream gradient has {} entries, expected {}",
                    grad_z.len(), raw.len()
                );
                Some(self.projection.sensitivities(&solution, grad_z)?)
            }
            None => None,
        };

        Ok(ProjectionReport {
            active:     solution.active_constraints(),
            z:          solution.z.iter().copied().collect(),
            iterations: solution.iterations,
            objective:  solution.objective,
            gradients,
        })
    }
}
