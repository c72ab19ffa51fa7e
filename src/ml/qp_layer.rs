// ============================================================
// Layer 5 — Differentiable QP Projection Layer
// ============================================================
// Bridges the Burn graph and the host-side QP solver.
//
// Forward, per batch element:
//   z* = argmin ½ zᵀQz + pᵀz  s.t. Gz ≤ h
// where p is the row of the decoder output.
//
// Backward: the solver runs outside the autodiff graph, so the
// layer re-enters it with a first-order expansion around the
// solution:
//
//     out = z* + J · (p − stopgrad(p))
//
// The second term is exactly zero in value, so out == z*, but
// its gradient with respect to p is J = ∂z*/∂p, the implicit
// KKT derivative from qp::sensitivity. Q, G and h are frozen
// constants, so p is the only input that needs a gradient.
//
// On a non-autodiff backend the Jacobian is skipped entirely.

use burn::prelude::*;
use nalgebra::DVector;

use crate::ml::error::ModelError;
use crate::qp::{backward, solution_jacobian, PdipmSolver, QpGradients, QpProblem, QpSolution};

#[derive(Debug, Clone)]
pub struct QpProjection {
    problem: QpProblem,
    solver:  PdipmSolver,
}

impl QpProjection {
    pub fn new(problem: QpProblem, solver: PdipmSolver) -> Self {
        Self { problem, solver }
    }

    pub fn nz(&self) -> usize { self.problem.nz() }

    /// Solve one raw vector without touching Burn.
    pub fn solve(&self, p: &[f64]) -> Result<QpSolution, ModelError> {
        let p = DVector::from_column_slice(p);
        Ok(self.solver.solve(&self.problem, &p)?)
    }

    /// Gradients of a loss w.r.t. every QP input at `solution`,
    /// given ∂L/∂z*.
    pub fn sensitivities(
        &self,
        solution: &QpSolution,
        grad_z:   &[f64],
    ) -> Result<QpGradients, ModelError> {
        let grad_z = DVector::from_column_slice(grad_z);
        Ok(backward(&self.problem, solution, &grad_z)?)
    }

    /// p: [batch, nz] → z*: [batch, nz]
    pub fn forward<B: Backend>(&self, p: Tensor<B, 2>) -> Result<Tensor<B, 2>, ModelError> {
        let [batch_size, nz] = p.dims();
        if nz != self.nz() {
            return Err(ModelError::InputShape {
                expected: format!("[batch, {}]", self.nz()),
                actual:   vec![batch_size, nz],
            });
        }

        let device      = p.device();
        let track_grads = B::ad_enabled();
        let raw: Vec<f64> = p.clone().into_data().iter::<f64>().collect();

        let mut solutions = Vec::with_capacity(batch_size * nz);
        let mut jacobians = Vec::with_capacity(if track_grads { batch_size * nz * nz } else { 0 });

        for (index, row) in raw.chunks(nz).enumerate() {
            let p_row    = DVector::from_column_slice(row);
            let solution = self.solver
                .solve(&self.problem, &p_row)
                .map_err(|source| ModelError::Projection { index, source })?;
            solutions.extend(solution.z.iter().map(|&v| v as f32));

            if track_grads {
                let jac = solution_jacobian(&self.problem, &solution)
                    .map_err(|source| ModelError::Projection { index, source })?;
                // row-major so that reshape gives jac[b, i, j] = ∂z_i/∂p_j
                for i in 0..nz {
                    for j in 0..nz {
                        jacobians.push(jac[(i, j)] as f32);
                    }
                }
            }
        }

        let z_star = Tensor::<B, 2>::from_data(
            TensorData::new(solutions, [batch_size, nz]),
            &device,
        );
        if !track_grads {
            return Ok(z_star);
        }

        let jacobian = Tensor::<B, 3>::from_data(
            TensorData::new(jacobians, [batch_size, nz, nz]),
            &device,
        );
        let delta = (p.clone() - p.detach()).reshape([batch_size, nz, 1]);
        let first_order = jacobian.matmul(delta).reshape([batch_size, nz]);

        Ok(z_star + first_order)
    }
}
