// ============================================================
// Layer 5 — QP Sensitivities (implicit differentiation)
// ============================================================
// At the optimum the KKT conditions hold:
//
//     Qz + p + Gᵀλ + Aᵀν = 0
//     diag(λ)(Gz − h)    = 0
//     Az − b             = 0
//
// Differentiating them gives a linear system in (dz, dλ, dν)
// whose matrix is
//
//         [ Q          Gᵀ        Aᵀ ]
//     K = [ diag(λ)G   −diag(s)  0  ]      (Gz − h = −s)
//         [ A          0         0  ]
//
// Two uses:
//   - solution_jacobian: ∂z*/∂p = −(K⁻¹)_zz, consumed by the
//     model layer to route gradients into the decoder output
//   - backward: adjoint solve Kᵀw = [∂L/∂z, 0, 0] yielding the
//     gradient of a scalar loss w.r.t. every problem input
//
// Reference: Amos & Kolter (2017) OptNet §3

use nalgebra::{DMatrix, DVector};

use super::error::{QpError, QpResult};
use super::problem::QpProblem;
use super::solver::{set_block, QpSolution};

/// Gradient of a scalar loss with respect to each QP input.
#[derive(Debug, Clone)]
pub struct QpGradients {
    pub q: DMatrix<f64>,
    pub p: DVector<f64>,
    pub g: DMatrix<f64>,
    pub h: DVector<f64>,
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
}

fn kkt_matrix(problem: &QpProblem, solution: &QpSolution) -> DMatrix<f64> {
    let (n, m, k) = (problem.nz(), problem.nineq(), problem.neq());
    let mut kkt = DMatrix::<f64>::zeros(n + m + k, n + m + k);

    set_block(&mut kkt, 0, 0, problem.q());
    set_block(&mut kkt, 0, n, &problem.g().transpose());
    set_block(&mut kkt, 0, n + m, &problem.a().transpose());

    let scaled_g = DMatrix::from_diagonal(&solution.lambda) * problem.g();
    set_block(&mut kkt, n, 0, &scaled_g);
    for i in 0..m {
        kkt[(n + i, n + i)] = -solution.slack[i];
    }

    set_block(&mut kkt, n + m, 0, problem.a());
    kkt
}

/// ∂z*/∂p as an `nz × nz` matrix (row i = ∂z_i/∂p).
pub fn solution_jacobian(problem: &QpProblem, solution: &QpSolution) -> QpResult<DMatrix<f64>> {
    let n   = problem.nz();
    let kkt = kkt_matrix(problem, solution);

    let mut rhs = DMatrix::<f64>::zeros(kkt.nrows(), n);
    for i in 0..n {
        rhs[(i, i)] = 1.0;
    }

    let x = kkt
        .lu()
        .solve(&rhs)
        .ok_or(QpError::SingularKkt { iteration: solution.iterations })?;

    Ok(DMatrix::from_fn(n, n, |i, j| -x[(i, j)]))
}

/// Gradients of a loss L(z*) w.r.t. Q, p, G, h, A and b, given ∂L/∂z*.
pub fn backward(
    problem:  &QpProblem,
    solution: &QpSolution,
    grad_z:   &DVector<f64>,
) -> QpResult<QpGradients> {
    problem.check_linear_term(grad_z)?;
    let (n, m, k) = (problem.nz(), problem.nineq(), problem.neq());

    let mut rhs = DVector::<f64>::zeros(n + m + k);
    for i in 0..n {
        rhs[i] = grad_z[i];
    }

    let w = kkt_matrix(problem, solution)
        .transpose()
        .lu()
        .solve(&rhs)
        .ok_or(QpError::SingularKkt { iteration: solution.iterations })?;

    let w_z      = DVector::from_iterator(n, w.iter().take(n).copied());
    let w_lambda = DVector::from_iterator(m, w.iter().skip(n).take(m).copied());
    let w_nu     = DVector::from_iterator(k, w.iter().skip(n + m).copied());

    let z      = &solution.z;
    let lambda = &solution.lambda;
    let nu     = &solution.nu;

    // dL/dθ = −wᵀ ∂F/∂θ for each input θ
    let scaled_w_lambda = lambda.component_mul(&w_lambda);

    let grad_q = -0.5 * (&w_z * z.transpose() + z * w_z.transpose());
    let grad_g = -(lambda * w_z.transpose() + &scaled_w_lambda * z.transpose());
    let grad_a = -(nu * w_z.transpose() + &w_nu * z.transpose());

    Ok(QpGradients {
        q: grad_q,
        p: -w_z,
        g: grad_g,
        h: scaled_w_lambda,
        a: grad_a,
        b: w_nu,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::qp::solver::PdipmSolver;

    #[test]
    fn test_jacobian_on_box() {
        // z = clip(−p/q): interior coordinates move with slope −1/q,
        // clipped ones do not move at all.
        let penalty = 0.1;
        let qp  = QpProblem::box_constrained(3, 6, penalty).unwrap();
        let p   = DVector::from_column_slice(&[0.05, -0.5, 0.3]);
        let sol = PdipmSolver::default().solve(&qp, &p).unwrap();

        let jac = solution_jacobian(&qp, &sol).unwrap();
        assert!((jac[(0, 0)] + 1.0 / penalty).abs() < 1e-4);
        assert!(jac[(1, 1)].abs() < 1e-4);
        assert!(jac[(2, 2)].abs() < 1e-4);
        assert!(jac[(0, 1)].abs() < 1e-8);
    }

    #[test]
    fn test_backward_matches_jacobian() {
        let qp  = QpProblem::box_constrained(3, 6, 0.5).unwrap();
        let p   = DVector::from_column_slice(&[0.1, -0.2, 0.9]);
        let sol = PdipmSolver::default().solve(&qp, &p).unwrap();

        let grad_z = DVector::from_column_slice(&[1.0, -2.0, 0.5]);
        let grads  = backward(&qp, &sol, &grad_z).unwrap();
        let jac    = solution_jacobian(&qp, &sol).unwrap();

        let expected = jac.transpose() * &grad_z;
        assert!((grads.p - expected).amax() < 1e-6);
    }

    #[test]
    fn test_backward_bound_gradient() {
        // z_0 sits on its upper bound z_0 ≤ h_3, so ∂z_0/∂h_3 = 1
        let qp  = QpProblem::box_constrained(3, 6, 1.0).unwrap();
        let p   = DVector::from_column_slice(&[-4.0, 0.2, 0.0]);
        let sol = PdipmSolver::default().solve(&qp, &p).unwrap();
        assert!((sol.z[0] - 1.0).abs() < 1e-6);

        let grad_z = DVector::from_column_slice(&[1.0, 0.0, 0.0]);
        let grads  = backward(&qp, &sol, &grad_z).unwrap();

        assert!((grads.h[3] - 1.0).abs() < 1e-4);
        assert!(grads.h[0].abs() < 1e-4);
        assert!(grads.p[0].abs() < 1e-4);
    }

    #[test]
    fn test_backward_cost_gradient() {
        // Interior coordinate: z_1 = −p_1/q_11, so ∂z_1/∂q_11 = −z_1/q_11
        let qp  = QpProblem::box_constrained(2, 4, 2.0).unwrap();
        let p   = DVector::from_column_slice(&[0.0, 1.0]);
        let sol = PdipmSolver::default().solve(&qp, &p).unwrap();

        let grad_z = DVector::from_column_slice(&[0.0, 1.0]);
        let grads  = backward(&qp, &sol, &grad_z).unwrap();

        let expected = -sol.z[1] / 2.0;
        assert!((grads.q[(1, 1)] - expected).abs() < 1e-5);
        assert_eq!(grads.a.nrows(), 0);
        assert!(grads.b.is_empty());
    }

    #[test]
    fn test_backward_rejects_wrong_gradient_length() {
        let qp  = QpProblem::box_constrained(2, 4, 1.0).unwrap();
        let sol = PdipmSolver::default().solve(&qp, &DVector::zeros(2)).unwrap();
        assert!(backward(&qp, &sol, &DVector::zeros(3)).is_err());
    }
}
