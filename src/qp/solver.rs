// ============================================================
// Layer 5 — Primal-Dual Interior Point Solver
// ============================================================
// Solves one QP instance on the host in f64.
//
// Slack form of the problem:
//
//     minimize ½ zᵀQz + pᵀz   s.t.  Gz + s = h,  s ≥ 0,  Az = b
//
// Residuals at (z, s, λ, ν):
//
//     r_dual = Qz + p + Gᵀλ + Aᵀν
//     r_ineq = Gz + s − h
//     r_eq   = Az − b
//     μ      = sᵀλ / m
//
// Stopping uses the largest single product s_i·λ_i rather than
// μ, so no constraint is left loosely complementary.
//
// Each iteration runs Mehrotra's predictor-corrector:
//   1. affine (predictor) direction with σ = 0
//   2. centring σ = (μ_aff / μ)³
//   3. corrector direction that also cancels Δs_aff ∘ Δλ_aff
// Both directions share one LU factorisation of the reduced
// KKT matrix
//
//     [ Q + Gᵀ diag(λ/s) G   Aᵀ ] [Δz]
//     [ A                    0  ] [Δν]
//
// On convergence z is polished: the constraints the iterate marks
// as active are imposed as equalities and the resulting KKT system
// is solved directly. This removes the O(√μ) error interior point
// leaves at degenerate optima (a solution sitting exactly on a
// bound with a zero multiplier). The polished point is kept only
// if it is feasible with nonnegative multipliers.
//
// Reference: Wright (1997) Primal-Dual Interior-Point Methods
//            Mehrotra (1992) SIAM J. Optimization

use nalgebra::{DMatrix, DVector};

use super::error::{QpError, QpResult};
use super::problem::QpProblem;

/// Fraction of the distance to the boundary taken by each step
const STEP_FRACTION: f64 = 0.99;

/// Dual value above which an inequality is reported as active
const ACTIVE_DUAL_TOL: f64 = 1e-6;

/// Primal-dual interior point settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PdipmSolver {
    /// Maximum number of predictor-corrector iterations
    max_iter:  usize,
    /// Residual and duality-gap tolerance
    tolerance: f64,
}

impl Default for PdipmSolver {
    fn default() -> Self {
        Self { max_iter: 100, tolerance: 1e-9 }
    }
}

/// Optimal primal and dual variables of one solve.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// Primal solution z*
    pub z:          DVector<f64>,
    /// Inequality multipliers λ (one per row of G)
    pub lambda:     DVector<f64>,
    /// Equality multipliers ν (one per row of A)
    pub nu:         DVector<f64>,
    /// Slacks of the final interior-point iterate (≈ h − Gz*)
    pub slack:      DVector<f64>,
    pub iterations: usize,
    pub objective:  f64,
}

impl QpSolution {
    /// Indices of inequality rows holding at the optimum.
    pub fn active_constraints(&self) -> Vec<usize> {
        self.lambda
            .iter()
            .zip(self.slack.iter())
            .enumerate()
            .filter(|(_, (&l, &s))| l > ACTIVE_DUAL_TOL && l > s)
            .map(|(i, _)| i)
            .collect()
    }
}

/// One Newton direction for the full variable set.
struct Direction {
    dz:      DVector<f64>,
    ds:      DVector<f64>,
    dlambda: DVector<f64>,
    dnu:     DVector<f64>,
}

impl PdipmSolver {
    pub fn new(max_iter: usize, tolerance: f64) -> Self {
        Self { max_iter, tolerance }
    }

    /// Solve the problem for the linear term `p`.
    pub fn solve(&self, problem: &QpProblem, p: &DVector<f64>) -> QpResult<QpSolution> {
        problem.check_linear_term(p)?;

        let (n, m, k) = (problem.nz(), problem.nineq(), problem.neq());
        let (q, g, h, a, b) = (problem.q(), problem.g(), problem.h(), problem.a(), problem.b());

        // Residual scales so tolerances are relative to the data
        let dual_scale   = 1.0 + p.amax();
        let primal_scale = 1.0 + inf_norm(h).max(inf_norm(b));

        // ── Starting point ────────────────────────────────────────────────────
        let mut z      = DVector::<f64>::zeros(n);
        let mut s      = (h - g * &z).map(|v| v.max(1.0));
        let mut lambda = DVector::<f64>::from_element(m, 1.0);
        let mut nu     = DVector::<f64>::zeros(k);

        let mut primal_res = f64::INFINITY;
        let mut dual_res   = f64::INFINITY;
        let mut gap        = f64::INFINITY;

        for iteration in 0..self.max_iter {
            let r_dual = q * &z + p + g.tr_mul(&lambda) + a.tr_mul(&nu);
            let r_ineq = g * &z + &s - h;
            let r_eq   = a * &z - b;
            let mu     = if m > 0 { s.dot(&lambda) / m as f64 } else { 0.0 };

            dual_res   = r_dual.amax() / dual_scale;
            primal_res = inf_norm(&r_ineq).max(inf_norm(&r_eq)) / primal_scale;
            gap        = inf_norm(&s.component_mul(&lambda));

            if dual_res <= self.tolerance && primal_res <= self.tolerance && gap <= self.tolerance {
                tracing::debug!(
                    "QP converged in {} iterations (gap={:.2e})",
                    iteration, gap
                );
                let z = self
                    .polish(problem, p, &lambda, &s, primal_scale, dual_scale)
                    .unwrap_or(z);
                let objective = problem.objective(&z, p);
                return Ok(QpSolution {
                    z, lambda, nu, slack: s,
                    iterations: iteration,
                    objective,
                });
            }

            // ── Factorise the reduced KKT matrix once per iteration ───────────
            let weights = lambda.component_div(&s);
            let hessian = q + g.transpose() * DMatrix::from_diagonal(&weights) * g;
            let mut kkt = DMatrix::<f64>::zeros(n + k, n + k);
            set_block(&mut kkt, 0, 0, &hessian);
            set_block(&mut kkt, 0, n, &a.transpose());
            set_block(&mut kkt, n, 0, a);
            let lu = kkt.lu();

            let solve_direction = |r_comp: &DVector<f64>| -> Option<Direction> {
                // Eliminate Δs and Δλ:
                //   Δs = −r_ineq − GΔz
                //   Δλ = (−r_comp − λ∘Δs) / s
                let shifted = (lambda.component_mul(&r_ineq) - r_comp).component_div(&s);
                let rhs_z   = -&r_dual - g.tr_mul(&shifted);
                let rhs     = stack(&rhs_z, &(-&r_eq));
                let sol     = lu.solve(&rhs)?;

                let dz      = DVector::from_iterator(n, sol.iter().take(n).copied());
                let dnu     = DVector::from_iterator(k, sol.iter().skip(n).copied());
                let ds      = -&r_ineq - g * &dz;
                let dlambda = (-r_comp - lambda.component_mul(&ds)).component_div(&s);
                Some(Direction { dz, ds, dlambda, dnu })
            };

            // ── Predictor ─────────────────────────────────────────────────────
            let r_comp_aff = s.component_mul(&lambda);
            let affine = solve_direction(&r_comp_aff)
                .ok_or(QpError::SingularKkt { iteration })?;

            let alpha_aff = max_step(&s, &affine.ds)
                .min(max_step(&lambda, &affine.dlambda))
                .min(1.0);
            let sigma = if m > 0 && mu > 0.0 {
                let s_aff = &s + &affine.ds * alpha_aff;
                let l_aff = &lambda + &affine.dlambda * alpha_aff;
                let mu_aff = s_aff.dot(&l_aff) / m as f64;
                (mu_aff / mu).powi(3)
            } else {
                0.0
            };

            // ── Corrector ─────────────────────────────────────────────────────
            let r_comp = r_comp_aff
                + affine.ds.component_mul(&affine.dlambda)
                - DVector::from_element(m, sigma * mu);
            let step = solve_direction(&r_comp)
                .ok_or(QpError::SingularKkt { iteration })?;

            let alpha = (STEP_FRACTION
                * max_step(&s, &step.ds).min(max_step(&lambda, &step.dlambda)))
                .min(1.0);

            z      += &step.dz * alpha;
            s      += &step.ds * alpha;
            lambda += &step.dlambda * alpha;
            nu     += &step.dnu * alpha;

            let finite = z.iter().chain(s.iter()).chain(lambda.iter()).chain(nu.iter())
                .all(|v| v.is_finite());
            if !finite {
                return Err(QpError::NonFinite { iteration });
            }
        }

        Err(QpError::NotConverged {
            iterations:      self.max_iter,
            primal_residual: primal_res,
            dual_residual:   dual_res,
            gap,
        })
    }

    /// Solve the equality-constrained KKT system on the active set
    /// {i : λ_i > s_i}:
    ///
    ///     [ Q    G_aᵀ  Aᵀ ] [z  ]   [ −p  ]
    ///     [ G_a  0     0  ] [λ_a] = [ h_a ]
    ///     [ A    0     0  ] [ν  ]   [ b   ]
    fn polish(
        &self,
        problem:      &QpProblem,
        p:            &DVector<f64>,
        lambda:       &DVector<f64>,
        s:            &DVector<f64>,
        primal_scale: f64,
        dual_scale:   f64,
    ) -> Option<DVector<f64>> {
        let (n, k) = (problem.nz(), problem.neq());
        let active = (0..problem.nineq())
            .filter(|&i| lambda[i] > s[i])
            .collect::<Vec<_>>();
        let r = active.len();

        let g_active = DMatrix::from_fn(r, n, |i, j| problem.g()[(active[i], j)]);
        let mut kkt  = DMatrix::<f64>::zeros(n + r + k, n + r + k);
        set_block(&mut kkt, 0, 0, problem.q());
        set_block(&mut kkt, 0, n, &g_active.transpose());
        set_block(&mut kkt, 0, n + r, &problem.a().transpose());
        set_block(&mut kkt, n, 0, &g_active);
        set_block(&mut kkt, n + r, 0, problem.a());

        let rhs = DVector::from_iterator(
            n + r + k,
            p.iter()
                .map(|v| -v)
                .chain(active.iter().map(|&i| problem.h()[i]))
                .chain(problem.b().iter().copied()),
        );
        let sol = kkt.lu().solve(&rhs)?;

        let z = DVector::from_iterator(n, sol.iter().take(n).copied());
        let multipliers_ok = sol
            .iter()
            .skip(n)
            .take(r)
            .all(|&l| l >= -self.tolerance * dual_scale);
        let accepted = z.iter().all(|v| v.is_finite())
            && multipliers_ok
            && problem.is_feasible(&z, self.tolerance * primal_scale);

        if !accepted {
            tracing::debug!("Polished point rejected, keeping interior iterate");
        }
        accepted.then_some(z)
    }
}

/// Largest α ∈ (0, 1/STEP_FRACTION] keeping v + α·dv ≥ 0.
/// Returns a value above 1 when no component decreases, so the
/// caller's clamp decides the final length.
fn max_step(v: &DVector<f64>, dv: &DVector<f64>) -> f64 {
    v.iter()
        .zip(dv.iter())
        .filter(|(_, &d)| d < 0.0)
        .map(|(&x, &d)| -x / d)
        .fold(1.0 / STEP_FRACTION, f64::min)
}

fn inf_norm(v: &DVector<f64>) -> f64 {
    if v.is_empty() { 0.0 } else { v.amax() }
}

fn stack(top: &DVector<f64>, bottom: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        top.len() + bottom.len(),
        top.iter().chain(bottom.iter()).copied(),
    )
}

/// Copy `block` into `target` with its top-left corner at (row, col).
pub(crate) fn set_block(target: &mut DMatrix<f64>, row: usize, col: usize, block: &DMatrix<f64>) {
    for i in 0..block.nrows() {
        for j in 0..block.ncols() {
            target[(row + i, col + j)] = block[(i, j)];
        }
    }
}
