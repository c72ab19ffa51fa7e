// ============================================================
// Layer 5 — Quadratic Program Definition
// ============================================================
// A convex QP in the form
//
//     minimize   ½ zᵀQz + pᵀz
//     subject to Gz ≤ h
//                Az = b
//
// The linear term p is NOT part of the problem: it is supplied
// per solve, because inside the model it is the decoder output
// and changes on every forward pass. Everything stored here is
// constant for the lifetime of the model and shared across all
// batch elements.
//
// Reference: Boyd & Vandenberghe (2004) Convex Optimization §4.4
//            Amos & Kolter (2017) OptNet

use nalgebra::{DMatrix, DVector};

use super::error::{QpError, QpResult};

/// Symmetry tolerance used when validating Q
const SYMMETRY_TOL: f64 = 1e-10;

/// The constant part of a quadratic program.
#[derive(Debug, Clone, PartialEq)]
pub struct QpProblem {
    q: DMatrix<f64>,
    g: DMatrix<f64>,
    h: DVector<f64>,
    a: DMatrix<f64>,
    b: DVector<f64>,
}

impl QpProblem {
    /// Build a problem from its matrices, validating every shape.
    ///
    /// `a` may have zero rows (no equality constraints), and `g`
    /// may have zero rows (unconstrained apart from equalities).
    pub fn new(
        q: DMatrix<f64>,
        g: DMatrix<f64>,
        h: DVector<f64>,
        a: DMatrix<f64>,
        b: DVector<f64>,
    ) -> QpResult<Self> {
        let nz = q.nrows();

        if nz == 0 || q.ncols() != nz {
            return Err(mismatch("Q", "square, non-empty".to_string(), shape(&q)));
        }
        if g.ncols() != nz {
            return Err(mismatch("G", format!("{} columns", nz), shape(&g)));
        }
        if h.len() != g.nrows() {
            return Err(mismatch("h", format!("length {}", g.nrows()), h.len().to_string()));
        }
        if a.ncols() != nz && a.nrows() > 0 {
            return Err(mismatch("A", format!("{} columns", nz), shape(&a)));
        }
        if b.len() != a.nrows() {
            return Err(mismatch("b", format!("length {}", a.nrows()), b.len().to_string()));
        }

        let asymmetry = (&q - q.transpose()).amax();
        if asymmetry > SYMMETRY_TOL || q.clone().cholesky().is_none() {
            return Err(QpError::NotPositiveDefinite);
        }

        // An A with zero rows may have been built with the wrong
        // column count; normalise it so later block assembly is uniform.
        let a = if a.nrows() == 0 { DMatrix::zeros(0, nz) } else { a };

        Ok(Self { q, g, h, a, b })
    }

    /// Build the model's projection problem: a scaled identity cost
    /// and a box of half-width 1 around the origin.
    ///
    /// Rows `0..nz` of G are the sign-flipped identity (`-z_i ≤ 1`),
    /// rows `nz..nineq` add the matching upper bounds (`z_i ≤ 1`).
    /// With `nineq == 2·nz` every coordinate is bounded on both sides;
    /// with fewer rows the trailing coordinates are bounded below only.
    pub fn box_constrained(nz: usize, nineq: usize, penalty: f64) -> QpResult<Self> {
        if nz == 0 {
            return Err(QpError::InvalidBox { reason: "nz must be positive".into() });
        }
        if !(penalty.is_finite() && penalty > 0.0) {
            return Err(QpError::InvalidBox {
                reason: format!("penalty must be positive, got {penalty}"),
            });
        }
        if nineq < nz || nineq > 2 * nz {
            return Err(QpError::InvalidBox {
                reason: format!("nineq must lie in [{nz}, {}], got {nineq}", 2 * nz),
            });
        }

        let q = DMatrix::identity(nz, nz) * penalty;

        let mut g = DMatrix::zeros(nineq, nz);
        for row in 0..nineq {
            if row < nz {
                g[(row, row)] = -1.0;
            } else {
                g[(row, row - nz)] = 1.0;
            }
        }
        let h = DVector::from_element(nineq, 1.0);

        Self::new(q, g, h, DMatrix::zeros(0, nz), DVector::zeros(0))
    }

    pub fn nz(&self)    -> usize { self.q.nrows() }
    pub fn nineq(&self) -> usize { self.g.nrows() }
    pub fn neq(&self)   -> usize { self.a.nrows() }

    pub fn q(&self) -> &DMatrix<f64> { &self.q }
    pub fn g(&self) -> &DMatrix<f64> { &self.g }
    pub fn h(&self) -> &DVector<f64> { &self.h }
    pub fn a(&self) -> &DMatrix<f64> { &self.a }
    pub fn b(&self) -> &DVector<f64> { &self.b }

    /// ½ zᵀQz + pᵀz
    pub fn objective(&self, z: &DVector<f64>, p: &DVector<f64>) -> f64 {
        0.5 * z.dot(&(&self.q * z)) + p.dot(z)
    }

    /// Largest violation over all constraints (0 when feasible).
    /// Equalities count in both directions.
    pub fn max_violation(&self, z: &DVector<f64>) -> f64 {
        let ineq = (&self.g * z - &self.h)
            .iter()
            .fold(0.0_f64, |acc, &v| acc.max(v));
        let eq = if self.neq() > 0 { (&self.a * z - &self.b).amax() } else { 0.0 };
        ineq.max(eq)
    }

    pub fn is_feasible(&self, z: &DVector<f64>, tol: f64) -> bool {
        self.max_violation(z) <= tol
    }

    /// Check that a linear term has the right length before solving.
    pub(crate) fn check_linear_term(&self, p: &DVector<f64>) -> QpResult<()> {
        if p.len() != self.nz() {
            return Err(mismatch("p", format!("length {}", self.nz()), p.len().to_string()));
        }
        Ok(())
    }
}

fn shape(m: &DMatrix<f64>) -> String {
    format!("{}x{}", m.nrows(), m.ncols())
}

fn mismatch(what: &'static str, expected: String, actual: String) -> QpError {
    QpError::DimensionMismatch { what, expected, actual }
}
