// ============================================================
// Layer 3 — Projected Output Domain Type
// ============================================================
// The model's answer for one window: one feasible point per
// batch element, each of dimension nz.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedBatch {
    rows: Vec<Vec<f32>>,
}

impl ProjectedBatch {
    pub fn new(rows: Vec<Vec<f32>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Width of each row (0 for an empty batch)
    pub fn nz(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Largest |z_i| over the whole batch
    pub fn max_abs(&self) -> f32 {
        self.rows
            .iter()
            .flatten()
            .fold(0.0_f32, |acc, v| acc.max(v.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_abs_and_width() {
        let b = ProjectedBatch::new(vec![vec![0.5, -0.9], vec![0.1, 0.2]]);
        assert_eq!(b.len(), 2);
        assert_eq!(b.nz(), 2);
        assert!((b.max_abs() - 0.9).abs() < 1e-7);
        assert_eq!(ProjectedBatch::new(vec![]).nz(), 0);
    }
}
