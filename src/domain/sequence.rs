// ============================================================
// Layer 3 — Sequence Window Domain Type
// ============================================================
// One model input: a window of time steps for a batch of
// independent series, each step carrying the same number of
// features.
//
// Layout is sequence-major, matching the tensor the model
// expects:
//
//   steps[t][b][f]   t = time step, b = batch element, f = feature
//
// The constructor checks the window is rectangular so every
// later layer can rely on seq_len × batch × features.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<f32>>>", into = "Vec<Vec<Vec<f32>>>")]
pub struct SequenceWindow {
    steps: Vec<Vec<Vec<f32>>>,
}

impl SequenceWindow {
    /// Validate and wrap a [seq_len][batch][features] array.
    pub fn new(steps: Vec<Vec<Vec<f32>>>) -> Result<Self> {
        ensure!(!steps.is_empty(), "sequence has no time steps");

        let batch = steps[0].len();
        ensure!(batch > 0, "sequence has no batch elements");

        let features = steps[0][0].len();
        ensure!(features > 0, "sequence has no features");

        for (t, step) in steps.iter().enumerate() {
            ensure!(
                step.len() == batch,
                "time step {t} has {} batch elements, expected {batch}", step.len()
            );
            for (b, row) in step.iter().enumerate() {
                ensure!(
                    row.len() == features,
                    "step {t}, batch element {b} has {} features, expected {features}", row.len()
                );
                ensure!(
                    row.iter().all(|v| v.is_finite()),
                    "step {t}, batch element {b} contains a non-finite value"
                );
            }
        }

        Ok(Self { steps })
    }

    pub fn seq_len(&self)       -> usize { self.steps.len() }
    pub fn batch_size(&self)    -> usize { self.steps[0].len() }
    pub fn feature_count(&self) -> usize { self.steps[0][0].len() }

    pub fn dims(&self) -> [usize; 3] {
        [self.seq_len(), self.batch_size(), self.feature_count()]
    }

    /// All values in sequence-major order
    pub fn flatten(&self) -> Vec<f32> {
        self.steps.iter().flatten().flatten().copied().collect()
    }
}

impl TryFrom<Vec<Vec<Vec<f32>>>> for SequenceWindow {
    type Error = anyhow::Error;

    fn try_from(steps: Vec<Vec<Vec<f32>>>) -> Result<Self> {
        Self::new(steps)
    }
}

impl From<SequenceWindow> for Vec<Vec<Vec<f32>>> {
    fn from(window: SequenceWindow) -> Self {
        window.steps
    }
}
