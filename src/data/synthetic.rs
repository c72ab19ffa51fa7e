// ============================================================
// Layer 4 — Synthetic Sequence Generator
// ============================================================
// Seeded uniform noise in [-1, 1], used by the `demo` command
// to exercise the model without an input file. The same seed
// always yields the same window.

use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::sequence::SequenceWindow;
use crate::domain::traits::SequenceSource;

pub struct SyntheticSequence {
    pub seq_len:  usize,
    pub batch:    usize,
    pub features: usize,
    pub seed:     u64,
}

impl SequenceSource for SyntheticSequence {
    fn load(&self) -> Result<SequenceWindow> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let steps = (0..self.seq_len)
            .map(|_| {
                (0..self.batch)
                    .map(|_| (0..self.features).map(|_| rng.gen_range(-1.0..=1.0)).collect())
                    .collect()
            })
            .collect();

        SequenceWindow::new(steps)
    }
}
