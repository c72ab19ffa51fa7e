// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a checkpoint, reads one input window and projects it:
//
//   Step 1: Rebuild the model from the checkpoint   (Layer 5 - ml)
//   Step 2: Load the input window                   (Layer 4 - data)
//   Step 3: Forward pass + QP projection            (Layer 5 - ml)
//   Step 4: Optionally persist the result           (Layer 6 - infra)

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::domain::projection::ProjectedBatch;
use crate::domain::traits::{ProjectionSink, SequenceSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase<B: Backend> {
    inferencer: Inferencer<B>,
}

impl<B: Backend> PredictUseCase<B> {
    pub fn new(checkpoint_dir: impl Into<String>, device: B::Device) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(checkpoint_dir)?;
        let inferencer   = Inferencer::from_checkpoint(&ckpt_manager, device)?;
        Ok(Self { inferencer })
    }

    pub fn execute(
        &self,
        source: &dyn SequenceSource,
        sink:   Option<&dyn ProjectionSink>,
    ) -> Result<ProjectedBatch> {
        let window = source.load()?;
        let expected = self.inferencer.model().input_size;
        ensure!(
            window.feature_count() == expected,
            "input has {} features per step but the model expects {}",
            window.feature_count(), expected
        );
        tracing::info!("Projecting window {:?}", window.dims());

        let projected = self.inferencer.predict(&window)?;
        tracing::info!(
            "Projected {} rows, max |z| = {:.4}",
            projected.len(), projected.max_abs()
        );

        if let Some(sink) = sink {
            sink.write(&projected)?;
        }
        Ok(projected)
    }
}
