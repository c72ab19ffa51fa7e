// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::SequenceBatcher;
use crate::domain::projection::ProjectedBatch;
use crate::domain::sequence::SequenceWindow;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::ConstrainedSequenceRegressor;

/// Runs a saved regressor in evaluation mode (no autodiff,
/// dropout inactive).
pub struct Inferencer<B: Backend> {
    model:   ConstrainedSequenceRegressor<B>,
    batcher: SequenceBatcher<B>,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: ConstrainedSequenceRegressor<B>, device: B::Device) -> Self {
        Self { model, batcher: SequenceBatcher::new(device) }
    }

    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let settings = ckpt_manager.load_settings()?;
        let model: ConstrainedSequenceRegressor<B> =
            settings.to_model_config().init::<B>(&device)?;
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!(
            "Model loaded from checkpoint (input_size={}, nz={})",
            settings.input_size, settings.nz
        );
        Ok(Self::new(model, device))
    }

    pub fn model(&self) -> &ConstrainedSequenceRegressor<B> {
        &self.model
    }

    pub fn predict(&self, window: &SequenceWindow) -> Result<ProjectedBatch> {
        let input  = self.batcher.batch(window);
        let output = self.model.forward(input)?;
        let [batch_size, nz] = output.dims();

        let flat: Vec<f32> = output.into_data().iter::<f32>().collect();
        let rows = flat.chunks(nz).map(<[f32]>::to_vec).collect::<Vec<_>>();
        tracing::debug!("Projected {} batch elements onto {} dims", batch_size, nz);

        Ok(ProjectedBatch::new(rows))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::application::model_settings::ModelSettings;

    type TestBackend = NdArray;

    #[test]
    fn test_predict_returns_one_row_per_batch_element() {
        let device = Default::default();
        let settings = ModelSettings {
            nz: 3, nineq: 6, n_outputs: 3, input_size: 2,
            hidden_sizes: vec![3, 3, 3],
            ..ModelSettings::default()
        };
        let model = settings.to_model_config().init::<TestBackend>(&device).unwrap();
        let inferencer = Inferencer::new(model, device);

        let window = SequenceWindow::new(vec![
            vec![vec![0.1, 0.2], vec![0.3, -0.4]],
            vec![vec![0.0, 0.5], vec![-0.1, 0.9]],
        ]).unwrap();

        let batch = inferencer.predict(&window).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.rows().iter().all(|r| r.len() == 3));
        assert!(batch.max_abs() <= 1.0 + 1e-5);
    }
}
