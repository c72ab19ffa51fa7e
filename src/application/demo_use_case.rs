// ============================================================
// Layer 2 — DemoUseCase
// ============================================================
// End-to-end smoke run of the regressor on generated data:
//
//   Step 1: Build the model on an autodiff backend     (Layer 5 - ml)
//   Step 2: Generate a random window                   (Layer 4 - data)
//   Step 3: Forward + summed squared error against 0   (Layer 5 - ml)
//   Step 4: Backward, report the decoder gradient norm (Layer 5 - ml)
//
// No optimizer step is taken; the point is to show that the
// projected outputs stay inside the box and that gradients
// reach the trainable parameters through the QP layer.

use anyhow::{Context, Result};
use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::application::model_settings::ModelSettings;
use crate::data::{batcher::SequenceBatcher, synthetic::SyntheticSequence};
use crate::domain::{projection::ProjectedBatch, traits::SequenceSource};
use crate::ml::model::ConstrainedSequenceRegressor;

/// What one demo pass produced.
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub output:             ProjectedBatch,
    pub loss:               f32,
    pub decoder_grad_norm:  f32,
}

pub struct DemoUseCase {
    settings: ModelSettings,
    seq_len:  usize,
    seed:     u64,
}

impl DemoUseCase {
    pub fn new(settings: ModelSettings, seq_len: usize, seed: u64) -> Self {
        Self { settings, seq_len, seed }
    }

    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<DemoReport> {
        let cfg = &self.settings;

        // ── Step 1: Model ─────────────────────────────────────────────────────
        let model: ConstrainedSequenceRegressor<B> = cfg.to_model_config().init::<B>(device)?;

        // ── Step 2: Data ──────────────────────────────────────────────────────
        let window = SyntheticSequence {
            seq_len:  self.seq_len,
            batch:    cfg.batch_size,
            features: cfg.input_size,
            seed:     self.seed,
        }
        .load()?;
        tracing::info!("Generated window {:?} (seed {})", window.dims(), self.seed);

        let batcher = SequenceBatcher::<B>::new(device.clone());
        let input   = batcher.batch(&window);
        let target  = Tensor::<B, 2>::zeros([window.batch_size(), cfg.nz], device);

        // ── Step 3: Forward ───────────────────────────────────────────────────
        let (loss, output) = model.forward_loss(input, target)?;
        let loss_value = loss
            .clone()
            .into_data()
            .iter::<f32>()
            .next()
            .context("loss tensor is empty")?;

        // ── Step 4: Backward ──────────────────────────────────────────────────
        let grads = loss.backward();
        let decoder_grad = model
            .decoder
            .weight
            .grad(&grads)
            .context("decoder weight received no gradient")?;
        let decoder_grad_norm = decoder_grad
            .into_data()
            .iter::<f32>()
            .map(|g| g * g)
            .sum::<f32>()
            .sqrt();

        let nz   = cfg.nz;
        let flat = output.into_data().iter::<f32>().collect::<Vec<_>>();
        let rows = flat.chunks(nz).map(<[f32]>::to_vec).collect();

        tracing::info!("loss = {:.6}, |∂L/∂W_dec| = {:.6}", loss_value, decoder_grad_norm);
        Ok(DemoReport {
            output: ProjectedBatch::new(rows),
            loss:   loss_value,
            decoder_grad_norm,
        })
    }
}
