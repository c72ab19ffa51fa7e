// ============================================================
// Layer 2 — InitUseCase
// ============================================================
// Builds a freshly initialised regressor and writes it to the
// checkpoint directory:
//
//   Step 1: Validate settings by building the model   (Layer 5 - ml)
//   Step 2: Save model_settings.json                  (Layer 6 - infra)
//   Step 3: Save the initial weights                  (Layer 6 - infra)
//
// Training is driven elsewhere; this gives it (and `predict`)
// a consistent starting checkpoint.

use anyhow::Result;
use burn::prelude::*;

use crate::application::model_settings::ModelSettings;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::ConstrainedSequenceRegressor;

pub struct InitUseCase {
    settings: ModelSettings,
}

impl InitUseCase {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<CheckpointManager> {
        let cfg = &self.settings;

        // ── Step 1: Build the model (fails fast on invalid settings) ──────────
        let model: ConstrainedSequenceRegressor<B> = cfg.to_model_config().init::<B>(device)?;
        tracing::info!(
            "Model ready: input_size={}, hidden={:?}, nz={}, nineq={}",
            cfg.input_size, cfg.hidden_sizes, cfg.nz, cfg.nineq
        );

        // ── Step 2 + 3: Persist settings and weights ─────────────────────────
        let ckpt_manager = CheckpointManager::new(cfg.checkpoint_dir.clone())?;
        ckpt_manager.save_settings(cfg)?;
        ckpt_manager.save_model(&model)?;
        tracing::info!("Checkpoint written to '{}'", ckpt_manager.dir().display());

        Ok(ckpt_manager)
    }
}
