// ============================================================
// Layer 2 — InitUseCase
// ============================================================
// Creates a checkpoint directory that ForwardUseCase can restore:
//
//   Step 1: Validate the config
//   Step 2: Build the stem (random embedding + projections)
//   Step 3: Save config.json and the weights record

use anyhow::Result;
use burn::prelude::*;
use std::path::PathBuf;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::config::TransformerConfig;

pub struct InitUseCase {
    config:         TransformerConfig,
    checkpoint_dir: PathBuf,
}

impl InitUseCase {
    pub fn new(config: TransformerConfig, checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self { config, checkpoint_dir: checkpoint_dir.into() }
    }

    /// Returns the number of learned parameters written.
    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<usize> {
        let cfg = &self.config;

        // ── Step 1 + 2: construction fails fast on a bad config ──────────────
        let d_k   = cfg.validate()?;
        let model = cfg.init::<B>(device)?;
        let params = model.num_params();
        tracing::info!(
            "Built stem: d_model={}, heads={} (d_k={}), {} parameters",
            cfg.d_model, cfg.num_heads, d_k, params
        );

        // ── Step 3: persist ──────────────────────────────────────────────────
        let ckpt = CheckpointManager::new(self.checkpoint_dir.clone())?;
        if ckpt.exists() {
            tracing::warn!("Overwriting checkpoint in '{}'", ckpt.dir().display());
        }
        ckpt.save(cfg, &model)?;
        tracing::info!("Checkpoint written to '{}'", ckpt.dir().display());

        Ok(params)
    }
}
