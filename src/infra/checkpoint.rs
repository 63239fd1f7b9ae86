// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores an AttentionStem using Burn's CompactRecorder.
//
// What gets saved:
//   1. weights.mpk.gz — learned parameters (embedding table and the
//                       q/k/v/out projections)
//   2. config.json    — the TransformerConfig the stem was built from
//
// The sinusoidal positional table is NOT in the record. It is a
// constant tensor inside PositionalEncoding, so Burn writes an
// empty constant record for it; restore() rebuilds the table from
// config.json before loading the weights.
//
// Burn's CompactRecorder:
//   - Serialises parameters to MessagePack
//   - Stores floats at half precision and gzips the result
//   - Type-safe: loading fails if the architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::ml::config::TransformerConfig;
use crate::ml::stem::AttentionStem;

const WEIGHTS_FILE: &str = "weights";
const CONFIG_FILE:  &str = "config.json";

/// Manages one checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory (like `mkdir -p`) if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// True once both the config and a weights record have been written.
    pub fn exists(&self) -> bool {
        self.dir.join(CONFIG_FILE).exists() && self.weight_files().next().is_some()
    }

    /// Files written by the recorder (the extension is the recorder's choice).
    pub fn weight_files(&self) -> impl Iterator<Item = PathBuf> {
        fs::read_dir(&self.dir)
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(WEIGHTS_FILE))
            })
    }

    /// Write the stem's parameters.
    pub fn save_model<B: Backend>(&self, model: &AttentionStem<B>) -> Result<()> {
        // The recorder appends its own extension
        let path = self.dir.join(WEIGHTS_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved weights to '{}'", path.display());
        Ok(())
    }

    /// Load saved parameters into a stem with the matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  AttentionStem<B>,
        device: &B::Device,
    ) -> Result<AttentionStem<B>> {
        let path = self.dir.join(WEIGHTS_FILE);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you run 'init' first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TransformerConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TransformerConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Save both the config and the weights.
    pub fn save<B: Backend>(&self, cfg: &TransformerConfig, model: &AttentionStem<B>) -> Result<()> {
        self.save_config(cfg)?;
        self.save_model(model)
    }

    /// Rebuild the stem from config.json (fresh positional table),
    /// then load the learned weights into it.
    pub fn restore<B: Backend>(&self, device: &B::Device) -> Result<(TransformerConfig, AttentionStem<B>)> {
        let cfg   = self.load_config()?;
        let model = cfg.init::<B>(device)?;
        let model = self.load_model(model, device)?;

        tracing::info!(
            "Restored checkpoint from '{}' (d_model={}, heads={})",
            self.dir.display(), cfg.d_model, cfg.num_heads
        );
        Ok((cfg, model))
    }
}
