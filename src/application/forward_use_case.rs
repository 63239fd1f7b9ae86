// ============================================================
// Layer 2 — ForwardUseCase
// ============================================================
// Runs token ids through a restored checkpoint:
//
//   Step 1: Restore config + weights      (Layer 6 - infra)
//   Step 2: Check ids against the vocab   (Layer 3 - domain)
//   Step 3: Build causal / padding masks  (Layer 5 - ml)
//   Step 4: Embeddings → self-attention   (Layer 5 - ml)
//   Step 5: Summarise, optionally export  (Layer 6 - infra)

use anyhow::Result;
use burn::prelude::*;
use std::path::PathBuf;

use crate::domain::tokens::TokenBatch;
use crate::infra::{attention_export::export_attention_csv, checkpoint::CheckpointManager};
use crate::ml::mask::{causal_mask, combine_masks, padding_mask};

/// Where the token ids come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// "1,2,3;4,5,6"
    Text(String),
    Random { batch: usize, seq_len: usize },
}

#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub tokens:     TokenSource,
    pub causal:     bool,
    pub pad_id:     Option<i64>,
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ForwardReport {
    pub context_shape: [usize; 3],
    pub weights_shape: [usize; 4],
    /// Largest |Σ weights - 1| over all query rows (0 unless dropout is active)
    pub max_row_deviation: f32,
    /// Mean of the context tensor, a cheap fingerprint of the output
    pub context_mean: f32,
    pub exported: Vec<PathBuf>,
}

pub struct ForwardUseCase {
    checkpoint_dir: PathBuf,
}

impl ForwardUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into() }
    }

    pub fn execute<B: Backend>(&self, request: &ForwardRequest, device: &B::Device) -> Result<ForwardReport> {
        // ── Step 1: restore ──────────────────────────────────────────────────
        let ckpt = CheckpointManager::new(self.checkpoint_dir.clone())?;
        let (cfg, model) = ckpt.restore::<B>(device)?;

        // ── Step 2: ids are checked here, the embedding never checks ─────────
        let batch = match &request.tokens {
            TokenSource::Text(text) => TokenBatch::parse(text, cfg.vocab_size)?,
            TokenSource::Random { batch, seq_len } => TokenBatch::random(*batch, *seq_len, cfg.vocab_size)?,
        };
        let (n, seq_len) = (batch.batch(), batch.seq_len());
        tracing::info!("Running {} sequence(s) of length {}", n, seq_len);

        let tokens = Tensor::<B, 1, Int>::from_ints(batch.ids(), device).reshape([n, seq_len]);

        // ── Step 3: masks ────────────────────────────────────────────────────
        let causal  = request.causal.then(|| causal_mask::<B>(n, seq_len, device));
        let padding = request.pad_id.map(|pad| padding_mask(tokens.clone(), pad, seq_len));
        let mask = match (causal, padding) {
            (Some(c), Some(p)) => Some(combine_masks(c, p)),
            (c, p)             => c.or(p),
        };

        // ── Step 4: forward ──────────────────────────────────────────────────
        let output = model.forward(tokens, mask)?;

        // ── Step 5: report ───────────────────────────────────────────────────
        let weights_shape = output.weights.dims();
        let row_sums: Vec<f32> = output
            .weights
            .clone()
            .sum_dim(3)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read attention weights: {e:?}"))?;
        let max_row_deviation = row_sums
            .iter()
            .map(|s| (s - 1.0).abs())
            .fold(0.0_f32, f32::max);

        let context_mean = output
            .context
            .clone()
            .mean()
            .into_scalar()
            .elem::<f32>();

        let exported = match &request.export_dir {
            Some(dir) => export_attention_csv(&output.weights, dir, "self_attention")?,
            None      => Vec::new(),
        };

        Ok(ForwardReport {
            context_shape: output.context.dims(),
            weights_shape,
            max_row_deviation,
            context_mean,
            exported,
        })
    }
}
