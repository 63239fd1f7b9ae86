// ============================================================
// Layer 6 — Attention Weight Export
// ============================================================
// Writes attention weights to CSV so they can be plotted as heat
// maps. One file per (batch, head):
//
//   exports/{name}_batch{b}_head{h}.csv
//
//   query\key,0,1,2
//   0,0.500000,0.250000,0.250000
//   1,...
//
// Rows are queries, columns are keys; each row sums to 1 unless
// dropout was active when the weights were produced.

use anyhow::{ensure, Context, Result};
use burn::prelude::*;
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

/// Sequences longer than this are skipped: the CSVs stop being readable.
pub const MAX_EXPORT_LEN: usize = 64;

/// weights: [batch, heads, seq_q, seq_k]. Returns the files written.
pub fn export_attention_csv<B: Backend>(
    weights: &Tensor<B, 4>,
    dir:     &Path,
    name:    &str,
) -> Result<Vec<PathBuf>> {
    let [batch, heads, seq_q, seq_k] = weights.dims();
    if seq_q > MAX_EXPORT_LEN || seq_k > MAX_EXPORT_LEN {
        tracing::warn!(
            "Skipping attention export: {}x{} exceeds {} positions",
            seq_q, seq_k, MAX_EXPORT_LEN
        );
        return Ok(Vec::new());
    }

    let values: Vec<f32> = weights
        .to_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| anyhow::anyhow!("Cannot read attention weights: {e:?}"))?;
    ensure!(values.len() == batch * heads * seq_q * seq_k, "weight buffer has unexpected length");

    let exports_dir = dir.join("exports");
    fs::create_dir_all(&exports_dir)
        .with_context(|| format!("Cannot create '{}'", exports_dir.display()))?;

    let mut written = Vec::with_capacity(batch * heads);
    for (idx, grid) in values.chunks(seq_q * seq_k).enumerate() {
        let (b, h) = (idx / heads, idx % heads);
        let path = exports_dir.join(format!("{name}_batch{b}_head{h}.csv"));

        fs::write(&path, render_grid(grid, seq_k))
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote attention map '{}'", path.display());
        written.push(path);
    }

    Ok(written)
}

fn render_grid(grid: &[f32], seq_k: usize) -> String {
    let mut csv = String::from("query\\key");
    for key in 0..seq_k {
        let _ = write!(csv, ",{key}");
    }
    csv.push('\n');

    for (query, row) in grid.chunks(seq_k).enumerate() {
        let _ = write!(csv, "{query}");
        for w in row {
            let _ = write!(csv, ",{w:.6}");
        }
        csv.push('\n');
    }
    csv
}
