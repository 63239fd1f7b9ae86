// ============================================================
// Layer 6 — Config Document
// ============================================================
// Reads the external key-value document that supplies model
// hyperparameters, e.g.
//
//   {
//     "d_model": 512,
//     "num_heads": 8,
//     "dropout": 0.1,
//     "vocab_size": 30522,
//     "max_sequence_length": 512
//   }
//
// vocab_size and max_sequence_length are optional and fall back to
// the TransformerConfig defaults. Only the head divisibility rule is
// checked here; the remaining invariants are enforced when a block
// is constructed.
//
// The document is read once, explicitly, by whoever builds the
// model. Nothing is loaded at import time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::domain::error::BlockResult;
use crate::domain::shape::head_dim;
use crate::ml::config::TransformerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub d_model:   usize,
    pub num_heads: usize,
    pub dropout:   f64,

    #[serde(default)]
    pub vocab_size: Option<usize>,

    #[serde(default, alias = "max_seq_len")]
    pub max_sequence_length: Option<usize>,
}

impl ConfigDocument {
    pub fn into_config(self) -> BlockResult<TransformerConfig> {
        head_dim(self.d_model, self.num_heads)?;

        let mut cfg = TransformerConfig::new(self.d_model, self.num_heads).with_dropout(self.dropout);
        if let Some(vocab_size) = self.vocab_size {
            cfg = cfg.with_vocab_size(vocab_size);
        }
        if let Some(max_seq_len) = self.max_sequence_length {
            cfg = cfg.with_max_seq_len(max_seq_len);
        }
        Ok(cfg)
    }
}

pub fn parse_config_document(json: &str) -> Result<TransformerConfig> {
    let doc: ConfigDocument = serde_json::from_str(json).context("Malformed config document")?;
    Ok(doc.into_config()?)
}

pub fn load_config_document(path: impl AsRef<Path>) -> Result<TransformerConfig> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read config document '{}'", path.display()))?;

    let cfg = parse_config_document(&json)
        .with_context(|| format!("Invalid config document '{}'", path.display()))?;
    tracing::info!(
        "Loaded config: d_model={}, num_heads={}, dropout={}",
        cfg.d_model, cfg.num_heads, cfg.dropout
    );
    Ok(cfg)
}
