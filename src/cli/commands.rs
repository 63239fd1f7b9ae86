// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands, all diagnostic:
//
//   init      — build a fresh stem from a config and checkpoint it
//   forward   — restore a checkpoint and run token ids through it
//   encoding  — print rows of the sinusoidal positional table
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use transformer_blocks::application::forward_use_case::{ForwardRequest, TokenSource};
use transformer_blocks::infra::config_source::load_config_document;
use transformer_blocks::ml::config::TransformerConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a model from a config and write a checkpoint
    Init(InitArgs),

    /// Run token ids through a checkpoint and report the attention
    Forward(ForwardArgs),

    /// Print rows of the positional encoding table
    Encoding(EncodingArgs),
}

/// Tensor backend to run on
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU, always available
    Ndarray,
    /// GPU through wgpu
    Wgpu,
}

/// Hyperparameters, either from a JSON document or from flags.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// JSON document with d_model, num_heads, dropout
    /// (and optionally vocab_size, max_sequence_length).
    /// When given, the flags below are ignored.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Width of embeddings and attention (must divide by num_heads)
    #[arg(long, default_value_t = 512)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Dropout probability, active only with --training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    /// Rows in the positional table; longer inputs are rejected
    #[arg(long, default_value_t = 512)]
    pub max_seq_len: usize,
}

impl ModelArgs {
    pub fn resolve(&self) -> Result<TransformerConfig> {
        match &self.config {
            Some(path) => load_config_document(path),
            None => Ok(self.clone().into()),
        }
    }
}

/// Flags map one-to-one onto the config record.
impl From<ModelArgs> for TransformerConfig {
    fn from(a: ModelArgs) -> Self {
        TransformerConfig::new(a.d_model, a.num_heads)
            .with_dropout(a.dropout)
            .with_vocab_size(a.vocab_size)
            .with_max_seq_len(a.max_seq_len)
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Directory for config.json and the weights record
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,
}

#[derive(Args, Debug)]
pub struct ForwardArgs {
    /// Directory written by `init`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Token ids, rows separated by ';' (e.g. "1,2,3;4,5,6")
    #[arg(long, conflicts_with = "random")]
    pub tokens: Option<String>,

    /// Generate random ids of this sequence length instead
    #[arg(long)]
    pub random: Option<usize>,

    /// Number of random sequences
    #[arg(long, default_value_t = 1)]
    pub batch: usize,

    /// Hide future positions from each query
    #[arg(long)]
    pub causal: bool,

    /// Hide keys holding this id
    #[arg(long)]
    pub pad_id: Option<i64>,

    /// Write attention weights as CSV under <DIR>/exports
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Run on an autodiff backend so dropout is active
    #[arg(long)]
    pub training: bool,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,
}

impl ForwardArgs {
    pub fn request(&self) -> Result<ForwardRequest> {
        let tokens = match (&self.tokens, self.random) {
            (Some(text), _)       => TokenSource::Text(text.clone()),
            (None, Some(seq_len)) => TokenSource::Random { batch: self.batch, seq_len },
            (None, None)          => anyhow::bail!("pass either --tokens or --random <SEQ_LEN>"),
        };

        Ok(ForwardRequest {
            tokens,
            causal:     self.causal,
            pad_id:     self.pad_id,
            export_dir: self.export_dir.clone(),
        })
    }
}

#[derive(Args, Debug)]
pub struct EncodingArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// First position to print
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// One past the last position to print
    #[arg(long, default_value_t = 4)]
    pub to: usize,
}
