// ============================================================
// Layer 5 — Transformer Configuration
// ============================================================
// One explicit record of hyperparameters, built by the caller at
// application start and handed to every constructor. Nothing in
// the crate reads configuration implicitly.
//
// Construction is where invariants are enforced:
//   d_model % num_heads == 0      → d_k = d_model / num_heads
//   0 <= dropout < 1
//   vocab_size, max_seq_len > 0
// A config that passes validate() can build every block.

use burn::prelude::*;

use crate::domain::error::{BlockError, BlockResult};
use crate::domain::shape::head_dim;
use crate::ml::attention::MultiHeadAttention;
use crate::ml::embedding::{InputEmbedding, PositionalEncoding, TokenEmbedding};
use crate::ml::stem::AttentionStem;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TransformerConfig {
    /// Width of token embeddings and of the attention input/output
    pub d_model:     usize,
    /// Number of parallel attention heads
    pub num_heads:   usize,
    /// Dropout probability for attention weights and the embedding sum
    #[config(default = 0.1)]
    pub dropout:     f64,
    #[config(default = 30522)]
    pub vocab_size:  usize,
    /// Number of rows in the precomputed positional table
    #[config(default = 512)]
    pub max_seq_len: usize,
}

impl TransformerConfig {
    /// Check every construction invariant and return d_k.
    pub fn validate(&self) -> BlockResult<usize> {
        let d_k = head_dim(self.d_model, self.num_heads)?;
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(BlockError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.vocab_size == 0 {
            return Err(BlockError::InvalidConfig("vocab_size must be positive".into()));
        }
        if self.max_seq_len == 0 {
            return Err(BlockError::InvalidConfig("max_seq_len must be positive".into()));
        }
        Ok(d_k)
    }

    pub fn d_k(&self) -> BlockResult<usize> {
        head_dim(self.d_model, self.num_heads)
    }

    pub fn init_attention<B: Backend>(&self, device: &B::Device) -> BlockResult<MultiHeadAttention<B>> {
        let d_k = self.validate()?;
        tracing::debug!(
            "Building attention: d_model={}, heads={}, d_k={}",
            self.d_model, self.num_heads, d_k
        );
        Ok(MultiHeadAttention::new(self.d_model, self.num_heads, self.dropout, device))
    }

    pub fn init_token_embedding<B: Backend>(&self, device: &B::Device) -> BlockResult<TokenEmbedding<B>> {
        self.validate()?;
        Ok(TokenEmbedding::new(self.vocab_size, self.d_model, device))
    }

    pub fn init_positional_encoding<B: Backend>(
        &self,
        device: &B::Device,
    ) -> BlockResult<PositionalEncoding<B>> {
        self.validate()?;
        Ok(PositionalEncoding::new(self.d_model, self.max_seq_len, self.dropout, device))
    }

    pub fn init_input_embedding<B: Backend>(&self, device: &B::Device) -> BlockResult<InputEmbedding<B>> {
        Ok(InputEmbedding {
            token:      self.init_token_embedding(device)?,
            positional: self.init_positional_encoding(device)?,
        })
    }

    /// Embedding stage followed by one self-attention stage.
    pub fn init<B: Backend>(&self, device: &B::Device) -> BlockResult<AttentionStem<B>> {
        let stem = AttentionStem {
            input:     self.init_input_embedding(device)?,
            attention: self.init_attention(device)?,
        };
        tracing::debug!(
            "Built attention stem: vocab_size={}, max_seq_len={}",
            self.vocab_size, self.max_seq_len
        );
        Ok(stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_defaults_from_new() {
        let cfg = TransformerConfig::new(512, 8);
        assert_eq!(cfg.dropout, 0.1);
        assert_eq!(cfg.vocab_size, 30522);
        assert_eq!(cfg.max_seq_len, 512);
        assert_eq!(cfg.validate(), Ok(64));
    }

    #[test]
    fn test_d_model_equals_heads_times_d_k() {
        for (d_model, heads) in [(8, 2), (12, 3), (64, 4), (96, 96)] {
            let cfg = TransformerConfig::new(d_model, heads);
            assert_eq!(cfg.num_heads * cfg.d_k().unwrap(), cfg.d_model);
        }
    }

    #[test]
    fn test_indivisible_config_fails_at_construction() {
        let device = Default::default();
        let cfg = TransformerConfig::new(10, 4);
        let err = cfg.init_attention::<TestBackend>(&device).unwrap_err();
        assert_eq!(err, BlockError::IndivisibleHeads { d_model: 10, num_heads: 4 });
        assert!(cfg.init::<TestBackend>(&device).is_err());
    }

    #[test]
    fn test_rejects_bad_dropout_and_sizes() {
        assert!(TransformerConfig::new(8, 2).with_dropout(1.0).validate().is_err());
        assert!(TransformerConfig::new(8, 2).with_dropout(-0.1).validate().is_err());
        assert!(TransformerConfig::new(8, 2).with_vocab_size(0).validate().is_err());
        assert!(TransformerConfig::new(8, 2).with_max_seq_len(0).validate().is_err());
        assert!(TransformerConfig::new(8, 2).with_dropout(0.0).validate().is_ok());
    }
}
