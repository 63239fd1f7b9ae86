// ============================================================
// Layer 5 — Input Embeddings
// ============================================================
// Turns integer token ids into the vectors the attention stage
// consumes:
//
//   tokens [batch, seq_len]
//       │  TokenEmbedding     lookup × √d_model
//       ▼
//   [batch, seq_len, d_model]
//       │  PositionalEncoding + sinusoidal table, then dropout
//       ▼
//   [batch, seq_len, d_model]
//
// Self-attention is permutation-invariant, so position has to be
// injected explicitly. The sinusoidal table is fixed (not learned):
//
//   PE(p, 2i)   = sin(p / 10000^(2i / d_model))
//   PE(p, 2i+1) = cos(p / 10000^(2i / d_model))
//
// The table is a plain tensor field, which Burn records as a
// constant: it has no Param wrapper, gets no gradient, and is not
// written into checkpoints. Restoring a model rebuilds it from the
// config.
//
// Reference: Vaswani et al. (2017) §3.4 (scaling), §3.5 (positions)

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::domain::error::{BlockError, BlockResult};
use crate::domain::shape::check_sequence;

// ─── TokenEmbedding ───────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct TokenEmbedding<B: Backend> {
    embedding: Embedding<B>,
    d_model:   usize,
}

impl<B: Backend> TokenEmbedding<B> {
    pub fn new(vocab_size: usize, d_model: usize, device: &B::Device) -> Self {
        let embedding = EmbeddingConfig::new(vocab_size, d_model).init(device);
        Self { embedding, d_model }
    }

    /// tokens: [batch, seq_len] → [batch, seq_len, d_model]
    ///
    /// Ids must lie in [0, vocab_size); they are not bounds-checked.
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding.forward(tokens) * (self.d_model as f64).sqrt()
    }

    /// The learned lookup table, [vocab_size, d_model]
    pub fn weights(&self) -> Tensor<B, 2> {
        self.embedding.weight.val()
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }
}

// ─── PositionalEncoding ───────────────────────────────────────────────────────

/// Row-major [max_seq_len, d_model] sinusoidal values.
///
/// The frequency term uses exp(2i · -ln(10000) / d_model) instead of
/// a direct power. An odd d_model ends on a sine column.
pub fn sinusoidal_table(max_seq_len: usize, d_model: usize) -> Vec<f32> {
    let log_base = -(10000.0_f64).ln() / d_model as f64;
    let mut values = Vec::with_capacity(max_seq_len * d_model);

    for pos in 0..max_seq_len {
        for col in 0..d_model {
            let pair  = (col / 2) * 2;
            let angle = pos as f64 * (pair as f64 * log_base).exp();
            let value = if col % 2 == 0 { angle.sin() } else { angle.cos() };
            values.push(value as f32);
        }
    }

    values
}

#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    /// [1, max_seq_len, d_model], computed once and never mutated
    table:       Tensor<B, 3>,
    dropout:     Dropout,
    d_model:     usize,
    max_seq_len: usize,
}

impl<B: Backend> PositionalEncoding<B> {
    pub fn new(d_model: usize, max_seq_len: usize, dropout: f64, device: &B::Device) -> Self {
        let values = sinusoidal_table(max_seq_len, d_model);
        let table  = Tensor::<B, 1>::from_floats(values.as_slice(), device)
            .reshape([1, max_seq_len, d_model]);

        Self {
            table,
            dropout: DropoutConfig::new(dropout).init(),
            d_model,
            max_seq_len,
        }
    }

    /// x: [batch, seq_len, d_model] → dropout(x + table[:, :seq_len])
    pub fn forward(&self, x: Tensor<B, 3>) -> BlockResult<Tensor<B, 3>> {
        let [batch, seq_len, width] = x.dims();
        if width != self.d_model {
            return Err(BlockError::shape(
                "positional encoding input",
                &[batch, seq_len, self.d_model],
                &[batch, seq_len, width],
            ));
        }
        check_sequence(seq_len, self.max_seq_len)?;

        // [1, seq_len, d_model] broadcasts across the batch axis
        let positions = self.table.clone().slice([0..1, 0..seq_len, 0..self.d_model]);

        Ok(self.dropout.forward(x + positions))
    }

    pub fn table(&self) -> Tensor<B, 3> {
        self.table.clone()
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }
}

// ─── InputEmbedding ───────────────────────────────────────────────────────────

/// Token lookup followed by positional encoding.
#[derive(Module, Debug)]
pub struct InputEmbedding<B: Backend> {
    pub token:      TokenEmbedding<B>,
    pub positional: PositionalEncoding<B>,
}

impl<B: Backend> InputEmbedding<B> {
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> BlockResult<Tensor<B, 3>> {
        let [_, seq_len] = tokens.dims();
        check_sequence(seq_len, self.positional.max_seq_len())?;

        self.positional.forward(self.token.forward(tokens))
    }
}
