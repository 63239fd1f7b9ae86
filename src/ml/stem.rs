// ============================================================
// Layer 5 — Attention Stem
// ============================================================
// The complete data flow of this crate packaged as one module:
//
//   token ids ──► InputEmbedding ──► MultiHeadAttention (self) ──► output
//
// This is the unit that gets checkpointed. Its record holds the
// embedding table and the four projections; the positional table
// is a constant and is rebuilt from the config on load.

use burn::prelude::*;

use crate::domain::error::BlockResult;
use crate::ml::attention::{AttentionInput, AttentionOutput, MultiHeadAttention};
use crate::ml::embedding::InputEmbedding;

#[derive(Module, Debug)]
pub struct AttentionStem<B: Backend> {
    pub input:     InputEmbedding<B>,
    pub attention: MultiHeadAttention<B>,
}

impl<B: Backend> AttentionStem<B> {
    /// tokens: [batch, seq_len] → context [batch, seq_len, d_model]
    pub fn forward(
        &self,
        tokens: Tensor<B, 2, Int>,
        mask:   Option<Tensor<B, 4, Int>>,
    ) -> BlockResult<AttentionOutput<B>> {
        let embedded = self.input.forward(tokens)?;

        let mut input = AttentionInput::self_attn(embedded);
        if let Some(mask) = mask {
            input = input.with_mask(mask);
        }
        self.attention.forward(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::BlockError;
    use crate::ml::config::TransformerConfig;
    use crate::ml::mask::causal_mask;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tokens(ids: &[i32], batch: usize, device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(ids, device).reshape([batch, ids.len() / batch])
    }

    #[test]
    fn test_forward_output_matches_input_shape() {
        let device = Default::default();
        let cfg = TransformerConfig::new(16, 4).with_vocab_size(50).with_max_seq_len(10);
        let stem = cfg.init::<TestBackend>(&device).unwrap();

        let out = stem.forward(tokens(&[1, 2, 3, 4, 5, 6, 7, 8], 2, &device), None).unwrap();
        assert_eq!(out.context.dims(), [2, 4, 16]);
        assert_eq!(out.weights.dims(), [2, 4, 4, 4]);
    }

    #[test]
    fn test_causal_stem_never_looks_ahead() {
        let device = Default::default();
        let cfg = TransformerConfig::new(8, 2).with_vocab_size(20).with_max_seq_len(8);
        let stem = cfg.init::<TestBackend>(&device).unwrap();

        let mask = causal_mask(1, 4, &device);
        let out = stem.forward(tokens(&[3, 1, 4, 1], 1, &device), Some(mask)).unwrap();

        let weights = out.weights.into_data().to_vec::<f32>().unwrap();
        for (row_idx, row) in weights.chunks(4).enumerate() {
            let query = row_idx % 4;
            for (key, w) in row.iter().enumerate() {
                if key > query {
                    assert!(*w < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_overlong_tokens_fail() {
        let device = Default::default();
        let cfg = TransformerConfig::new(8, 2).with_vocab_size(20).with_max_seq_len(3);
        let stem = cfg.init::<TestBackend>(&device).unwrap();

        let err = stem.forward(tokens(&[1, 2, 3, 4], 1, &device), None).unwrap_err();
        assert_eq!(err, BlockError::SequenceTooLong { seq_len: 4, max_seq_len: 3 });
    }
}
