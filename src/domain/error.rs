// ============================================================
// Layer 3 — Block Errors
// ============================================================
// Every failure in this crate is a programming or configuration
// error, never a transient condition, so nothing here is retried.
//
//   IndivisibleHeads / InvalidConfig → raised while constructing
//   SequenceTooLong / ShapeMismatch /
//   MaskNotBroadcastable              → raised while calling forward
//   TokenOutOfRange                   → raised by TokenBatch, never by
//                                       the embedding itself
//
// The embedding lookup does not bounds-check; callers that accept
// ids from outside go through TokenBatch first.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockError {
    /// d_model must split evenly into num_heads heads of width d_k
    #[error("d_model ({d_model}) must be divisible by num_heads ({num_heads})")]
    IndivisibleHeads { d_model: usize, num_heads: usize },

    /// Any other rejected hyperparameter (zero widths, dropout outside [0, 1))
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The positional table only covers max_seq_len positions
    #[error("sequence length {seq_len} exceeds max_seq_len {max_seq_len}")]
    SequenceTooLong { seq_len: usize, max_seq_len: usize },

    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what:     &'static str,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    #[error("mask shape {mask:?} cannot broadcast to scores shape {scores:?}")]
    MaskNotBroadcastable { mask: Vec<usize>, scores: Vec<usize> },

    /// Raised by callers that validate ids before the embedding lookup
    #[error("token id {id} is outside the vocabulary [0, {vocab_size})")]
    TokenOutOfRange { id: i64, vocab_size: usize },

    #[error("malformed token list: {0}")]
    MalformedTokens(String),
}

impl BlockError {
    pub(crate) fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        BlockError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual:   actual.to_vec(),
        }
    }
}

pub type BlockResult<T> = std::result::Result<T, BlockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_dimensions() {
        let e = BlockError::IndivisibleHeads { d_model: 10, num_heads: 3 };
        assert_eq!(e.to_string(), "d_model (10) must be divisible by num_heads (3)");

        let e = BlockError::SequenceTooLong { seq_len: 9, max_seq_len: 8 };
        assert!(e.to_string().contains("exceeds max_seq_len 8"));
    }

    #[test]
    fn test_shape_helper_copies_dims() {
        let e = BlockError::shape("key", &[1, 2, 3], &[1, 2, 4]);
        assert_eq!(
            e,
            BlockError::ShapeMismatch { what: "key", expected: vec![1, 2, 3], actual: vec![1, 2, 4] }
        );
    }
}
