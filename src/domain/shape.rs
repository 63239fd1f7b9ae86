// ============================================================
// Layer 3 — Shape Checks
// ============================================================
// Burn panics on incompatible shapes deep inside a backend kernel.
// These helpers run first and turn the same situations into
// BlockError values the caller can propagate with `?`.
//
// Layout conventions used throughout the crate:
//   model space : [batch, seq_len, d_model]
//   head space  : [batch, num_heads, seq_len, d_k]
//   scores      : [batch, num_heads, seq_q, seq_k]
//   mask        : [batch, 1, seq_q, seq_k]   (any broadcastable shape)

use crate::domain::error::{BlockError, BlockResult};

/// Per-head width. Fails unless d_model splits evenly into num_heads.
pub fn head_dim(d_model: usize, num_heads: usize) -> BlockResult<usize> {
    if d_model == 0 || num_heads == 0 {
        return Err(BlockError::InvalidConfig(format!(
            "d_model ({d_model}) and num_heads ({num_heads}) must be positive"
        )));
    }
    if d_model % num_heads != 0 {
        return Err(BlockError::IndivisibleHeads { d_model, num_heads });
    }
    Ok(d_model / num_heads)
}

pub fn check_sequence(seq_len: usize, max_seq_len: usize) -> BlockResult<()> {
    if seq_len > max_seq_len {
        return Err(BlockError::SequenceTooLong { seq_len, max_seq_len });
    }
    Ok(())
}

/// Validates head-space query/key/value and returns the scores shape.
///
/// The value width may differ from d_k; the output keeps it.
pub fn check_head_inputs(
    query: [usize; 4],
    key:   [usize; 4],
    value: [usize; 4],
    d_k:   usize,
) -> BlockResult<[usize; 4]> {
    let [batch, heads, seq_q, width_q] = query;

    if key[..2] != query[..2] {
        return Err(BlockError::shape("key leading axes", &query[..2], &key[..2]));
    }
    if value[..2] != query[..2] {
        return Err(BlockError::shape("value leading axes", &query[..2], &value[..2]));
    }
    if width_q != d_k {
        return Err(BlockError::shape("query width", &[d_k], &[width_q]));
    }
    if key[3] != d_k {
        return Err(BlockError::shape("key width", &[d_k], &[key[3]]));
    }
    if value[2] != key[2] {
        return Err(BlockError::shape("value sequence length", &[key[2]], &[value[2]]));
    }

    Ok([batch, heads, seq_q, key[2]])
}

/// Every mask axis must equal the scores axis or be 1.
pub fn check_mask(mask: [usize; 4], scores: [usize; 4]) -> BlockResult<()> {
    let broadcastable = mask
        .iter()
        .zip(scores.iter())
        .all(|(&m, &s)| m == s || m == 1);

    if broadcastable {
        Ok(())
    } else {
        Err(BlockError::MaskNotBroadcastable { mask: mask.to_vec(), scores: scores.to_vec() })
    }
}

/// Validates model-space inputs to the projected forward pass.
pub fn check_model_inputs(
    query:   [usize; 3],
    key:     [usize; 3],
    value:   [usize; 3],
    d_model: usize,
) -> BlockResult<()> {
    for (what, dims) in [("query", query), ("key", key), ("value", value)] {
        if dims[2] != d_model {
            return Err(BlockError::shape(what, &[dims[0], dims[1], d_model], &dims));
        }
    }
    if key[0] != query[0] {
        return Err(BlockError::shape("key batch", &[query[0]], &[key[0]]));
    }
    if value[0] != query[0] {
        return Err(BlockError::shape("value batch", &[query[0]], &[value[0]]));
    }
    if value[1] != key[1] {
        return Err(BlockError::shape("value sequence length", &[key[1]], &[value[1]]));
    }
    Ok(())
}
