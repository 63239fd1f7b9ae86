// ============================================================
// Layer 5 — Attention Masks
// ============================================================
// Builders for the integer masks MultiHeadAttention accepts.
// Convention: 1 = the query may attend to this key, 0 = it may not.
// All masks come out as [batch, 1, seq_q, seq_k] so they broadcast
// across heads.

use burn::prelude::*;

/// Lower-triangular mask: position q sees keys 0..=q.
pub fn causal_mask<B: Backend>(batch: usize, seq_len: usize, device: &B::Device) -> Tensor<B, 4, Int> {
    let mut values = Vec::with_capacity(seq_len * seq_len);
    for q in 0..seq_len {
        for k in 0..seq_len {
            values.push(if k <= q { 1i32 } else { 0 });
        }
    }

    Tensor::<B, 1, Int>::from_ints(values.as_slice(), device)
        .reshape([1, 1, seq_len, seq_len])
        .expand([batch, 1, seq_len, seq_len])
}

/// Hides padded key positions from every query.
///
/// tokens: [batch, seq_k] → [batch, 1, seq_q, seq_k]
pub fn padding_mask<B: Backend>(tokens: Tensor<B, 2, Int>, pad_id: i64, seq_q: usize) -> Tensor<B, 4, Int> {
    let [batch, seq_k] = tokens.dims();
    tokens
        .equal_elem(pad_id)
        .bool_not()
        .int()
        .reshape([batch, 1, 1, seq_k])
        .expand([batch, 1, seq_q, seq_k])
}

/// Keep a position only where both masks keep it.
pub fn combine_masks<B: Backend>(a: Tensor<B, 4, Int>, b: Tensor<B, 4, Int>) -> Tensor<B, 4, Int> {
    a * b
}
