// ============================================================
// Layer 5 — Multi-Head Attention
// ============================================================
// Scaled dot-product attention run in num_heads parallel
// subspaces of width d_k = d_model / num_heads.
//
// Full forward pass:
//
//   query [b, s_q, d_model]   key/value [b, s_k, d_model]
//       │ q_proj / k_proj / v_proj
//       ▼
//   split_heads   [b, s, d_model] → [b, h, s, d_k]
//       │
//       ▼
//   self_attention
//       scores  = Q·Kᵀ / √d_k                    [b, h, s_q, s_k]
//       scores  = -1e9 where mask == 0
//       weights = softmax(scores, key axis)
//       weights = dropout(weights)
//       context = weights·V                      [b, h, s_q, d_k]
//       │
//       ▼
//   merge_heads   [b, h, s_q, d_k] → [b, s_q, d_model]
//       │ out_proj
//       ▼
//   context [b, s_q, d_model]  +  weights [b, h, s_q, s_k]
//
// Head j owns feature columns j*d_k .. (j+1)*d_k of each
// projection, so merge_heads is the exact inverse of split_heads.
//
// Reference: Vaswani et al. (2017) §3.2.1, §3.2.2

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::domain::error::{BlockError, BlockResult};
use crate::domain::shape::{check_head_inputs, check_mask, check_model_inputs};

/// Score written into masked positions; softmax turns it into ~0.
const MASK_FILL: f64 = -1.0e9;

// ─── Inputs / Outputs ─────────────────────────────────────────────────────────

/// Model-space inputs. Mask is [batch, 1, seq_q, seq_k], nonzero = keep.
#[derive(Debug, Clone)]
pub struct AttentionInput<B: Backend> {
    pub query: Tensor<B, 3>,
    pub key:   Tensor<B, 3>,
    pub value: Tensor<B, 3>,
    pub mask:  Option<Tensor<B, 4, Int>>,
}

impl<B: Backend> AttentionInput<B> {
    /// Query, key and value are the same tensor.
    pub fn self_attn(x: Tensor<B, 3>) -> Self {
        Self { query: x.clone(), key: x.clone(), value: x, mask: None }
    }

    /// Queries from one sequence attend over another (e.g. encoder output).
    pub fn cross_attn(query: Tensor<B, 3>, memory: Tensor<B, 3>) -> Self {
        Self { query, key: memory.clone(), value: memory, mask: None }
    }

    pub fn with_mask(mut self, mask: Tensor<B, 4, Int>) -> Self {
        self.mask = Some(mask);
        self
    }
}

#[derive(Debug, Clone)]
pub struct AttentionOutput<B: Backend> {
    /// [batch, seq_q, d_model]
    pub context: Tensor<B, 3>,
    /// [batch, num_heads, seq_q, seq_k], after dropout
    pub weights: Tensor<B, 4>,
}

// ─── MultiHeadAttention ───────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    pub q_proj:   Linear<B>,
    pub k_proj:   Linear<B>,
    pub v_proj:   Linear<B>,
    pub out_proj: Linear<B>,
    dropout:      Dropout,
    d_model:      usize,
    num_heads:    usize,
    d_k:          usize,
}

impl<B: Backend> MultiHeadAttention<B> {
    /// Callers go through TransformerConfig::init_attention, which has
    /// already checked that d_model divides by num_heads.
    pub(crate) fn new(d_model: usize, num_heads: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            q_proj:   LinearConfig::new(d_model, d_model).init(device),
            k_proj:   LinearConfig::new(d_model, d_model).init(device),
            v_proj:   LinearConfig::new(d_model, d_model).init(device),
            out_proj: LinearConfig::new(d_model, d_model).init(device),
            dropout:  DropoutConfig::new(dropout).init(),
            d_model,
            num_heads,
            d_k: d_model / num_heads,
        }
    }

    pub fn d_model(&self) -> usize { self.d_model }

    pub fn num_heads(&self) -> usize { self.num_heads }

    pub fn d_k(&self) -> usize { self.d_k }

    /// Scaled dot-product attention over head-space tensors.
    ///
    /// query: [batch, heads, seq_q, d_k]
    /// key:   [batch, heads, seq_k, d_k]
    /// value: [batch, heads, seq_k, d_v]
    /// mask:  [batch, 1, seq_q, seq_k], nonzero = keep
    ///
    /// Returns (context [batch, heads, seq_q, d_v], weights [batch, heads, seq_q, seq_k]).
    /// A query whose keys are all masked ends up with uniform weights.
    pub fn self_attention(
        &self,
        query: Tensor<B, 4>,
        key:   Tensor<B, 4>,
        value: Tensor<B, 4>,
        mask:  Option<Tensor<B, 4, Int>>,
    ) -> BlockResult<(Tensor<B, 4>, Tensor<B, 4>)> {
        let scores_shape = check_head_inputs(query.dims(), key.dims(), value.dims(), self.d_k)?;
        if let Some(mask) = &mask {
            check_mask(mask.dims(), scores_shape)?;
        }

        let scores = query.matmul(key.swap_dims(2, 3)) / (self.d_k as f64).sqrt();

        let scores = match mask {
            Some(mask) => {
                let dropped = mask.expand(scores_shape).equal_elem(0);
                scores.mask_fill(dropped, MASK_FILL)
            }
            None => scores,
        };

        let weights = softmax(scores, 3);
        let weights = self.dropout.forward(weights);
        let context = weights.clone().matmul(value);

        Ok((context, weights))
    }

    /// [batch, seq, d_model] → [batch, num_heads, seq, d_k]
    pub fn split_heads(&self, x: Tensor<B, 3>) -> BlockResult<Tensor<B, 4>> {
        let [batch, seq_len, width] = x.dims();
        if width != self.d_model {
            return Err(BlockError::shape(
                "split_heads input",
                &[batch, seq_len, self.d_model],
                &[batch, seq_len, width],
            ));
        }
        Ok(x.reshape([batch, seq_len, self.num_heads, self.d_k]).swap_dims(1, 2))
    }

    /// [batch, num_heads, seq, d_k] → [batch, seq, d_model]
    pub fn merge_heads(&self, x: Tensor<B, 4>) -> BlockResult<Tensor<B, 3>> {
        let [batch, heads, seq_len, width] = x.dims();
        if heads != self.num_heads || width != self.d_k {
            return Err(BlockError::shape(
                "merge_heads input",
                &[batch, self.num_heads, seq_len, self.d_k],
                &[batch, heads, seq_len, width],
            ));
        }
        Ok(x.swap_dims(1, 2).reshape([batch, seq_len, self.d_model]))
    }

    pub fn forward(&self, input: AttentionInput<B>) -> BlockResult<AttentionOutput<B>> {
        let AttentionInput { query, key, value, mask } = input;
        check_model_inputs(query.dims(), key.dims(), value.dims(), self.d_model)?;

        let q = self.split_heads(self.q_proj.forward(query))?;
        let k = self.split_heads(self.k_proj.forward(key))?;
        let v = self.split_heads(self.v_proj.forward(value))?;

        let (context, weights) = self.self_attention(q, k, v, mask)?;
        let context = self.out_proj.forward(self.merge_heads(context)?);

        Ok(AttentionOutput { context, weights })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::config::TransformerConfig;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Distribution;

    type TestBackend  = NdArray;
    type TrainBackend = Autodiff<NdArray>;

    fn attention<Bk: Backend>(d_model: usize, heads: usize, dropout: f64) -> MultiHeadAttention<Bk> {
        TransformerConfig::new(d_model, heads)
            .with_dropout(dropout)
            .init_attention::<Bk>(&Default::default())
            .unwrap()
    }

    fn to_vec<const D: usize, Bk: Backend>(t: Tensor<Bk, D>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    fn assert_rows_sum_to_one(weights: Tensor<TestBackend, 4>) {
        let seq_k = weights.dims()[3];
        let values = to_vec(weights);
        for row in values.chunks(seq_k) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "row sums to {sum}");
        }
    }

    #[test]
    fn test_all_ones_gives_uniform_weights() {
        // d_model = 8, heads = 2 → d_k = 4; batch 1, seq 3
        let mha = attention::<TestBackend>(8, 2, 0.1);
        let device = Default::default();
        let ones = Tensor::<TestBackend, 4>::ones([1, 2, 3, 4], &device);

        let (context, weights) = mha
            .self_attention(ones.clone(), ones.clone(), ones, None)
            .unwrap();

        assert_eq!(weights.dims(), [1, 2, 3, 3]);
        for w in to_vec(weights) {
            assert!((w - 1.0 / 3.0).abs() < 1e-6);
        }
        assert_eq!(context.dims(), [1, 2, 3, 4]);
        for c in to_vec(context) {
            assert!((c - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_weights_sum_to_one_for_random_inputs() {
        let mha = attention::<TestBackend>(16, 4, 0.0);
        let device = Default::default();
        let q = Tensor::<TestBackend, 4>::random([2, 4, 5, 4], Distribution::Normal(0.0, 1.0), &device);
        let k = Tensor::<TestBackend, 4>::random([2, 4, 7, 4], Distribution::Normal(0.0, 1.0), &device);
        let v = Tensor::<TestBackend, 4>::random([2, 4, 7, 4], Distribution::Normal(0.0, 1.0), &device);

        let (_, weights) = mha.self_attention(q, k, v, None).unwrap();
        assert_rows_sum_to_one(weights);
    }

    #[test]
    fn test_masked_key_gets_no_weight() {
        let mha = attention::<TestBackend>(8, 2, 0.0);
        let device = Default::default();
        let q = Tensor::<TestBackend, 4>::random([1, 2, 3, 4], Distribution::Normal(0.0, 1.0), &device);
        let k = Tensor::<TestBackend, 4>::random([1, 2, 3, 4], Distribution::Normal(0.0, 1.0), &device);
        let v = Tensor::<TestBackend, 4>::random([1, 2, 3, 4], Distribution::Normal(0.0, 1.0), &device);
        // key position 1 is dropped for every query
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([1, 0, 1, 1, 0, 1, 1, 0, 1], &device)
            .reshape([1, 1, 3, 3]);

        let (_, weights) = mha.self_attention(q, k, v, Some(mask)).unwrap();
        let values = to_vec(weights.clone());
        for row in values.chunks(3) {
            assert!(row[1] < 1e-6, "masked weight {}", row[1]);
        }
        assert_rows_sum_to_one(weights);
    }

    #[test]
    fn test_output_takes_seq_from_query_and_width_from_value() {
        let mha = attention::<TestBackend>(8, 2, 0.0);
        let device = Default::default();
        let q = Tensor::<TestBackend, 4>::ones([2, 2, 3, 4], &device);
        let k = Tensor::<TestBackend, 4>::ones([2, 2, 5, 4], &device);
        let v = Tensor::<TestBackend, 4>::ones([2, 2, 5, 6], &device);

        let (context, weights) = mha.self_attention(q, k, v, None).unwrap();
        assert_eq!(context.dims(), [2, 2, 3, 6]);
        assert_eq!(weights.dims(), [2, 2, 3, 5]);
    }

    #[test]
    fn test_mismatched_batch_is_rejected() {
        let mha = attention::<TestBackend>(8, 2, 0.0);
        let device = Default::default();
        let q = Tensor::<TestBackend, 4>::ones([2, 2, 3, 4], &device);
        let k = Tensor::<TestBackend, 4>::ones([1, 2, 3, 4], &device);
        let v = Tensor::<TestBackend, 4>::ones([1, 2, 3, 4], &device);

        let err = mha.self_attention(q, k, v, None).unwrap_err();
        assert!(matches!(err, BlockError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_unbroadcastable_mask_is_rejected() {
        let mha = attention::<TestBackend>(8, 2, 0.0);
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([1, 2, 3, 4], &device);
        let mask = Tensor::<TestBackend, 4, Int>::ones([1, 1, 3, 2], &device);

        let err = mha.self_attention(x.clone(), x.clone(), x, Some(mask)).unwrap_err();
        assert_eq!(
            err,
            BlockError::MaskNotBroadcastable { mask: vec![1, 1, 3, 2], scores: vec![1, 2, 3, 3] }
        );
    }

    #[test]
    fn test_split_then_merge_is_identity() {
        let mha = attention::<TestBackend>(8, 2, 0.0);
        let device = Default::default();
        let x = Tensor::<TestBackend, 1, Int>::arange(0..48, &device)
            .float()
            .reshape([2, 3, 8]);

        let heads = mha.split_heads(x.clone()).unwrap();
        assert_eq!(heads.dims(), [2, 2, 3, 4]);
        assert_eq!(to_vec(mha.merge_heads(heads).unwrap()), to_vec(x));
    }

    #[test]
    fn test_split_preserves_head_order() {
        let mha = attention::<TestBackend>(8, 2, 0.0);
        let device = Default::default();
        let x = Tensor::<TestBackend, 1, Int>::arange(0..24, &device)
            .float()
            .reshape([1, 3, 8]);

        let heads = to_vec(mha.split_heads(x).unwrap());
        // heads[0, j, s, c] == x[0, s, j * 4 + c]
        for j in 0..2 {
            for s in 0..3 {
                for c in 0..4 {
                    let got = heads[j * 12 + s * 4 + c];
                    assert_eq!(got, (s * 8 + j * 4 + c) as f32);
                }
            }
        }
    }

    #[test]
    fn test_split_and_merge_check_widths() {
        let mha = attention::<TestBackend>(8, 2, 0.0);
        let device = Default::default();
        assert!(mha.split_heads(Tensor::zeros([1, 3, 6], &device)).is_err());
        assert!(mha.merge_heads(Tensor::zeros([1, 4, 3, 2], &device)).is_err());
    }

    #[test]
    fn test_forward_self_attention_keeps_shape() {
        let mha = attention::<TestBackend>(16, 4, 0.1);
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::random([2, 5, 16], Distribution::Default, &device);

        let out = mha.forward(AttentionInput::self_attn(x)).unwrap();
        assert_eq!(out.context.dims(), [2, 5, 16]);
        assert_eq!(out.weights.dims(), [2, 4, 5, 5]);
        assert_rows_sum_to_one(out.weights);
    }

    #[test]
    fn test_forward_cross_attention_uses_query_length() {
        let mha = attention::<TestBackend>(16, 4, 0.0);
        let device = Default::default();
        let query  = Tensor::<TestBackend, 3>::random([2, 3, 16], Distribution::Default, &device);
        let memory = Tensor::<TestBackend, 3>::random([2, 6, 16], Distribution::Default, &device);
        let mask   = Tensor::<TestBackend, 4, Int>::ones([2, 1, 3, 6], &device);

        let input = AttentionInput::cross_attn(query, memory).with_mask(mask);
        let out = mha.forward(input).unwrap();
        assert_eq!(out.context.dims(), [2, 3, 16]);
        assert_eq!(out.weights.dims(), [2, 4, 3, 6]);
    }

    #[test]
    fn test_forward_rejects_wrong_model_width() {
        let mha = attention::<TestBackend>(16, 4, 0.0);
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::zeros([1, 3, 12], &device);
        assert!(mha.forward(AttentionInput::self_attn(x)).is_err());
    }

    #[test]
    fn test_training_dropout_on_weights() {
        let mha = attention::<TrainBackend>(8, 2, 0.5);
        let device = Default::default();
        let ones = Tensor::<TrainBackend, 4>::ones([2, 2, 3, 4], &device);

        let (_, weights) = mha.self_attention(ones.clone(), ones.clone(), ones, None).unwrap();
        // uniform 1/3 weights are either dropped or scaled by 1 / (1 - 0.5)
        for w in to_vec(weights) {
            assert!(w.abs() < 1e-6 || (w - 2.0 / 3.0).abs() < 1e-5, "unexpected weight {w}");
        }
    }

    #[test]
    fn test_inference_dropout_is_identity() {
        let device = Default::default();
        let q = Tensor::<TestBackend, 4>::random([1, 2, 4, 4], Distribution::Normal(0.0, 1.0), &device);
        let k = Tensor::<TestBackend, 4>::random([1, 2, 4, 4], Distribution::Normal(0.0, 1.0), &device);
        let v = Tensor::<TestBackend, 4>::random([1, 2, 4, 4], Distribution::Normal(0.0, 1.0), &device);

        let with_dropout = attention::<TestBackend>(8, 2, 0.9);
        let without      = attention::<TestBackend>(8, 2, 0.0);
        let (_, a) = with_dropout.self_attention(q.clone(), k.clone(), v.clone(), None).unwrap();
        let (_, b) = without.self_attention(q, k, v, None).unwrap();
        assert_eq!(to_vec(a), to_vec(b));
    }
}
