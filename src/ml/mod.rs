// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// The domain layer only sees dimension arrays; everything that
// touches a tensor lives here.
//
// What's in this layer:
//
//   config.rs     — TransformerConfig, the explicit hyperparameter
//                   record every block is built from
//
//   embedding.rs  — TokenEmbedding (lookup × √d_model),
//                   PositionalEncoding (fixed sinusoidal table),
//                   InputEmbedding (both, in order)
//
//   attention.rs  — MultiHeadAttention: projections, head
//                   split/merge and the scaled dot-product core
//
//   mask.rs       — causal and padding mask builders
//
//   stem.rs       — AttentionStem, embeddings followed by one
//                   self-attention stage
//
// Train vs. inference is chosen by the backend: dropout is active
// on an AutodiffBackend and the identity everywhere else (including
// on modules returned by `.valid()`).
//
// Reference: Burn Book §3 (Building Blocks)
//            Vaswani et al. (2017) Attention Is All You Need

/// Hyperparameter record and block constructors
pub mod config;

/// Token embeddings and sinusoidal positional encoding
pub mod embedding;

/// Multi-head scaled dot-product attention
pub mod attention;

/// Causal / padding masks
pub mod mask;

/// Embedding + attention composed into one checkpointable module
pub mod stem;
