//! Transformer input and attention blocks on Burn.
//!
//! - [`ml::embedding`]: token embedding scaled by √d_model, fixed
//!   sinusoidal positional encoding.
//! - [`ml::attention`]: multi-head scaled dot-product attention.
//! - [`ml::config::TransformerConfig`]: the explicit hyperparameter
//!   record every block is constructed from.
//!
//! ```no_run
//! use burn::backend::NdArray;
//! use burn::prelude::*;
//! use transformer_blocks::ml::config::TransformerConfig;
//!
//! let device = Default::default();
//! let stem = TransformerConfig::new(64, 4)
//!     .with_vocab_size(1000)
//!     .init::<NdArray>(&device)
//!     .unwrap();
//! let tokens = Tensor::<NdArray, 1, Int>::from_ints([5, 17, 42], &device).reshape([1, 3]);
//! let out = stem.forward(tokens, None).unwrap();
//! assert_eq!(out.context.dims(), [1, 3, 64]);
//! ```
#![recursion_limit = "256"]

pub mod application;
pub mod domain;
pub mod infra;
pub mod ml;
