// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one goal at a time.
//
// Rules for this layer:
//   - No tensor math here (that's Layer 5)
//   - No printing (that's Layer 1)
//   - Only workflow coordination
//
// Every use case is generic over the Burn backend. The caller
// picks it, and with it the mode: an Autodiff backend means
// dropout is active, a plain backend means inference.

/// Build a fresh model from a config and checkpoint it
pub mod init_use_case;

/// Restore a checkpoint and run token ids through it
pub mod forward_use_case;

/// Inspect rows of the sinusoidal positional table
pub mod encoding_use_case;
