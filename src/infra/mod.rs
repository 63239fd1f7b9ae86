// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   config_source.rs    — Reads the external JSON document with
//                         d_model / num_heads / dropout and turns
//                         it into a TransformerConfig.
//
//   checkpoint.rs       — Saves and restores AttentionStem weights
//                         with Burn's CompactRecorder, plus the
//                         config needed to rebuild the module.
//
//   attention_export.rs — Dumps attention weights to CSV, one
//                         grid per batch item and head.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// External config document loading
pub mod config_source;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Attention weight CSV export
pub mod attention_export;
