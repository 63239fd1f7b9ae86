// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types shared by every other layer.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums and functions over shapes
//
// The attention and embedding blocks are Burn modules, but the
// contracts they enforce (divisible head widths, sequence limits,
// matching batch axes, broadcastable masks) are plain arithmetic
// on dimension arrays. Keeping those checks here means they can be
// unit tested without building a single tensor.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need §3.2

/// Error taxonomy for construction and call-time failures
pub mod error;

/// Shape arithmetic and validation for attention inputs
pub mod shape;

/// Validated batches of token ids
pub mod tokens;
