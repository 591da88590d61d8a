// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system works with:
// the hierarchy shape and its input placeholders, corpus
// records, pre-trained embeddings, and configuration errors.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything here is unit-testable without a tensor backend.

/// ConfigError and the precondition guards that raise it
pub mod error;

/// Input shape, level geometry and placeholder declarations
pub mod hierarchy;

/// Corpus records: time steps with nested content and labels
pub mod record;

/// Pre-trained embedding matrix
pub mod embedding;

/// Core abstractions (traits) that other layers implement
pub mod traits;
