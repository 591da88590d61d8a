// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the checkpoint directory or external
// files on behalf of the other layers:
//
//   checkpoint.rs      — model weights via Burn's CompactRecorder,
//                        epoch pointers and train_config.json
//
//   tokenizer_store.rs — word-level vocabulary, built from the
//                        corpus on first run and reloaded after
//
//   embedding_store.rs — pre-trained word vectors aligned to the
//                        vocabulary
//
//   metrics.rs         — per-epoch metrics CSV
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Pre-trained embedding file reader
pub mod embedding_store;

/// Training metrics CSV logger
pub mod metrics;
