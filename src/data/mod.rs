// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a .jsonl corpus and tensor batches.
//
//   .jsonl files
//       │
//       ▼
//   JsonlLoader       → parses one Record per line
//       │
//       ▼
//   SampleEncoder     → walks each record down the hierarchy,
//       │               using the Segmenter for plain text and
//       │               the tokenizer for words
//       ▼
//   HanSample         → fixed-size, zero-padded buffers
//       │
//       ▼
//   split_train_val   → seeded train/validation split
//       │
//       ▼
//   HanDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   HanBatcher        → flattened [parents, sequence, features] tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads JSON-lines corpora
pub mod loader;

/// Cleans text and splits it into paragraphs, sentences and words
pub mod segmenter;

/// Encodes records into padded samples
pub mod encoder;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
