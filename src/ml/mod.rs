// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All neural-network code lives here.
//
//   attention.rs  — one attention-pooling step: sequence encoder
//                   (GRU or dense + tanh), additive attention with
//                   a learned context vector, padding mask
//
//   hierarchy.rs  — stacks one pooling per level, word → sentence
//                   → section → ... → time step, reshaping the
//                   flattened tensors between levels
//
//   classifier.rs — per-time-step MLP head with dropout and a
//                   softmax / sigmoid output
//
//   loss.rs       — summed (not averaged) cross-entropy
//
//   model.rs      — HanClassifierConfig / HanClassifier, the
//                   encoder and head assembled and validated
//
//   trainer.rs    — training loop with validation, metrics and
//                   per-epoch checkpoints
//
//   inferencer.rs — loads a checkpoint and predicts per-step labels
//
// Reference: Yang et al. (2016) Hierarchical Attention Networks
//            for Document Classification
//            Burn Book §3 (Building Blocks), §5 (Training)

/// Attention-weighted sequence pooling
pub mod attention;

/// Multi-level hierarchical attention encoder
pub mod hierarchy;

/// Per-time-step classification head
pub mod classifier;

/// Summed cross-entropy losses
pub mod loss;

/// Full classifier: encoder + head
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and predicts labels
pub mod inferencer;
