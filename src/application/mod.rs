// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// training, predicting, or describing a model.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// Per-step prediction on a trained checkpoint
pub mod predict_use_case;

// Architecture description without training
pub mod summary_use_case;
