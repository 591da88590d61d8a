// ============================================================
// Layer 3 — Configuration Errors
// ============================================================
// Every architecture precondition (axis counts, per-level array
// lengths, non-zero widths) is checked before a single tensor
// is allocated. A failed check is a ConfigError.
//
// Shape errors that happen *inside* burn (e.g. a tensor with
// the wrong width handed to forward) are not caught here;
// they surface as burn panics, as in any burn model.

use thiserror::Error;

/// A model or data configuration that cannot be built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("input shape must have at least 3 axes [batch, time_step, ..., word], got {rank}")]
    InputRankTooSmall { rank: usize },

    #[error("{name} must have {expected} entries, got {got}")]
    LengthMismatch {
        name:     &'static str,
        expected: usize,
        got:      usize,
    },

    #[error("{name}[{index}] must be greater than zero")]
    ZeroDimension { name: &'static str, index: usize },

    #[error("{name} must be greater than zero")]
    ZeroValue { name: &'static str },

    #[error("dropout rate {rate} at hidden layer {index} must be in [0, 1)")]
    InvalidDropout { index: usize, rate: f64 },

    #[error("classifier input must be rank 3 [batch, time_step, features], got rank {rank}")]
    ClassifierInputRank { rank: usize },

    #[error("embedding matrix is {rows}x{dim}, expected {expected_rows}x{expected_dim}")]
    EmbeddingShape {
        rows:          usize,
        dim:           usize,
        expected_rows: usize,
        expected_dim:  usize,
    },

    #[error("input '{name}' has shape {got:?}, expected {expected:?}")]
    InputShape {
        name:     String,
        expected: Vec<usize>,
        got:      Vec<usize>,
    },

    #[error("label {label} is out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },
}

/// Fail with the error built by `err` unless `condition` holds.
pub fn check(condition: bool, err: impl FnOnce() -> ConfigError) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(err())
    }
}

/// Fail unless `values` has exactly `expected` entries.
pub fn check_len<T>(name: &'static str, values: &[T], expected: usize) -> Result<(), ConfigError> {
    check(values.len() == expected, || ConfigError::LengthMismatch {
        name,
        expected,
        got: values.len(),
    })
}

/// Fail if any entry of `values` is zero.
pub fn check_non_zero(name: &'static str, values: &[usize]) -> Result<(), ConfigError> {
    match values.iter().position(|&v| v == 0) {
        Some(index) => Err(ConfigError::ZeroDimension { name, index }),
        None        => Ok(()),
    }
}
