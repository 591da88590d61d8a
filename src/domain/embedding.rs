// ============================================================
// Layer 3 — Pre-trained Embedding Matrix
// ============================================================
// A dense row-major [rows, dim] table used to seed the word
// embedding layer. Row i is the vector for token id i.

use crate::domain::error::{check, ConfigError};

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    pub rows:   usize,
    pub dim:    usize,
    pub values: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Wrap `values`; its length must be `rows * dim`.
    pub fn new(rows: usize, dim: usize, values: Vec<f32>) -> Result<Self, ConfigError> {
        check(values.len() == rows * dim, || ConfigError::LengthMismatch {
            name:     "embedding values",
            expected: rows * dim,
            got:      values.len(),
        })?;
        Ok(Self { rows, dim, values })
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }

    /// Fail unless this matrix fits an embedding layer of the given size.
    pub fn check_fits(&self, rows: usize, dim: usize) -> Result<(), ConfigError> {
        check(self.rows == rows && self.dim == dim, || ConfigError::EmbeddingShape {
            rows:          self.rows,
            dim:           self.dim,
            expected_rows: rows,
            expected_dim:  dim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_value_count() {
        assert!(EmbeddingMatrix::new(2, 3, vec![0.0; 6]).is_ok());
        assert!(EmbeddingMatrix::new(2, 3, vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_row_and_fit() {
        let m = EmbeddingMatrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert!(m.check_fits(2, 2).is_ok());
        assert!(matches!(m.check_fits(3, 2), Err(ConfigError::EmbeddingShape { .. })));
    }
}
