// ============================================================
// Layer 3 — Hierarchy Shape and Input Placeholders
// ============================================================
// Describes the nested-sequence input of the classifier:
//
//   input_shape = [batch, time_step, n_1, ..., n_k]
//
// The last axis holds words. Node levels are numbered bottom-up:
//
//   level 0          → word       (axis rank-1)
//   level 1          → sentence   (axis rank-2)
//   level 2          → section
//   level 3          → document
//   level rank-2     → time step  (axis 1)
//
// A level-L node is identified by its index along axes
// [1 ..= rank-1-L]; its *parent* sits one level up. Pooling
// level L collapses the children of every level-(L+1) node
// into one vector, so the number of pooled vectors at level L
// equals the number of level-(L+1) nodes.
//
// At runtime every level is carried flattened as
//   [parents(L), sequence_len(L), features]
// so the attention pooling sees a plain 3-D batch regardless
// of how deep the hierarchy is.
//
// Pure Rust, no burn types in this file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{check, check_len, check_non_zero, ConfigError};

/// Validated `[batch, time_step, ..., word]` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyShape {
    dims: Vec<usize>,
}

impl HierarchyShape {
    /// Validate an input shape. Needs at least `[batch, time_step, word]`
    /// and every axis must be non-empty.
    pub fn new(input_shape: &[usize]) -> Result<Self, ConfigError> {
        check(input_shape.len() >= 3, || ConfigError::InputRankTooSmall {
            rank: input_shape.len(),
        })?;
        check_non_zero("input_shape", input_shape)?;
        Ok(Self { dims: input_shape.to_vec() })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn batch_size(&self) -> usize {
        self.dims[0]
    }

    pub fn time_steps(&self) -> usize {
        self.dims[1]
    }

    /// Node levels, word through time step.
    pub fn num_levels(&self) -> usize {
        self.rank() - 1
    }

    /// Attention poolings between word and time-step level.
    pub fn num_poolings(&self) -> usize {
        self.rank() - 2
    }

    /// The time-step level index.
    pub fn top_level(&self) -> usize {
        self.rank() - 2
    }

    /// Axis of `input_shape` that enumerates the nodes of `level`.
    pub fn axis(&self, level: usize) -> usize {
        debug_assert!(level < self.num_levels());
        self.rank() - 1 - level
    }

    /// Number of siblings under one parent at `level`.
    pub fn sequence_len(&self, level: usize) -> usize {
        self.dims[self.axis(level)]
    }

    /// Parents of `level` nodes within one sample.
    pub fn parents_per_sample(&self, level: usize) -> usize {
        self.dims[1..self.axis(level)].iter().product()
    }

    /// Parents of `level` nodes across a batch.
    pub fn parents(&self, level: usize, batch_size: usize) -> usize {
        batch_size * self.parents_per_sample(level)
    }

    /// Nodes of `level` within one sample.
    pub fn nodes_per_sample(&self, level: usize) -> usize {
        self.parents_per_sample(level) * self.sequence_len(level)
    }

    /// Word slots per sample, i.e. the length of one flattened token buffer.
    pub fn words_per_sample(&self) -> usize {
        self.nodes_per_sample(0)
    }

    /// Full N-D shape of the nodes at `level`, batch axis included.
    pub fn level_shape(&self, level: usize) -> Vec<usize> {
        self.dims[..=self.axis(level)].to_vec()
    }

    /// Human-readable level name used in placeholder names and logs.
    pub fn level_name(&self, level: usize) -> String {
        if level == self.top_level() {
            return "time_step".to_string();
        }
        match level {
            0 => "word".to_string(),
            1 => "sentence".to_string(),
            2 => "section".to_string(),
            3 => "document".to_string(),
            n => format!("level_{n}"),
        }
    }

    /// Declare the input placeholders for this hierarchy: the word input
    /// (token ids plus word-level features) followed by one auxiliary
    /// feature input per higher level. Always `rank - 1` entries.
    pub fn build_inputs(&self, input_feature_dims: &[usize]) -> Result<Vec<InputSpec>, ConfigError> {
        check_len("input_feature_dims", input_feature_dims, self.num_levels())?;

        let mut inputs = Vec::with_capacity(self.num_levels());
        inputs.push(InputSpec {
            name:        "word_input".to_string(),
            kind:        InputKind::Tokens,
            level:       0,
            shape:       self.dims.clone(),
            feature_dim: input_feature_dims[0],
        });

        for level in 1..self.num_levels() {
            let mut shape = self.level_shape(level);
            shape.push(input_feature_dims[level]);
            inputs.push(InputSpec {
                name:        format!("{}_features", self.level_name(level)),
                kind:        InputKind::Features,
                level,
                shape,
                feature_dim: input_feature_dims[level],
            });
        }
        Ok(inputs)
    }
}

/// Validate the per-level arrays of a hierarchical encoder against its
/// input shape and return the parsed shape.
pub fn validate_hierarchy(
    input_shape:                  &[usize],
    input_feature_dims:           &[usize],
    attention_output_dims:        &[usize],
    attention_weight_vector_dims: &[usize],
) -> Result<HierarchyShape, ConfigError> {
    let shape = HierarchyShape::new(input_shape)?;
    check_len("input_feature_dims", input_feature_dims, shape.num_levels())?;
    check_len("attention_output_dims", attention_output_dims, shape.num_poolings())?;
    check_len(
        "attention_weight_vector_dims",
        attention_weight_vector_dims,
        attention_output_dims.len(),
    )?;
    check_non_zero("attention_output_dims", attention_output_dims)?;
    check_non_zero("attention_weight_vector_dims", attention_weight_vector_dims)?;
    Ok(shape)
}

/// What a placeholder carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    /// Integer token ids (with optional word-level features alongside).
    Tokens,
    /// Dense auxiliary features of one level's nodes.
    Features,
}

/// One declared model input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name:        String,
    pub kind:        InputKind,
    pub level:       usize,
    /// Full N-D shape, batch axis first. For features the last axis is
    /// `feature_dim`; for tokens it is the word axis.
    pub shape:       Vec<usize>,
    pub feature_dim: usize,
}

impl InputSpec {
    /// Flattened `[parents, sequence]` (tokens) or
    /// `[parents, sequence, feature_dim]` (features) layout used at runtime.
    pub fn runtime_dims(&self, hierarchy: &HierarchyShape, batch_size: usize) -> Vec<usize> {
        let parents = hierarchy.parents(self.level, batch_size);
        let seq     = hierarchy.sequence_len(self.level);
        match self.kind {
            InputKind::Tokens   => vec![parents, seq],
            InputKind::Features => vec![parents, seq, self.feature_dim],
        }
    }
}

impl fmt::Display for InputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InputKind::Tokens => write!(
                f,
                "{:<22} tokens   {:?} (+{} word features)",
                self.name, self.shape, self.feature_dim
            ),
            InputKind::Features => write!(f, "{:<22} features {:?}", self.name, self.shape),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn five_axes() -> HierarchyShape {
        // [batch, time_step, section, sentence, word]
        HierarchyShape::new(&[2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn test_rejects_fewer_than_three_axes() {
        assert_eq!(
            HierarchyShape::new(&[2, 3]),
            Err(ConfigError::InputRankTooSmall { rank: 2 })
        );
        assert!(HierarchyShape::new(&[]).is_err());
        assert!(HierarchyShape::new(&[2, 3, 4]).is_ok());
    }

    #[test]
    fn test_rejects_empty_axis() {
        assert_eq!(
            HierarchyShape::new(&[2, 3, 0]),
            Err(ConfigError::ZeroDimension { name: "input_shape", index: 2 })
        );
    }

    #[test]
    fn test_level_geometry() {
        let s = five_axes();
        assert_eq!(s.num_levels(), 4);
        assert_eq!(s.num_poolings(), 3);
        // word level: parents are sentences
        assert_eq!(s.sequence_len(0), 6);
        assert_eq!(s.parents(0, 2), 2 * 3 * 4 * 5);
        // time-step level: parents are samples
        assert_eq!(s.sequence_len(3), 3);
        assert_eq!(s.parents(3, 2), 2);
        assert_eq!(s.words_per_sample(), 3 * 4 * 5 * 6);
    }

    #[test]
    fn test_level_names() {
        let s = five_axes();
        let names: Vec<String> = (0..s.num_levels()).map(|l| s.level_name(l)).collect();
        assert_eq!(names, vec!["word", "sentence", "section", "time_step"]);

        let flat = HierarchyShape::new(&[1, 2, 3]).unwrap();
        assert_eq!(flat.level_name(0), "word");
        assert_eq!(flat.level_name(1), "time_step");
    }

    #[test]
    fn test_reshape_round_trip_preserves_element_count() {
        // Pooling level L yields one vector per level-(L+1) node; the
        // reshape up must not gain or lose elements.
        let s     = five_axes();
        let width = 7;
        for level in 0..s.num_poolings() {
            let pooled    = s.parents(level, 2) * width;
            let reshaped  = s.parents(level + 1, 2) * s.sequence_len(level + 1) * width;
            assert_eq!(pooled, reshaped, "level {level}");
        }
        let total: usize = s.dims().iter().product();
        assert_eq!(s.parents(0, 2) * s.sequence_len(0), total);
    }

    #[test]
    fn test_build_inputs_count_and_shapes() {
        let s      = HierarchyShape::new(&[8, 5, 10, 20]).unwrap();
        let inputs = s.build_inputs(&[0, 3, 2]).unwrap();
        assert_eq!(inputs.len(), s.rank() - 1);

        assert_eq!(inputs[0].kind, InputKind::Tokens);
        assert_eq!(inputs[0].shape, vec![8, 5, 10, 20]);
        assert_eq!(inputs[1].name, "sentence_features");
        assert_eq!(inputs[1].shape, vec![8, 5, 10, 3]);
        assert_eq!(inputs[2].name, "time_step_features");
        assert_eq!(inputs[2].shape, vec![8, 5, 2]);

        assert_eq!(inputs[0].runtime_dims(&s, 8), vec![8 * 5 * 10, 20]);
        assert_eq!(inputs[1].runtime_dims(&s, 4), vec![4 * 5, 10, 3]);
    }

    #[test]
    fn test_validate_hierarchy_length_mismatches() {
        let shape = [2, 3, 4, 5];
        assert!(validate_hierarchy(&shape, &[0, 0, 0], &[8, 8], &[4, 4]).is_ok());

        assert!(matches!(
            validate_hierarchy(&shape, &[0, 0], &[8, 8], &[4, 4]),
            Err(ConfigError::LengthMismatch { name: "input_feature_dims", .. })
        ));
        assert!(matches!(
            validate_hierarchy(&shape, &[0, 0, 0], &[8], &[4]),
            Err(ConfigError::LengthMismatch { name: "attention_output_dims", .. })
        ));
        assert!(matches!(
            validate_hierarchy(&shape, &[0, 0, 0], &[8, 8], &[4]),
            Err(ConfigError::LengthMismatch { name: "attention_weight_vector_dims", .. })
        ));
        assert!(matches!(
            validate_hierarchy(&[2, 3], &[0], &[], &[]),
            Err(ConfigError::InputRankTooSmall { rank: 2 })
        ));
    }
}
