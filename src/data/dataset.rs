use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::hierarchy::HierarchyShape;

/// One record, encoded and padded to the fixed hierarchy shape.
///
/// Buffers are row-major over the per-sample axes
/// [time_step, ..., word], so concatenating samples gives exactly the
/// flattened batch layout the encoder expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HanSample {
    /// words_per_sample token ids, 0 = padding
    pub tokens:   Vec<u32>,
    /// One buffer per level (word first), nodes_per_sample(L) * dim(L)
    /// values; empty for levels without features
    pub features: Vec<Vec<f32>>,
    /// time_steps * num_classes multi-hot targets; padding steps are all 0
    pub targets:  Vec<f32>,
    /// Real (non-padding) time steps
    pub steps:    usize,
}

impl HanSample {
    /// An all-padding sample for the given geometry.
    pub fn empty(shape: &HierarchyShape, feature_dims: &[usize], num_classes: usize) -> Self {
        Self {
            tokens:   vec![0; shape.words_per_sample()],
            features: feature_dims
                .iter()
                .enumerate()
                .map(|(level, &dim)| vec![0.0; shape.nodes_per_sample(level) * dim])
                .collect(),
            targets:  vec![0.0; shape.time_steps() * num_classes],
            steps:    0,
        }
    }

    /// Non-padding word slots.
    pub fn word_count(&self) -> usize {
        self.tokens.iter().filter(|&&t| t != 0).count()
    }
}

pub struct HanDataset {
    samples: Vec<HanSample>,
}

impl HanDataset {
    pub fn new(samples: Vec<HanSample>) -> Self { Self { samples } }
}

impl Dataset<HanSample> for HanDataset {
    fn get(&self, index: usize) -> Option<HanSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
