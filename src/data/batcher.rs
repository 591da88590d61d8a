// ============================================================
// Layer 4 — HAN Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<HanSample> into
// the flattened tensors the hierarchical encoder consumes.
//
// Every HanSample buffer is row-major over [time_step, ..., word],
// so stacking N samples end to end and reshaping gives:
//
//   tokens        [N * parents_per_sample(0), words]
//   features[L]   [N * parents_per_sample(L), sequence_len(L), dim(L)]
//   targets       [N * time_steps, num_classes]
//
// Levels with feature dim 0 get no tensor at all.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::HanSample;
use crate::domain::hierarchy::HierarchyShape;
use crate::ml::hierarchy::HierarchicalInput;

// ─── HanBatch ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct HanBatch<B: Backend> {
    pub input:   HierarchicalInput<B>,

    /// Multi-hot targets, shape [batch_size * time_steps, num_classes]
    /// Rows of padding steps are all zero.
    pub targets: Tensor<B, 2>,

    /// Real (non-padding) step count of each sample
    pub steps:   Vec<usize>,
}

impl<B: Backend> HanBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.input.batch_size
    }
}

// ─── HanBatcher ───────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct HanBatcher {
    shape:        HierarchyShape,
    feature_dims: Vec<usize>,
    num_classes:  usize,
}

impl HanBatcher {
    pub fn new(shape: HierarchyShape, feature_dims: Vec<usize>, num_classes: usize) -> Self {
        Self { shape, feature_dims, num_classes }
    }
}

impl<B: Backend> Batcher<B, HanSample, HanBatch<B>> for HanBatcher {
    fn batch(&self, items: Vec<HanSample>, device: &B::Device) -> HanBatch<B> {
        let batch_size = items.len();
        let shape      = &self.shape;

        // ── Tokens ────────────────────────────────────────────────────────────
        let token_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.tokens.iter().map(|&t| t as i32))
            .collect();
        let tokens = Tensor::<B, 1, Int>::from_ints(token_flat.as_slice(), device)
            .reshape([shape.parents(0, batch_size), shape.sequence_len(0)]);

        // ── Per-level features ────────────────────────────────────────────────
        let features = self
            .feature_dims
            .iter()
            .enumerate()
            .map(|(level, &dim)| {
                if dim == 0 {
                    return None;
                }
                let flat: Vec<f32> = items
                    .iter()
                    .flat_map(|s| s.features[level].iter().copied())
                    .collect();
                Some(
                    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([
                        shape.parents(level, batch_size),
                        shape.sequence_len(level),
                        dim,
                    ]),
                )
            })
            .collect();

        // ── Targets ───────────────────────────────────────────────────────────
        let target_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.targets.iter().copied())
            .collect();
        let targets = Tensor::<B, 1>::from_floats(target_flat.as_slice(), device)
            .reshape([batch_size * shape.time_steps(), self.num_classes]);

        HanBatch {
            input: HierarchicalInput { batch_size, tokens, features },
            targets,
            steps: items.iter().map(|s| s.steps).collect(),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn sample(shape: &HierarchyShape, fill: u32, steps: usize) -> HanSample {
        let mut s = HanSample::empty(shape, &[0, 0, 2], 3);
        s.tokens.iter_mut().for_each(|t| *t = fill);
        s.features[2].iter_mut().for_each(|f| *f = fill as f32);
        s.targets[0] = 1.0;
        s.steps      = steps;
        s
    }

    #[test]
    fn test_batch_shapes_follow_hierarchy() {
        // [batch, time_step, sentence, word]
        let shape   = HierarchyShape::new(&[1, 2, 3, 4]).unwrap();
        let batcher = HanBatcher::new(shape.clone(), vec![0, 0, 2], 3);
        let device  = Default::default();

        let batch: HanBatch<TestBackend> = Batcher::<TestBackend, _, _>::batch(
            &batcher,
            vec![sample(&shape, 5, 1), sample(&shape, 7, 2)],
            &device,
        );

        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.input.tokens.dims(), [2 * 2 * 3, 4]);
        assert!(batch.input.features[0].is_none());
        assert!(batch.input.features[1].is_none());
        let top = batch.input.features[2].clone().unwrap();
        assert_eq!(top.dims(), [2, 2, 2]);
        assert_eq!(batch.targets.dims(), [4, 3]);
        assert_eq!(batch.steps, vec![1, 2]);
    }

    #[test]
    fn test_samples_stay_in_order() {
        let shape   = HierarchyShape::new(&[1, 1, 2]).unwrap();
        let batcher = HanBatcher::new(shape.clone(), vec![0, 0], 2);
        let device  = Default::default();

        let mut a = HanSample::empty(&shape, &[0, 0], 2);
        a.tokens  = vec![3, 4];
        let mut b = HanSample::empty(&shape, &[0, 0], 2);
        b.tokens  = vec![5, 0];

        let batch: HanBatch<TestBackend> =
            Batcher::<TestBackend, _, _>::batch(&batcher, vec![a, b], &device);
        let ids: Vec<i64> = batch
            .input
            .tokens
            .into_data()
            .convert::<i64>()
            .to_vec()
            .unwrap();
        assert_eq!(ids, vec![3, 4, 5, 0]);
    }
}
