// ============================================================
// Layer 5 — Summed Cross-Entropy Losses
// ============================================================
// Both losses take a dense target matrix (one-hot or multi-hot,
// not class indices) and *sum* over every row instead of
// averaging, so a batch with more real time steps contributes
// proportionally more. All-zero target rows (padding steps)
// contribute nothing to the categorical loss. The binary loss
// counts every real step, including ones with no active label,
// and drops padding steps through a row mask.
//
// Predictions are clipped away from 0 and 1 before the log.

use burn::prelude::*;

/// Clip bound for probabilities before taking the log.
pub const EPSILON: f32 = 1.0e-7;

/// -Σ_rows Σ_classes y_true · ln(y_pred)
///
/// `y_pred` rows are renormalised to sum to 1 first, so slightly
/// off-simplex inputs behave.
pub fn summed_categorical_crossentropy<B: Backend>(
    y_true: Tensor<B, 2>,
    y_pred: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let y_pred = y_pred.clone() / y_pred.sum_dim(1);
    let y_pred = y_pred.clamp(EPSILON, 1.0 - EPSILON);
    (y_true * y_pred.log()).sum().neg()
}

/// -Σ [y · ln(p) + (1 - y) · ln(1 - p)] for independent sigmoid outputs.
/// Padding rows must be excluded by the caller via `row_mask`
/// ([rows, 1], 1 = real step).
pub fn summed_binary_crossentropy<B: Backend>(
    y_true:   Tensor<B, 2>,
    y_pred:   Tensor<B, 2>,
    row_mask: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let y_pred   = y_pred.clamp(EPSILON, 1.0 - EPSILON);
    let positive = y_true.clone() * y_pred.clone().log();
    let negative = (y_true.neg() + 1.0) * (y_pred.neg() + 1.0).log();
    ((positive + negative) * row_mask).sum().neg()
}

/// [steps.len() * time_steps, 1] mask: 1 for the first `steps[b]`
/// rows of sample b, 0 for its padding steps.
pub fn real_step_rows<B: Backend>(
    steps:      &[usize],
    time_steps: usize,
    device:     &B::Device,
) -> Tensor<B, 2> {
    let flags: Vec<f32> = steps
        .iter()
        .flat_map(|&n| (0..time_steps).map(move |t| if t < n { 1.0 } else { 0.0 }))
        .collect();
    Tensor::<B, 1>::from_floats(flags.as_slice(), device).reshape([steps.len() * time_steps, 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar()
    }

    #[test]
    fn test_identical_one_hot_is_near_zero() {
        let device = Default::default();
        let y      = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]], &device);
        let loss   = scalar(summed_categorical_crossentropy(y.clone(), y));
        assert!(loss.abs() < 1e-5, "loss = {loss}");
    }

    #[test]
    fn test_loss_is_summed_not_averaged() {
        let device = Default::default();
        let y_true = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0], [1.0, 0.0]], &device);
        let y_pred = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.5], [0.5, 0.5]], &device);
        let loss   = scalar(summed_categorical_crossentropy(y_true, y_pred));
        // two rows of -ln(0.5)
        assert!((loss - 2.0 * std::f32::consts::LN_2).abs() < 1e-4);
    }

    #[test]
    fn test_padding_rows_contribute_nothing() {
        let device = Default::default();
        let y_true = Tensor::<TestBackend, 2>::from_floats([[0.0, 1.0], [0.0, 0.0]], &device);
        let y_pred = Tensor::<TestBackend, 2>::from_floats([[0.25, 0.75], [0.9, 0.1]], &device);
        let loss   = scalar(summed_categorical_crossentropy(y_true, y_pred));
        assert!((loss + 0.75f32.ln()).abs() < 1e-4);
    }

    #[test]
    fn test_real_step_rows() {
        let device = Default::default();
        let mask   = real_step_rows::<TestBackend>(&[1, 3, 0], 2, &device);
        assert_eq!(mask.dims(), [6, 1]);
        assert_eq!(
            mask.into_data().to_vec::<f32>().unwrap(),
            vec![1.0, 0.0, 1.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_binary_crossentropy_counts_unlabelled_real_steps() {
        let device = Default::default();
        // sample of 2 time steps: a labelled step, then a real step with no label
        let y_true = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0], [0.0, 0.0]], &device);
        let y_pred = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.5], [0.5, 0.5]], &device);

        let both = real_step_rows(&[2], 2, &device);
        let loss = scalar(summed_binary_crossentropy(y_true.clone(), y_pred.clone(), both));
        assert!((loss - 4.0 * std::f32::consts::LN_2).abs() < 1e-4);

        // the second step as padding instead
        let first = real_step_rows(&[1], 2, &device);
        let loss  = scalar(summed_binary_crossentropy(y_true, y_pred, first));
        assert!((loss - 2.0 * std::f32::consts::LN_2).abs() < 1e-4);
    }
}
