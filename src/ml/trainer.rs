// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
//   - Training runs on Autodiff<Wgpu> for gradients
//   - model.valid() returns the model on the inner backend
//     (dropout off) for validation
//   - HanBatcher is backend-agnostic, so one batcher type feeds
//     both loaders
//   - Accuracy counts only real, labelled time steps: padding
//     steps and unlabelled steps are skipped
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{HanBatch, HanBatcher},
    dataset::{HanDataset, HanSample},
};
use crate::domain::embedding::EmbeddingMatrix;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::HanClassifier;

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

pub fn run_training(
    cfg:           &TrainConfig,
    embedding:     Option<EmbeddingMatrix>,
    train_dataset: HanDataset,
    val_dataset:   HanDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
) -> Result<EpochMetrics> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, embedding, train_dataset, val_dataset, &ckpt_manager, &metrics, device)
}

/// Train for `cfg.epochs` epochs and return the metrics of the best one.
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    embedding:     Option<EmbeddingMatrix>,
    train_dataset: HanDataset,
    val_dataset:   HanDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<EpochMetrics> {
    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = cfg.to_model_config();
    let shape     = model_cfg.validate()?;
    let mut model: HanClassifier<B> = model_cfg.init_with_embedding(embedding.as_ref(), &device)?;
    tracing::info!(
        "Model ready: {} poolings, {} parameters",
        shape.num_poolings(),
        model.num_params()
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let batcher = HanBatcher::new(shape.clone(), cfg.feature_dims.clone(), cfg.num_classes);

    let train_loader = DataLoaderBuilder::<B, HanSample, HanBatch<B>>::new(batcher.clone())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::<B::InnerBackend, HanSample, HanBatch<B::InnerBackend>>::new(batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let time_steps = shape.time_steps();
    let mut best: Option<EpochMetrics> = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.input, batch.targets, &batch.steps);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut correct      = 0usize;
        let mut counted      = 0usize;

        for batch in val_loader.iter() {
            let steps      = batch.steps.clone();
            let (loss, probs) = model_valid.forward_loss(batch.input, batch.targets.clone(), &steps);

            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;

            let probs   = to_vec(probs)?;
            let targets = to_vec(batch.targets)?;
            let (c, n)  = step_accuracy(&probs, &targets, &steps, time_steps, cfg.num_classes);
            correct += c;
            counted += n;
        }

        let avg_val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let val_acc      = if counted     > 0 { correct as f64 / counted as f64 } else { 0.0 };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, val_acc * 100.0,
        );

        let row = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, val_acc);
        metrics.log(&row)?;
        ckpt_manager.save_model(&model, epoch)?;

        let best_loss = best.as_ref().map_or(f64::INFINITY, EpochMetrics::selection_loss);
        if best.is_none() || row.is_improvement(best_loss) {
            ckpt_manager.mark_best(epoch)?;
            best = Some(row);
        }
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    let best = best.ok_or_else(|| anyhow::anyhow!("Training ran for zero epochs"))?;
    tracing::info!("Training complete! Best epoch: {}", best.epoch);
    Ok(best)
}

pub(crate) fn to_vec<B: Backend>(t: Tensor<B, 2>) -> Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))
}

/// Count (correct, counted) over real, labelled steps of a batch.
///
/// `probs` and `targets` are row-major [batch * time_steps, num_classes];
/// `steps[b]` is the number of real steps of sample b. A step is correct
/// when its highest-probability class is one of its labels.
pub fn step_accuracy(
    probs:       &[f32],
    targets:     &[f32],
    steps:       &[usize],
    time_steps:  usize,
    num_classes: usize,
) -> (usize, usize) {
    let mut correct = 0usize;
    let mut counted = 0usize;

    for (b, &real) in steps.iter().enumerate() {
        for t in 0..real.min(time_steps) {
            let row    = (b * time_steps + t) * num_classes;
            let target = &targets[row..row + num_classes];
            if target.iter().all(|&v| v == 0.0) {
                continue;
            }
            let pred = argmax(&probs[row..row + num_classes]);
            counted += 1;
            if target[pred] > 0.0 {
                correct += 1;
            }
        }
    }
    (correct, counted)
}

pub(crate) fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
        .0
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_step_accuracy_skips_padding_and_unlabelled_steps() {
        // 2 samples x 2 steps x 2 classes
        let probs = [
            0.9, 0.1, // s0 t0 → class 0, label 0  ✓
            0.2, 0.8, // s0 t1 → unlabelled, skipped
            0.3, 0.7, // s1 t0 → class 1, label 0  ✗
            0.6, 0.4, // s1 t1 → padding, skipped
        ];
        let targets = [
            1.0, 0.0,
            0.0, 0.0,
            1.0, 0.0,
            1.0, 0.0,
        ];
        let (correct, counted) = step_accuracy(&probs, &targets, &[2, 1], 2, 2);
        assert_eq!((correct, counted), (1, 2));
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[0.5]), 0);
    }

    #[test]
    fn test_short_training_run_writes_checkpoints_and_metrics() {
        type TrainBackend = Autodiff<NdArray<f32>>;

        let dir = std::env::temp_dir().join(format!("han_trainer_{}", std::process::id()));
        let _   = std::fs::remove_dir_all(&dir);
        let dir = dir.to_string_lossy().to_string();

        let cfg = TrainConfig {
            checkpoint_dir:        dir.clone(),
            structure:             vec![2, 2, 3],
            feature_dims:          vec![0, 0, 0],
            attention_output_dims: vec![4, 4],
            attention_weight_dims: vec![3, 3],
            hidden_units:          vec![4],
            dropout_rates:         vec![0.1],
            num_classes:           2,
            vocab_size:            10,
            embedding_dim:         3,
            batch_size:            2,
            epochs:                2,
            lr:                    1e-2,
            ..TrainConfig::default()
        };
        let shape = cfg.hierarchy().unwrap();

        let samples: Vec<HanSample> = (0..4u32)
            .map(|i| {
                let mut s = HanSample::empty(&shape, &cfg.feature_dims, cfg.num_classes);
                s.tokens.iter_mut().enumerate().for_each(|(j, t)| *t = (i + j as u32) % 9 + 1);
                s.targets[(i % 2) as usize] = 1.0;
                s.steps = 1;
                s
            })
            .collect();

        let ckpt    = CheckpointManager::new(dir.clone());
        let metrics = MetricsLogger::new(dir).unwrap();
        let best    = train_loop::<TrainBackend>(
            &cfg,
            None,
            HanDataset::new(samples[..3].to_vec()),
            HanDataset::new(samples[3..].to_vec()),
            &ckpt,
            &metrics,
            Default::default(),
        )
        .unwrap();

        assert!(best.epoch >= 1 && best.epoch <= 2);
        assert!(best.train_loss.is_finite());
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        assert_eq!(ckpt.best_epoch().unwrap(), best.epoch);

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
