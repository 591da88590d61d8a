// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained model from train_config.json, loads its
// weights and tokenizer from the checkpoint directory, and turns
// records into per-step class predictions.
//
// Only real steps are reported: a record with 3 steps in a model
// built for 8 gets 3 predictions, and steps beyond the model's
// time axis are dropped by the encoder.

use anyhow::Result;
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{HanBatch, HanBatcher},
    dataset::HanSample,
    encoder::SampleEncoder,
};
use crate::domain::{
    hierarchy::{HierarchyShape, InputSpec},
    record::Record,
};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::model::HanClassifier;
use crate::ml::trainer::{argmax, to_vec};

type InferBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepPrediction {
    pub step:          usize,
    pub label:         usize,
    pub confidence:    f32,
    pub probabilities: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordPrediction {
    pub id:    String,
    pub steps: Vec<StepPrediction>,
}

pub struct Inferencer<B: Backend = InferBackend> {
    model:     HanClassifier<B>,
    tokenizer: Tokenizer,
    config:    TrainConfig,
    shape:     HierarchyShape,
    inputs:    Vec<InputSpec>,
    device:    B::Device,
}

impl Inferencer<InferBackend> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        Self::load(ckpt_manager, burn::backend::wgpu::WgpuDevice::default())
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn load(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let config    = ckpt_manager.load_config()?;
        let tokenizer = TokenizerStore::new(ckpt_manager.dir().to_string_lossy().to_string()).load()?;

        let model_cfg = config.to_model_config();
        let shape     = model_cfg.validate()?;
        let inputs    = model_cfg.build_inputs()?;
        let model     = model_cfg.init::<B>(&device)?;
        let model     = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self { model, tokenizer, config, shape, inputs, device })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Predict every real step of every record, batch_size records at a time.
    pub fn predict(&self, records: &[Record]) -> Result<Vec<RecordPrediction>> {
        let cfg     = &self.config;
        let encoder = SampleEncoder::new(
            self.shape.clone(),
            cfg.feature_dims.clone(),
            cfg.num_classes,
            &self.tokenizer,
        )?;
        let batcher    = HanBatcher::new(self.shape.clone(), cfg.feature_dims.clone(), cfg.num_classes);
        let time_steps = self.shape.time_steps();
        let classes    = cfg.num_classes;

        let mut out = Vec::with_capacity(records.len());
        for chunk in records.chunks(cfg.batch_size.max(1)) {
            let samples = encoder.encode_all(chunk)?;
            let batch: HanBatch<B> =
                Batcher::<B, HanSample, HanBatch<B>>::batch(&batcher, samples, &self.device);
            batch.input.validate(&self.shape, &self.inputs)?;
            let probs = to_vec(self.model.forward(batch.input))?;

            for (b, record) in chunk.iter().enumerate() {
                let steps = (0..batch.steps[b])
                    .map(|t| {
                        let row   = (b * time_steps + t) * classes;
                        let dist  = probs[row..row + classes].to_vec();
                        let label = argmax(&dist);
                        StepPrediction { step: t, label, confidence: dist[label], probabilities: dist }
                    })
                    .collect();
                out.push(RecordPrediction { id: record.id.clone(), steps });
            }
        }

        tracing::debug!("Predicted {} records", out.len());
        Ok(out)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::domain::record::{Segment, Step};

    type TestBackend = NdArray<f32>;

    fn saved_checkpoint(name: &str) -> CheckpointManager {
        let dir = std::env::temp_dir().join(format!("han_infer_{name}_{}", std::process::id()));
        let _   = std::fs::remove_dir_all(&dir);
        let dir = dir.to_string_lossy().to_string();

        let cfg = TrainConfig {
            checkpoint_dir:        dir.clone(),
            structure:             vec![3, 2, 4],
            feature_dims:          vec![0, 0, 0],
            attention_output_dims: vec![4, 4],
            attention_weight_dims: vec![3, 3],
            hidden_units:          vec![4],
            dropout_rates:         vec![0.2],
            num_classes:           3,
            vocab_size:            20,
            embedding_dim:         3,
            batch_size:            2,
            ..TrainConfig::default()
        };

        TokenizerStore::new(dir.clone())
            .load_or_build(&["the cat sat on the mat".to_string()], cfg.vocab_size)
            .unwrap();
        let ckpt  = CheckpointManager::new(dir);
        let model = cfg.to_model_config().init::<TestBackend>(&Default::default()).unwrap();
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_model(&model, 1).unwrap();
        ckpt
    }

    fn record(id: &str, steps: usize) -> Record {
        Record {
            id:    id.to_string(),
            steps: (0..steps)
                .map(|_| Step { labels: vec![], content: Segment::text("The cat sat. On the mat.") })
                .collect(),
        }
    }

    #[test]
    fn test_predicts_only_real_steps() {
        let ckpt       = saved_checkpoint("steps");
        let inferencer = Inferencer::<TestBackend>::load(&ckpt, Default::default()).unwrap();

        // 5 steps is more than the 3 the model was built for
        let records = vec![record("a", 1), record("b", 3), record("c", 5)];
        let preds   = inferencer.predict(&records).unwrap();

        assert_eq!(preds.len(), 3);
        assert_eq!(preds[0].id, "a");
        assert_eq!(preds[0].steps.len(), 1);
        assert_eq!(preds[1].steps.len(), 3);
        assert_eq!(preds[2].steps.len(), 3);

        for step in preds.iter().flat_map(|p| &p.steps) {
            let total: f32 = step.probabilities.iter().sum();
            assert!((total - 1.0).abs() < 1e-4);
            assert!(step.label < 3);
            assert_eq!(step.confidence, step.probabilities[step.label]);
        }
    }

    #[test]
    fn test_missing_checkpoint_fails() {
        let dir  = std::env::temp_dir().join(format!("han_infer_none_{}", std::process::id()));
        let ckpt = CheckpointManager::new(dir.to_string_lossy().to_string());
        assert!(Inferencer::<TestBackend>::load(&ckpt, Default::default()).is_err());
    }
}
