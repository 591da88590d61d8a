// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load .jsonl records          (Layer 4 - data)
//   Step 2: Build / load tokenizer       (Layer 6 - infra)
//   Step 3: Load pre-trained vectors     (Layer 6 - infra, optional)
//   Step 4: Encode records into samples  (Layer 4 - data)
//   Step 5: Split train/validation       (Layer 4 - data)
//   Step 6: Build datasets               (Layer 4 - data)
//   Step 7: Save config                  (Layer 6 - infra)
//   Step 8: Run training loop            (Layer 5 - ml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::HanDataset,
    encoder::SampleEncoder,
    loader::JsonlLoader,
    splitter::split_train_val,
};
use crate::domain::{hierarchy::HierarchyShape, traits::RecordSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    embedding_store::load_embeddings,
    metrics::{EpochMetrics, MetricsLogger},
    tokenizer_store::TokenizerStore,
};
use crate::ml::classifier::{HiddenActivation, OutputActivation};
use crate::ml::model::HanClassifierConfig;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything needed to rebuild the model and its input pipeline.
// Saved as train_config.json next to the checkpoints.
//
// `structure` is the per-sample shape [time_step, ..., word]; the
// model's input shape is [batch_size] followed by it. All per-level
// lists are ordered bottom-up (word level first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:             String,
    pub checkpoint_dir:        String,
    pub structure:             Vec<usize>,
    pub feature_dims:          Vec<usize>,
    pub attention_output_dims: Vec<usize>,
    pub attention_weight_dims: Vec<usize>,
    pub hidden_units:          Vec<usize>,
    pub dropout_rates:         Vec<f64>,
    pub num_classes:           usize,
    pub vocab_size:            usize,
    pub embedding_dim:         usize,
    pub embedding_file:        Option<String>,
    pub recurrent_encoder:     bool,
    pub hidden_activations:    Vec<HiddenActivation>,
    pub output_activation:     OutputActivation,
    pub batch_size:            usize,
    pub epochs:                usize,
    pub lr:                    f64,
    pub seed:                  u64,
    pub train_fraction:        f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:             "data/corpus.jsonl".to_string(),
            checkpoint_dir:        "checkpoints".to_string(),
            structure:             vec![4, 8, 20],
            feature_dims:          vec![0, 0, 0],
            attention_output_dims: vec![64, 64],
            attention_weight_dims: vec![64, 64],
            hidden_units:          vec![64],
            dropout_rates:         vec![0.2],
            num_classes:           2,
            vocab_size:            20_000,
            embedding_dim:         100,
            embedding_file:        None,
            recurrent_encoder:     false,
            hidden_activations:    vec![HiddenActivation::Tanh],
            output_activation:     OutputActivation::Softmax,
            batch_size:            16,
            epochs:                10,
            lr:                    1e-3,
            seed:                  42,
            train_fraction:        0.8,
        }
    }
}

impl TrainConfig {
    /// [batch_size, time_step, ..., word]
    pub fn input_shape(&self) -> Vec<usize> {
        std::iter::once(self.batch_size).chain(self.structure.iter().copied()).collect()
    }

    pub fn hierarchy(&self) -> Result<HierarchyShape> {
        Ok(HierarchyShape::new(&self.input_shape())?)
    }

    pub fn to_model_config(&self) -> HanClassifierConfig {
        HanClassifierConfig::new(
            self.input_shape(),
            self.feature_dims.clone(),
            self.attention_output_dims.clone(),
            self.attention_weight_dims.clone(),
            self.vocab_size,
            self.embedding_dim,
            self.num_classes,
            self.hidden_units.clone(),
            self.dropout_rates.clone(),
            self.hidden_activations.clone(),
        )
        .with_use_recurrent_encoder(self.recurrent_encoder)
        .with_output_activation(self.output_activation)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end and return the
    /// metrics of the best epoch.
    pub fn execute(&self) -> Result<EpochMetrics> {
        let cfg = &self.config;

        // Fail on a bad architecture before touching the corpus
        let model_cfg = cfg.to_model_config();
        let shape     = model_cfg.validate()?;

        // ── Step 1: Load all records ──────────────────────────────────────────
        tracing::info!("Loading records from '{}'", cfg.data_path);
        let records = JsonlLoader::new(&cfg.data_path).load_all()?;
        anyhow::ensure!(!records.is_empty(), "No records found in '{}'", cfg.data_path);

        // ── Step 2: Build / load tokenizer ────────────────────────────────────
        let texts: Vec<String> = records.iter().flat_map(|r| r.texts()).collect();
        let tokenizer          = TokenizerStore::new(&cfg.checkpoint_dir)
            .load_or_build(&texts, cfg.vocab_size)?;

        // ── Step 3: Pre-trained word vectors ──────────────────────────────────
        let embedding = match &cfg.embedding_file {
            Some(file) => Some(load_embeddings(
                Path::new(file),
                &tokenizer,
                cfg.vocab_size,
                cfg.embedding_dim,
                cfg.seed,
            )?),
            None => None,
        };

        // ── Step 4: Encode records ────────────────────────────────────────────
        let encoder = SampleEncoder::new(shape, cfg.feature_dims.clone(), cfg.num_classes, &tokenizer)?;
        let samples = encoder.encode_all(&records)?;
        tracing::info!("Encoded {} samples", samples.len());

        // ── Step 5: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );
        anyhow::ensure!(!train_samples.is_empty(), "Training split is empty");

        // ── Step 6: Build Burn datasets ───────────────────────────────────────
        let train_dataset = HanDataset::new(train_samples);
        let val_dataset   = HanDataset::new(val_samples);

        // ── Step 7: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, embedding, train_dataset, val_dataset, ckpt_manager, metrics)
    }
}
