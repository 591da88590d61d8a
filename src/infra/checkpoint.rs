// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Model weights (.mpk.gz file) per epoch
//   2. latest_epoch.json  — which epoch was last saved
//   3. best_epoch.json    — epoch with the lowest validation loss
//   4. train_config.json  — architecture + pipeline config
//
// The config is needed to rebuild a model of the right shape
// before its weights can be loaded into it.
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json
//     best_epoch.json
//     train_config.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::HanClassifier;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Save model weights for `epoch` and move the latest-epoch pointer.
    pub fn save_model<B: Backend>(&self, model: &HanClassifier<B>, epoch: usize) -> Result<()> {
        // recorder adds the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_epoch("latest_epoch.json", epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        self.write_epoch("best_epoch.json", epoch)
    }

    /// Load the best checkpoint, or the latest one when no best epoch
    /// was recorded.
    pub fn load_model<B: Backend>(
        &self,
        model:  HanClassifier<B>,
        device: &B::Device,
    ) -> Result<HanClassifier<B>> {
        let epoch = match self.best_epoch() {
            Ok(epoch) => epoch,
            Err(_)    => self.latest_epoch()?,
        };
        self.load_epoch(model, epoch, device)
    }

    pub fn load_epoch<B: Backend>(
        &self,
        model:  HanClassifier<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<HanClassifier<B>> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Must be called before training so inference can rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_epoch("latest_epoch.json")
            .context("Cannot find 'latest_epoch.json'. Have you run 'train' first?")
    }

    pub fn best_epoch(&self) -> Result<usize> {
        self.read_epoch("best_epoch.json")
    }

    fn write_epoch(&self, file: &str, epoch: usize) -> Result<()> {
        fs::write(self.dir.join(file), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {file}"))
    }

    fn read_epoch(&self, file: &str) -> Result<usize> {
        let s = fs::read_to_string(self.dir.join(file))
            .with_context(|| format!("Cannot read '{file}'"))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
