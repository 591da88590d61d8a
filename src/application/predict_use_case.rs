// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Loads a trained checkpoint and predicts a label for every
// real time step of every record in a .jsonl corpus.
//
//   Step 1: Rebuild model + tokenizer from the checkpoint dir
//   Step 2: Load records                  (Layer 4 - data)
//   Step 3: Encode, batch and predict     (Layer 5 - ml)

use anyhow::Result;

use crate::data::loader::JsonlLoader;
use crate::domain::traits::RecordSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::{Inferencer, RecordPrediction};

pub struct PredictUseCase {
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        Ok(Self { inferencer })
    }

    pub fn predict(&self, data_path: &str) -> Result<Vec<RecordPrediction>> {
        let records = JsonlLoader::new(data_path).load_all()?;
        if records.is_empty() {
            tracing::warn!("No records to predict in '{}'", data_path);
            return Ok(Vec::new());
        }
        tracing::info!(
            "Predicting {} records (up to {} steps each)",
            records.len(),
            self.inferencer.config().structure[0]
        );
        self.inferencer.predict(&records)
    }
}
