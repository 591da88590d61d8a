// ============================================================
// Layer 2 — Summary Use Case
// ============================================================
// Validates an architecture and describes it without training:
// the input placeholders the model expects, the encoder output
// width, and the trainable parameter count. The model is built
// on the CPU backend, so no GPU is needed.

use anyhow::Result;
use std::fmt;

use crate::application::train_use_case::TrainConfig;
use crate::domain::hierarchy::InputSpec;
use crate::ml::model::build_classifier_with_hierarchical_attention;

type SummaryBackend = burn::backend::NdArray<f32>;

#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub inputs:        Vec<InputSpec>,
    pub level_names:   Vec<String>,
    pub encoder_width: usize,
    pub output_dim:    usize,
    pub num_params:    usize,
}

pub fn summarize(cfg: &TrainConfig) -> Result<ModelSummary> {
    let model_cfg = cfg.to_model_config();
    let device    = Default::default();
    let (inputs, model) =
        build_classifier_with_hierarchical_attention::<SummaryBackend>(&model_cfg, None, &device)?;

    let shape = model.encoder.hierarchy();
    Ok(ModelSummary {
        inputs,
        level_names:   (0..shape.num_levels()).map(|l| shape.level_name(l)).collect(),
        encoder_width: model_cfg.encoder().output_dim(),
        output_dim:    cfg.num_classes,
        num_params:    burn::module::Module::num_params(&model),
    })
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Levels (bottom-up): {}", self.level_names.join(" → "))?;
        writeln!(f, "Inputs:")?;
        for input in &self.inputs {
            writeln!(f, "  {input}")?;
        }
        writeln!(f, "Encoder output width: {}", self.encoder_width)?;
        writeln!(f, "Classes per step:     {}", self.output_dim)?;
        write!(f, "Trainable parameters: {}", self.num_params)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_default_architecture() {
        let cfg     = TrainConfig { vocab_size: 50, embedding_dim: 8, ..TrainConfig::default() };
        let summary = summarize(&cfg).unwrap();

        assert_eq!(summary.inputs.len(), cfg.structure.len());
        assert_eq!(summary.level_names, vec!["word", "sentence", "time_step"]);
        assert_eq!(summary.encoder_width, 64);
        assert!(summary.num_params > 50 * 8);
        assert!(summary.to_string().contains("Trainable parameters"));
    }

    #[test]
    fn test_summary_rejects_bad_architecture() {
        let cfg = TrainConfig { feature_dims: vec![0], ..TrainConfig::default() };
        let err = summarize(&cfg).unwrap_err();
        assert!(err.to_string().contains("input_feature_dims"));
    }
}
