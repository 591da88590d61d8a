use burn::prelude::*;

use crate::domain::{
    embedding::EmbeddingMatrix,
    error::ConfigError,
    hierarchy::{HierarchyShape, InputSpec},
};
use crate::ml::classifier::{
    check_input_rank, ClassifierHead, ClassifierHeadConfig, HiddenActivation, OutputActivation,
};
use crate::ml::hierarchy::{HierarchicalAttention, HierarchicalAttentionConfig, HierarchicalInput};
use crate::ml::loss::{real_step_rows, summed_binary_crossentropy, summed_categorical_crossentropy};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct HanClassifierConfig {
    pub input_shape:                  Vec<usize>,
    pub input_feature_dims:           Vec<usize>,
    pub attention_output_dims:        Vec<usize>,
    pub attention_weight_vector_dims: Vec<usize>,
    pub embedding_rows:               usize,
    pub embedding_dim:                usize,
    pub output_dim:                   usize,
    pub hidden_unit_numbers:          Vec<usize>,
    pub hidden_dropout_rates:         Vec<f64>,
    pub hidden_activations:           Vec<HiddenActivation>,
    #[config(default = false)]
    pub use_recurrent_encoder:        bool,
    #[config(default = "OutputActivation::Softmax")]
    pub output_activation:            OutputActivation,
}

impl HanClassifierConfig {
    pub fn encoder(&self) -> HierarchicalAttentionConfig {
        HierarchicalAttentionConfig::new(
            self.input_shape.clone(),
            self.input_feature_dims.clone(),
            self.attention_output_dims.clone(),
            self.attention_weight_vector_dims.clone(),
            self.embedding_rows,
            self.embedding_dim,
        )
        .with_use_recurrent_encoder(self.use_recurrent_encoder)
    }

    pub fn head(&self) -> ClassifierHeadConfig {
        ClassifierHeadConfig::new(
            self.encoder().output_dim(),
            self.output_dim,
            self.hidden_unit_numbers.clone(),
            self.hidden_dropout_rates.clone(),
            self.hidden_activations.clone(),
        )
        .with_output_activation(self.output_activation)
    }

    /// Check the whole architecture without allocating any tensor.
    pub fn validate(&self) -> Result<HierarchyShape, ConfigError> {
        let shape = self.encoder().validate()?;
        self.head().validate()?;
        check_input_rank(&[shape.batch_size(), shape.time_steps(), self.encoder().output_dim()])?;
        Ok(shape)
    }

    pub fn build_inputs(&self) -> Result<Vec<InputSpec>, ConfigError> {
        self.validate()?.build_inputs(&self.input_feature_dims)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<HanClassifier<B>, ConfigError> {
        self.init_with_embedding(None, device)
    }

    pub fn init_with_embedding<B: Backend>(
        &self,
        initial_embedding: Option<&EmbeddingMatrix>,
        device:            &B::Device,
    ) -> Result<HanClassifier<B>, ConfigError> {
        self.validate()?;
        let encoder = self.encoder().init(initial_embedding, device)?;
        let head    = self.head().init(device)?;
        Ok(HanClassifier { encoder, head })
    }
}

/// Validate `config`, declare its input placeholders and build the
/// trainable model.
pub fn build_classifier_with_hierarchical_attention<B: Backend>(
    config:            &HanClassifierConfig,
    initial_embedding: Option<&EmbeddingMatrix>,
    device:            &B::Device,
) -> Result<(Vec<InputSpec>, HanClassifier<B>), ConfigError> {
    let inputs = config.build_inputs()?;
    let model  = config.init_with_embedding(initial_embedding, device)?;
    tracing::debug!(
        "Built classifier: {} inputs, {} parameters",
        inputs.len(),
        model.num_params()
    );
    Ok((inputs, model))
}

#[derive(Module, Debug)]
pub struct HanClassifier<B: Backend> {
    pub encoder: HierarchicalAttention<B>,
    pub head:    ClassifierHead<B>,
}

impl<B: Backend> HanClassifier<B> {
    /// Per-step class probabilities: [batch * time_step, output_dim]
    pub fn forward(&self, input: HierarchicalInput<B>) -> Tensor<B, 2> {
        self.head.forward(self.encoder.forward(input))
    }

    /// Pooled time-step vectors: [batch, time_step, F]
    pub fn encode(&self, input: HierarchicalInput<B>) -> Tensor<B, 3> {
        self.encoder.forward(input)
    }

    /// Summed loss against dense targets [batch * time_step, output_dim],
    /// plus the probabilities it was computed from. `steps` holds the
    /// real step count of each sample.
    pub fn forward_loss(
        &self,
        input:   HierarchicalInput<B>,
        targets: Tensor<B, 2>,
        steps:   &[usize],
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let probs = self.forward(input);
        let loss  = match self.head.output_activation() {
            OutputActivation::Softmax => summed_categorical_crossentropy(targets, probs.clone()),
            OutputActivation::Sigmoid => {
                let time_steps = self.encoder.hierarchy().time_steps();
                let mask       = real_step_rows(steps, time_steps, &targets.device());
                summed_binary_crossentropy(targets, probs.clone(), mask)
            }
        };
        (loss, probs)
    }
}
