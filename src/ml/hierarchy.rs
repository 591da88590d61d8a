// ============================================================
// Layer 5 — Hierarchical Attention Encoder
// ============================================================
// Turns a batch of nested word sequences into one vector per
// time step by pooling level after level:
//
//   tokens [sentences, words]
//     │ embed                      → [sentences, words, E]
//     │ ⊕ word features            → [sentences, words, E + f0]
//     │ attention pooling 0        → [sentences, out0]
//     │ reshape up                 → [sections, sentences, out0]
//     │ ⊕ sentence features
//     │ attention pooling 1        → [sections, out1]
//     ⋮
//     │ reshape up                 → [batch, time_step, out_top]
//     │ ⊕ time-step features       → [batch, time_step, F]
//
// Every reshape moves the pooled vectors from "one row per
// parent" to "parents grouped under their own parent", which
// is a pure view change: the element count never changes.
//
// Padding (token id 0) is masked at the word level; a parent
// counts as real when any of its children is real, so empty
// sentences and sections are masked at the levels above too.

use burn::{
    module::{Ignored, Param},
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::domain::{
    embedding::EmbeddingMatrix,
    error::{check, ConfigError},
    hierarchy::{validate_hierarchy, HierarchyShape, InputKind, InputSpec},
};
use crate::ml::attention::{AttentionPooling, AttentionPoolingConfig};

/// Token id reserved for padding.
pub const PAD_ID: i64 = 0;

#[derive(Config, Debug)]
pub struct HierarchicalAttentionConfig {
    /// [batch, time_step, ..., word]
    pub input_shape:                  Vec<usize>,
    /// Auxiliary feature width per level, word level first
    pub input_feature_dims:           Vec<usize>,
    /// Pooled vector width per pooling, word → sentence first
    pub attention_output_dims:        Vec<usize>,
    /// Attention context-vector size per pooling
    pub attention_weight_vector_dims: Vec<usize>,
    pub embedding_rows:               usize,
    pub embedding_dim:                usize,
    #[config(default = false)]
    pub use_recurrent_encoder:        bool,
}

impl HierarchicalAttentionConfig {
    /// Check every precondition of the encoder and return the parsed shape.
    pub fn validate(&self) -> Result<HierarchyShape, ConfigError> {
        let shape = validate_hierarchy(
            &self.input_shape,
            &self.input_feature_dims,
            &self.attention_output_dims,
            &self.attention_weight_vector_dims,
        )?;
        check(self.embedding_rows > 0, || ConfigError::ZeroValue { name: "embedding_rows" })?;
        check(self.embedding_dim > 0, || ConfigError::ZeroValue { name: "embedding_dim" })?;
        Ok(shape)
    }

    /// Input placeholders this encoder consumes.
    pub fn build_inputs(&self) -> Result<Vec<InputSpec>, ConfigError> {
        self.validate()?.build_inputs(&self.input_feature_dims)
    }

    /// Width of each time-step vector the encoder produces.
    pub fn output_dim(&self) -> usize {
        self.attention_output_dims.last().copied().unwrap_or(self.embedding_dim)
            + self.input_feature_dims.last().copied().unwrap_or(0)
    }

    pub fn init<B: Backend>(
        &self,
        initial_embedding: Option<&EmbeddingMatrix>,
        device:            &B::Device,
    ) -> Result<HierarchicalAttention<B>, ConfigError> {
        let shape = self.validate()?;

        let mut embedding = EmbeddingConfig::new(self.embedding_rows, self.embedding_dim).init(device);
        if let Some(matrix) = initial_embedding {
            matrix.check_fits(self.embedding_rows, self.embedding_dim)?;
            embedding.weight = Param::from_tensor(Tensor::from_data(
                TensorData::new(matrix.values.clone(), [matrix.rows, matrix.dim]),
                device,
            ));
        }

        let mut d_input  = self.embedding_dim;
        let mut poolings = Vec::with_capacity(shape.num_poolings());
        for level in 0..shape.num_poolings() {
            let d_output = self.attention_output_dims[level];
            poolings.push(
                AttentionPoolingConfig::new(
                    d_input + self.input_feature_dims[level],
                    d_output,
                    self.attention_weight_vector_dims[level],
                )
                .with_recurrent(self.use_recurrent_encoder)
                .init(device),
            );
            tracing::debug!(
                "{} pooling: {} → {} (attention {})",
                shape.level_name(level),
                d_input + self.input_feature_dims[level],
                d_output,
                self.attention_weight_vector_dims[level],
            );
            d_input = d_output;
        }

        Ok(HierarchicalAttention {
            embedding,
            poolings,
            layout: Ignored(LevelLayout { shape }),
        })
    }
}

/// Static geometry the encoder needs at forward time.
#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub shape: HierarchyShape,
}

#[derive(Module, Debug)]
pub struct HierarchicalAttention<B: Backend> {
    pub embedding: Embedding<B>,
    pub poolings:  Vec<AttentionPooling<B>>,
    pub layout:    Ignored<LevelLayout>,
}

/// One batch of encoder input in the flattened runtime layout.
#[derive(Debug, Clone)]
pub struct HierarchicalInput<B: Backend> {
    pub batch_size: usize,
    /// [parents(word), words] token ids, 0 = padding
    pub tokens:     Tensor<B, 2, Int>,
    /// One entry per level, word level first;
    /// Some([parents(L), sequence_len(L), feature_dim(L)]) when the
    /// level has features, None otherwise.
    pub features:   Vec<Option<Tensor<B, 3>>>,
}

impl<B: Backend> HierarchicalInput<B> {
    /// Check every tensor against the placeholder layout of `inputs`.
    pub fn validate(&self, shape: &HierarchyShape, inputs: &[InputSpec]) -> Result<(), ConfigError> {
        check(self.features.len() == inputs.len(), || ConfigError::LengthMismatch {
            name:     "features",
            expected: inputs.len(),
            got:      self.features.len(),
        })?;

        let token_dims = inputs[0].runtime_dims(shape, self.batch_size);
        check(self.tokens.dims().to_vec() == token_dims, || ConfigError::InputShape {
            name:     inputs[0].name.clone(),
            expected: token_dims.clone(),
            got:      self.tokens.dims().to_vec(),
        })?;

        for (spec, feature) in inputs.iter().zip(&self.features) {
            let expected = match spec.kind {
                InputKind::Tokens => {
                    let mut dims = token_dims.clone();
                    dims.push(spec.feature_dim);
                    dims
                }
                InputKind::Features => spec.runtime_dims(shape, self.batch_size),
            };
            let got = feature.as_ref().map(|t| t.dims().to_vec());
            let ok  = match &got {
                None       => spec.feature_dim == 0,
                Some(dims) => spec.feature_dim > 0 && *dims == expected,
            };
            check(ok, || ConfigError::InputShape {
                name:     format!("{}_features", shape.level_name(spec.level)),
                expected: if spec.feature_dim == 0 { Vec::new() } else { expected.clone() },
                got:      got.clone().unwrap_or_default(),
            })?;
        }
        Ok(())
    }
}

impl<B: Backend> HierarchicalAttention<B> {
    /// → [batch, time_step, output_dim]
    pub fn forward(&self, input: HierarchicalInput<B>) -> Tensor<B, 3> {
        self.forward_with_attention(input).0
    }

    /// Also returns the attention weights of every pooling,
    /// word level first, each shaped [parents(L), sequence_len(L)].
    pub fn forward_with_attention(&self, input: HierarchicalInput<B>) -> (Tensor<B, 3>, Vec<Tensor<B, 2>>) {
        let shape = &self.layout.shape;
        let batch = input.batch_size;

        let mut mask     = input.tokens.clone().not_equal_elem(PAD_ID);
        let mut x        = self.embedding.forward(input.tokens);
        let mut features = input.features.into_iter();
        let mut weights  = Vec::with_capacity(self.poolings.len());

        for (level, pooling) in self.poolings.iter().enumerate() {
            if let Some(f) = features.next().flatten() {
                x = Tensor::cat(vec![x, f], 2);
            }
            let out = pooling.forward_with_weights(x, mask.clone());
            weights.push(out.weights);

            let parents = shape.parents(level + 1, batch);
            let seq     = shape.sequence_len(level + 1);
            let width   = out.pooled.dims()[1];
            x    = out.pooled.reshape([parents, seq, width]);
            mask = mask.any_dim(1).reshape([parents, seq]);
        }

        if let Some(f) = features.next().flatten() {
            x = Tensor::cat(vec![x, f], 2);
        }
        (x, weights)
    }

    pub fn hierarchy(&self) -> &HierarchyShape {
        &self.layout.shape
    }
}
