// ============================================================
// Layer 5 — Attention Pooling (sequence → vector)
// ============================================================
// Collapses a batch of child sequences into one vector per
// parent:
//
//   h     = encoder(x)                 [parents, seq, d_output]
//   u     = tanh(W h + b)              [parents, seq, d_attention]
//   score = u · context                [parents, seq]
//   α     = softmax(score) over seq    (padding children masked)
//   out   = Σ_seq α h                  [parents, d_output]
//
// The encoder is either a GRU (contextual, order-aware) or a
// dense projection + tanh applied independently per child.
// `context` is the learned attention weight vector.
//
// Reference: Yang et al. (2016) Hierarchical Attention Networks
//            for Document Classification

use burn::{
    module::Param,
    nn::{
        gru::{Gru, GruConfig},
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::softmax, Distribution},
};

/// Score given to padding children before the softmax. Large enough
/// that exp() underflows to zero next to any real score.
const MASKED_SCORE: f32 = -1.0e9;

#[derive(Config, Debug)]
pub struct AttentionPoolingConfig {
    /// Width of each child vector entering the pooling
    pub d_input:     usize,
    /// Width of the pooled parent vector
    pub d_output:    usize,
    /// Size of the attention weight (context) vector
    pub d_attention: usize,
    /// GRU encoder instead of a per-child dense projection
    #[config(default = false)]
    pub recurrent:   bool,
}

impl AttentionPoolingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionPooling<B> {
        let (recurrent, projection) = if self.recurrent {
            (Some(GruConfig::new(self.d_input, self.d_output, true).init(device)), None)
        } else {
            (None, Some(LinearConfig::new(self.d_input, self.d_output).init(device)))
        };
        let attention = LinearConfig::new(self.d_output, self.d_attention).init(device);
        let context   = Param::from_tensor(Tensor::random(
            [self.d_attention],
            Distribution::Uniform(-0.05, 0.05),
            device,
        ));
        AttentionPooling { recurrent, projection, attention, context }
    }
}

#[derive(Module, Debug)]
pub struct AttentionPooling<B: Backend> {
    pub recurrent:  Option<Gru<B>>,
    pub projection: Option<Linear<B>>,
    pub attention:  Linear<B>,
    pub context:    Param<Tensor<B, 1>>,
}

/// Pooled vectors together with the attention distribution that
/// produced them.
#[derive(Debug, Clone)]
pub struct PooledOutput<B: Backend> {
    /// [parents, d_output]
    pub pooled:  Tensor<B, 2>,
    /// [parents, seq], rows sum to 1
    pub weights: Tensor<B, 2>,
}

impl<B: Backend> AttentionPooling<B> {
    /// x: [parents, seq, d_input], mask: [parents, seq] (true = real child)
    /// → [parents, d_output]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
        self.forward_with_weights(x, mask).pooled
    }

    pub fn forward_with_weights(&self, x: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> PooledOutput<B> {
        let [parents, seq, _] = x.dims();

        let h        = self.encode(x);
        let d_output = h.dims()[2];

        let u           = self.attention.forward(h.clone()).tanh();
        let d_attention = u.dims()[2];
        let context     = self.context.val().reshape([1, 1, d_attention]);
        let scores      = (u * context).sum_dim(2).reshape([parents, seq]);
        let scores      = scores.mask_fill(mask.bool_not(), MASKED_SCORE);
        let weights     = softmax(scores, 1);

        let pooled = (h * weights.clone().reshape([parents, seq, 1]))
            .sum_dim(1)
            .reshape([parents, d_output]);

        PooledOutput { pooled, weights }
    }

    /// Sequence-to-sequence encoding of the children before scoring.
    fn encode(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match (&self.recurrent, &self.projection) {
            (Some(gru), _)       => gru.forward(x, None),
            (None, Some(linear)) => linear.forward(x).tanh(),
            (None, None)         => x,
        }
    }
}
