// ============================================================
// Layer 5 — Per-Time-Step Classifier Head
// ============================================================
// A multilayer perceptron shared across time steps:
//
//   [batch, time_step, F]
//     │ for each hidden layer: dense → its activation → dropout
//     │ dense → output_dim
//     │ flatten time into batch        → [batch * time_step, C]
//     │ softmax (or sigmoid)
//
// burn's Linear already acts on the last axis of any rank, so
// applying it to a rank-3 tensor shares the weights across the
// time axis with no extra wrapper.

use std::{fmt, str::FromStr};

use burn::{
    module::Ignored,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid, softmax},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::{check, check_len, check_non_zero, ConfigError};

/// Non-linearity applied after each hidden dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenActivation {
    #[default]
    Tanh,
    Relu,
    Sigmoid,
    Linear,
}

/// Output normalisation. Softmax for single-label, sigmoid for
/// independent (multi-label) classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputActivation {
    #[default]
    Softmax,
    Sigmoid,
}

impl HiddenActivation {
    fn apply<B: Backend, const D: usize>(self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            HiddenActivation::Tanh    => x.tanh(),
            HiddenActivation::Relu    => relu(x),
            HiddenActivation::Sigmoid => sigmoid(x),
            HiddenActivation::Linear  => x,
        }
    }
}

impl fmt::Display for HiddenActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HiddenActivation::Tanh    => "tanh",
            HiddenActivation::Relu    => "relu",
            HiddenActivation::Sigmoid => "sigmoid",
            HiddenActivation::Linear  => "linear",
        };
        f.write_str(name)
    }
}

impl FromStr for HiddenActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tanh"    => Ok(HiddenActivation::Tanh),
            "relu"    => Ok(HiddenActivation::Relu),
            "sigmoid" => Ok(HiddenActivation::Sigmoid),
            "linear"  => Ok(HiddenActivation::Linear),
            other     => Err(format!("unknown hidden activation '{other}' (tanh, relu, sigmoid, linear)")),
        }
    }
}

impl FromStr for OutputActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "softmax" => Ok(OutputActivation::Softmax),
            "sigmoid" => Ok(OutputActivation::Sigmoid),
            other     => Err(format!("unknown output activation '{other}' (softmax, sigmoid)")),
        }
    }
}

/// Fail unless `dims` describes a rank-3 [batch, time_step, features] tensor.
pub fn check_input_rank(dims: &[usize]) -> Result<(), ConfigError> {
    check(dims.len() == 3, || ConfigError::ClassifierInputRank { rank: dims.len() })
}

#[derive(Config, Debug)]
pub struct ClassifierHeadConfig {
    pub d_input:              usize,
    pub output_dim:           usize,
    pub hidden_unit_numbers:  Vec<usize>,
    /// One rate per hidden layer
    pub hidden_dropout_rates: Vec<f64>,
    /// One activation per hidden layer
    pub hidden_activations:   Vec<HiddenActivation>,
    #[config(default = "OutputActivation::Softmax")]
    pub output_activation:    OutputActivation,
}

impl ClassifierHeadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(self.d_input > 0, || ConfigError::ZeroValue { name: "classifier input width" })?;
        check(self.output_dim > 0, || ConfigError::ZeroValue { name: "output_dim" })?;
        check_len(
            "hidden_dropout_rates",
            &self.hidden_dropout_rates,
            self.hidden_unit_numbers.len(),
        )?;
        check_len(
            "hidden_activations",
            &self.hidden_activations,
            self.hidden_unit_numbers.len(),
        )?;
        check_non_zero("hidden_unit_numbers", &self.hidden_unit_numbers)?;
        for (index, &rate) in self.hidden_dropout_rates.iter().enumerate() {
            check((0.0..1.0).contains(&rate), || ConfigError::InvalidDropout { index, rate })?;
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ClassifierHead<B>, ConfigError> {
        self.validate()?;

        let mut d_input = self.d_input;
        let hidden = self
            .hidden_unit_numbers
            .iter()
            .zip(&self.hidden_dropout_rates)
            .zip(&self.hidden_activations)
            .map(|((&units, &rate), &activation)| {
                let layer = HiddenLayer {
                    linear:     LinearConfig::new(d_input, units).init(device),
                    dropout:    DropoutConfig::new(rate).init(),
                    activation: Ignored(activation),
                };
                d_input = units;
                layer
            })
            .collect();

        Ok(ClassifierHead {
            hidden,
            output: LinearConfig::new(d_input, self.output_dim).init(device),
            output_activation: Ignored(self.output_activation),
        })
    }
}

#[derive(Module, Debug)]
pub struct HiddenLayer<B: Backend> {
    pub linear:     Linear<B>,
    pub dropout:    Dropout,
    pub activation: Ignored<HiddenActivation>,
}

impl<B: Backend> HiddenLayer<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.dropout.forward(self.activation.apply(self.linear.forward(x)))
    }
}

#[derive(Module, Debug)]
pub struct ClassifierHead<B: Backend> {
    pub hidden:            Vec<HiddenLayer<B>>,
    pub output:            Linear<B>,
    pub output_activation: Ignored<OutputActivation>,
}

impl<B: Backend> ClassifierHead<B> {
    /// x: [batch, time_step, F] → class probabilities [batch * time_step, C]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let logits = self.forward_logits(x);
        match self.output_activation() {
            OutputActivation::Softmax => softmax(logits, 1),
            OutputActivation::Sigmoid => sigmoid(logits),
        }
    }

    /// Pre-activation scores, already flattened to [batch * time_step, C].
    pub fn forward_logits(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, steps, _] = x.dims();

        let x       = self.hidden.iter().fold(x, |x, layer| layer.forward(x));
        let logits  = self.output.forward(x);
        let classes = logits.dims()[2];
        logits.reshape([batch * steps, classes])
    }

    pub fn output_activation(&self) -> OutputActivation {
        *self.output_activation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_output_is_flattened_per_step_distribution() {
        let device = Default::default();
        let head   = ClassifierHeadConfig::new(6, 4, vec![8, 5], vec![0.2, 0.0], vec![HiddenActivation::Relu, HiddenActivation::Tanh])
            .init::<TestBackend>(&device)
            .unwrap();

        let x   = Tensor::<TestBackend, 3>::random([2, 3, 6], Distribution::Default, &device);
        let out = head.forward(x);
        assert_eq!(out.dims(), [2 * 3, 4]);

        let sums: Vec<f32> = out.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_no_hidden_layers() {
        let device = Default::default();
        let head   = ClassifierHeadConfig::new(6, 3, vec![], vec![], vec![])
            .with_output_activation(OutputActivation::Sigmoid)
            .init::<TestBackend>(&device)
            .unwrap();
        let x = Tensor::<TestBackend, 3>::random([1, 4, 6], Distribution::Default, &device);
        assert_eq!(head.forward(x).dims(), [4, 3]);
    }

    #[test]
    fn test_mismatched_dropout_rates_fail() {
        let device = Default::default();
        let result = ClassifierHeadConfig::new(6, 4, vec![8, 5], vec![0.2], vec![HiddenActivation::Tanh; 2])
            .init::<TestBackend>(&device);
        assert!(matches!(
            result,
            Err(ConfigError::LengthMismatch { name: "hidden_dropout_rates", expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_mismatched_activations_fail() {
        let cfg = ClassifierHeadConfig::new(6, 4, vec![8, 5], vec![0.2, 0.2], vec![HiddenActivation::Relu]);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::LengthMismatch { name: "hidden_activations", expected: 2, got: 1 })
        );
    }

    #[test]
    fn test_each_layer_keeps_its_activation() {
        let device = Default::default();
        let head   = ClassifierHeadConfig::new(
            4,
            2,
            vec![3, 3],
            vec![0.0, 0.0],
            vec![HiddenActivation::Relu, HiddenActivation::Linear],
        )
        .init::<TestBackend>(&device)
        .unwrap();
        assert_eq!(*head.hidden[0].activation, HiddenActivation::Relu);
        assert_eq!(*head.hidden[1].activation, HiddenActivation::Linear);

        // relu output never goes negative
        let x   = Tensor::<TestBackend, 3>::random([1, 5, 4], Distribution::Default, &device).neg();
        let out = head.hidden[0].forward(x);
        let min: f32 = out.min().into_scalar();
        assert!(min >= 0.0);
    }

    #[test]
    fn test_invalid_dropout_rate_fails() {
        let cfg = ClassifierHeadConfig::new(6, 4, vec![8], vec![1.0], vec![HiddenActivation::Tanh]);
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidDropout { index: 0, .. })));
    }

    #[test]
    fn test_input_rank_check() {
        assert!(check_input_rank(&[2, 3, 6]).is_ok());
        assert_eq!(
            check_input_rank(&[6, 6]),
            Err(ConfigError::ClassifierInputRank { rank: 2 })
        );
        assert!(check_input_rank(&[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_activation_parsing() {
        assert_eq!("ReLU".parse::<HiddenActivation>(), Ok(HiddenActivation::Relu));
        assert_eq!("softmax".parse::<OutputActivation>(), Ok(OutputActivation::Softmax));
        assert!("gelu".parse::<HiddenActivation>().is_err());
        assert_eq!(HiddenActivation::Sigmoid.to_string().parse::<HiddenActivation>(), Ok(HiddenActivation::Sigmoid));
    }
}
