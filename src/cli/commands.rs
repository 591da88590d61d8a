// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `predict` and `summary`.
//
// Per-level lists are comma separated and ordered bottom-up
// (word level first), e.g. for --structure 4,8,20:
//
//   --feature-dims 0,0,3            word, sentence, time_step
//   --attention-output-dims 64,64   word→sentence, sentence→time_step
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::classifier::{HiddenActivation, OutputActivation};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier on a .jsonl corpus
    Train(TrainArgs),

    /// Predict per-step labels with a trained checkpoint
    Predict(PredictArgs),

    /// Validate an architecture and print its inputs and size
    Summary(SummaryArgs),
}

/// Model architecture flags shared by `train` and `summary`.
#[derive(Args, Debug, Clone)]
pub struct ArchitectureArgs {
    /// Per-sample shape: time_step, [document, section,] sentence, word
    #[arg(long, value_delimiter = ',', default_values_t = [4, 8, 20])]
    pub structure: Vec<usize>,

    /// Auxiliary feature width per level, word level first (0 = none)
    #[arg(long, value_delimiter = ',', default_values_t = [0, 0, 0])]
    pub feature_dims: Vec<usize>,

    /// Pooled vector width per pooling step, word level first
    #[arg(long, value_delimiter = ',', default_values_t = [64, 64])]
    pub attention_output_dims: Vec<usize>,

    /// Attention scoring width per pooling step, word level first
    #[arg(long, value_delimiter = ',', default_values_t = [64, 64])]
    pub attention_weight_dims: Vec<usize>,

    /// Hidden layer sizes of the per-step classifier
    #[arg(long, value_delimiter = ',', default_values_t = [64])]
    pub hidden_units: Vec<usize>,

    /// Dropout after each hidden layer, one per --hidden-units entry
    #[arg(long, value_delimiter = ',', default_values_t = [0.2])]
    pub dropout_rates: Vec<f64>,

    /// Number of classes per step
    #[arg(long, default_value_t = 2)]
    pub num_classes: usize,

    /// Vocabulary size, [PAD] and [UNK] included; also the embedding row count
    #[arg(long, default_value_t = 20_000)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 100)]
    pub embedding_dim: usize,

    /// Encode each sequence with a GRU before attention
    #[arg(long)]
    pub recurrent_encoder: bool,

    /// Activation after each hidden layer, one per --hidden-units entry:
    /// tanh, relu, sigmoid or linear
    #[arg(long, value_delimiter = ',', default_values_t = [HiddenActivation::Tanh])]
    pub hidden_activations: Vec<HiddenActivation>,

    /// softmax (single label) or sigmoid (multi-label)
    #[arg(long, default_value = "softmax")]
    pub output_activation: OutputActivation,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// A .jsonl file or a directory of them
    #[arg(long, default_value = "data/corpus.jsonl")]
    pub data: String,

    /// Directory to save checkpoints, tokenizer and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[command(flatten)]
    pub arch: ArchitectureArgs,

    /// Pre-trained word vectors in "word v1 ... vd" text format
    #[arg(long)]
    pub embedding_file: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seeds the train/validation split, shuffling and embedding init
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of records used for training; the rest validates
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// A .jsonl file or a directory of them
    #[arg(long)]
    pub data: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub arch: ArchitectureArgs,
}

impl ArchitectureArgs {
    /// Overlay these flags onto `base`.
    fn apply(self, base: TrainConfig) -> TrainConfig {
        TrainConfig {
            structure:             self.structure,
            feature_dims:          self.feature_dims,
            attention_output_dims: self.attention_output_dims,
            attention_weight_dims: self.attention_weight_dims,
            hidden_units:          self.hidden_units,
            dropout_rates:         self.dropout_rates,
            num_classes:           self.num_classes,
            vocab_size:            self.vocab_size,
            embedding_dim:         self.embedding_dim,
            recurrent_encoder:     self.recurrent_encoder,
            hidden_activations:    self.hidden_activations,
            output_activation:     self.output_activation,
            batch_size:            self.batch_size,
            ..base
        }
    }
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        a.arch.apply(TrainConfig {
            data_path:      a.data,
            checkpoint_dir: a.checkpoint_dir,
            embedding_file: a.embedding_file,
            epochs:         a.epochs,
            lr:             a.lr,
            seed:           a.seed,
            train_fraction: a.train_fraction,
            ..TrainConfig::default()
        })
    }
}

impl From<SummaryArgs> for TrainConfig {
    fn from(a: SummaryArgs) -> Self {
        a.arch.apply(TrainConfig::default())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use crate::cli::commands::Commands;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::classifier::{HiddenActivation, OutputActivation};
    use clap::Parser;

    #[test]
    fn test_train_flags_become_config() {
        let cli = Cli::try_parse_from([
            "han-classifier",
            "train",
            "--data", "corpus",
            "--structure", "3,2,5,10",
            "--feature-dims", "0,0,2,1",
            "--attention-output-dims", "8,8,8",
            "--attention-weight-dims", "4,4,4",
            "--output-activation", "sigmoid",
            "--recurrent-encoder",
            "--seed", "7",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.data_path, "corpus");
        assert_eq!(cfg.structure, vec![3, 2, 5, 10]);
        assert_eq!(cfg.feature_dims, vec![0, 0, 2, 1]);
        assert_eq!(cfg.output_activation, OutputActivation::Sigmoid);
        assert!(cfg.recurrent_encoder);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.hidden_units, vec![64]);
        assert_eq!(cfg.input_shape(), vec![16, 3, 2, 5, 10]);
    }

    #[test]
    fn test_unknown_activation_is_rejected() {
        let res = Cli::try_parse_from(["han-classifier", "summary", "--hidden-activations", "relu,gelu"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_hidden_activations_are_per_layer() {
        let cli = Cli::try_parse_from([
            "han-classifier",
            "summary",
            "--hidden-units", "16,8",
            "--dropout-rates", "0.1,0.0",
            "--hidden-activations", "relu,linear",
        ])
        .unwrap();

        let Commands::Summary(args) = cli.command else { panic!("expected summary") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.hidden_activations, vec![HiddenActivation::Relu, HiddenActivation::Linear]);
        assert!(cfg.to_model_config().validate().is_ok());
    }

    #[test]
    fn test_hidden_activations_must_match_hidden_units() {
        let cli = Cli::try_parse_from([
            "han-classifier",
            "summary",
            "--hidden-units", "16,8",
            "--dropout-rates", "0.1,0.0",
        ])
        .unwrap();

        let Commands::Summary(args) = cli.command else { panic!("expected summary") };
        let cfg: TrainConfig = args.into();
        assert!(cfg.to_model_config().validate().is_err());
    }

    #[test]
    fn test_predict_requires_data() {
        assert!(Cli::try_parse_from(["han-classifier", "predict"]).is_err());
    }
}
