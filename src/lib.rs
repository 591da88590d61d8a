#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use domain::error::ConfigError;
pub use domain::hierarchy::{HierarchyShape, InputKind, InputSpec};
pub use ml::loss::summed_categorical_crossentropy;
pub use ml::model::{build_classifier_with_hierarchical_attention, HanClassifier, HanClassifierConfig};
