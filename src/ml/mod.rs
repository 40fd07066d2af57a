//! Machine learning helpers for training and inference.
//!
//! Models are trained by `validator-train`, serialized as a [`ModelArtifact`],
//! and scored through the [`Classifier`] interface by `validator-eval`.

mod artifact;
mod classifier;
pub mod gbdt;
pub mod metrics;

pub use artifact::{ModelArtifact, ModelError};
pub use classifier::{Classifier, ProbabilisticClassifier};
