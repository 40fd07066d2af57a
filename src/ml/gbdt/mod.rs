//! Deterministic gradient-boosted tree classifier.
//!
//! Binary log-loss boosting over depth-limited regression trees:
//! - Histogram split search on min/max-binned features.
//! - Newton-step leaf values.
//! - Reproducible JSON model export/load through [`crate::ml::ModelArtifact`].

mod model;
#[cfg(feature = "training")]
mod train;

pub use model::{GbdtModel, MODEL_VERSION, Node, RegressionTree, sigmoid};
#[cfg(feature = "training")]
pub use train::{FitError, TrainDataset, TrainOptions, train_gbdt};
