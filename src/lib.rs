//! Model retraining pipeline tools: train, evaluate and deploy a binary
//! validator classifier.
//!
//! The library backs the `validator-train`, `validator-eval` and
//! `validator-deploy` binaries and is reused by benchmarks and tests.

/// Application directory resolution.
pub mod app_dirs;
/// TOML settings shared by the command-line tools.
pub mod config;
/// CSV loading and train/test splitting.
pub mod dataset;
/// Model artifact deployment.
pub mod deploy;
/// Batch scoring of CSV rows.
pub mod evaluate;
/// Tracing subscriber setup.
pub mod logging;
/// Classifiers, model artifacts and metrics.
pub mod ml;
/// End-to-end training run.
#[cfg(feature = "training")]
pub mod training;
