//! Settings shared by the command-line tools, persisted as TOML.
//!
//! Every field has a default, so a missing file or a partial file both yield a
//! complete [`PipelineConfig`]. The defaults reproduce the fixed training
//! recipe (100 estimators, learning rate 0.1, depth 3, 80/20 split, seed 42).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;

/// Default filename used to store the settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The settings file is not valid TOML for [`PipelineConfig`].
    #[error("Failed to parse config {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A value parsed but is outside its accepted range.
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Aggregate settings for all tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub train: TrainSettings,
    #[serde(default)]
    pub evaluate: EvaluateSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Hyperparameters and split controls for the training tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSettings {
    /// Number of boosting rounds (one tree per round).
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Shrinkage applied to each tree's contribution.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Maximum depth of each regression tree.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Histogram bins used for split search.
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Share of rows held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed for the train/test permutation.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            bins: default_bins(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
        }
    }
}

/// Output controls for the evaluation tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateSettings {
    /// Number of leading scores printed.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for EvaluateSettings {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
        }
    }
}

/// Log filter and optional log file destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write a log file per run.
    #[serde(default)]
    pub file: bool,
    /// Directory for log files; the application logs directory when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
            dir: None,
        }
    }
}

impl PipelineConfig {
    /// Reject values the tools cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.train.validate()
    }
}

impl TrainSettings {
    /// Reject hyperparameters outside their usable range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_estimators == 0 {
            return Err(invalid("train.n_estimators", "must be at least 1"));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(invalid("train.learning_rate", "must be > 0"));
        }
        if self.max_depth == 0 {
            return Err(invalid("train.max_depth", "must be at least 1"));
        }
        if !(2..=256).contains(&self.bins) {
            return Err(invalid("train.bins", "must be between 2 and 256"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(invalid("train.test_fraction", "must be in (0, 1)"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// Load settings from `explicit` when given, else from the application directory.
///
/// An explicit path must exist. The implicit file is optional; when it is
/// missing, or no application directory can be resolved, defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let config = match explicit {
        Some(path) => load_from(path)?,
        None => match default_config_path() {
            Some(path) if path.is_file() => load_from(&path)?,
            _ => PipelineConfig::default(),
        },
    };
    config.validate()?;
    Ok(config)
}

/// Parse a settings file without validating it.
pub fn load_from(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Location of the implicit settings file, if an application directory resolves.
pub fn default_config_path() -> Option<PathBuf> {
    app_dirs::app_root_path()
        .ok()
        .map(|root| root.join(CONFIG_FILE_NAME))
}

fn default_n_estimators() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> usize {
    3
}

fn default_bins() -> usize {
    255
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_preview_rows() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}
