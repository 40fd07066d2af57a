use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classifier::Classifier;
use super::gbdt::GbdtModel;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode model {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode model: {0}")]
    Encode(serde_json::Error),
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model: {0}")]
    Invalid(String),
    #[error("Model expects {expected} feature columns but the data has {actual}")]
    FeatureCount { expected: usize, actual: usize },
}

/// Serialized model file, tagged by model kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    GradientBoosting(GbdtModel),
}

impl From<GbdtModel> for ModelArtifact {
    fn from(model: GbdtModel) -> Self {
        Self::GradientBoosting(model)
    }
}

impl ModelArtifact {
    /// Borrow the model behind its prediction interface.
    pub fn classifier(&self) -> &dyn Classifier {
        match self {
            Self::GradientBoosting(model) => model,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::GradientBoosting(model) => model.validate().map_err(ModelError::Invalid),
        }
    }

    /// Load and validate a model file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_slice(&bytes).map_err(|source| ModelError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the model as JSON, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ModelError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(ModelError::Encode)?;
        std::fs::write(path, bytes).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
