//! Score a CSV of feature rows with a saved model.

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::dataset::{DatasetError, FeatureTable, LabelPolicy, load_csv};
use crate::ml::{Classifier, ModelArtifact, ModelError};

/// Number of scores printed by default.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Per-row model output.
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    /// Positive-class probabilities, in `[0, 1]`.
    Probabilities(Vec<f64>),
    /// Raw predictions from models without a probability interface.
    Predictions(Vec<f64>),
}

impl Scores {
    pub fn values(&self) -> &[f64] {
        match self {
            Scores::Probabilities(values) | Scores::Predictions(values) => values,
        }
    }

    /// Short name used when printing.
    pub fn label(&self) -> &'static str {
        match self {
            Scores::Probabilities(_) => "probs",
            Scores::Predictions(_) => "preds",
        }
    }

    /// Leading `rows` scores, or all of them when fewer exist.
    pub fn preview(&self, rows: usize) -> &[f64] {
        let values = self.values();
        &values[..rows.min(values.len())]
    }
}

/// Result of scoring a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub rows: usize,
    pub scores: Scores,
    pub preview_rows: usize,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self
            .scores
            .preview(self.preview_rows)
            .iter()
            .map(|value| format!("{value:.6}"))
            .collect();
        write!(f, "{}: [{}]", self.scores.label(), values.join(", "))
    }
}

/// Load `model_path` and `data_path` and score every row.
pub fn evaluate_file(
    model_path: &Path,
    data_path: &Path,
    preview_rows: usize,
) -> Result<EvaluationReport, EvaluateError> {
    let artifact = ModelArtifact::load(model_path)?;
    let table = load_csv(data_path, LabelPolicy::Ignore)?;
    let scores = score_table(artifact.classifier(), &table)?;
    tracing::debug!(rows = table.len(), kind = scores.label(), "Scored {}", data_path.display());
    Ok(EvaluationReport {
        rows: table.len(),
        scores,
        preview_rows,
    })
}

/// Score each row, using probabilities when the model exposes them.
pub fn score_table(model: &dyn Classifier, table: &FeatureTable) -> Result<Scores, ModelError> {
    if let Some(row) = table.rows.iter().find(|row| row.len() != table.n_features()) {
        return Err(ModelError::FeatureCount {
            expected: table.n_features(),
            actual: row.len(),
        });
    }
    let columns = align_columns(model.feature_names(), &table.feature_names)?;
    let scores = match model.probabilities() {
        Some(proba) => Scores::Probabilities(
            table
                .rows
                .iter()
                .map(|row| proba.predict_proba(&project(row, &columns)))
                .collect(),
        ),
        None => Scores::Predictions(
            table
                .rows
                .iter()
                .map(|row| model.predict(&project(row, &columns)))
                .collect(),
        ),
    };
    Ok(scores)
}

fn project(row: &[f32], columns: &[usize]) -> Vec<f32> {
    columns.iter().map(|&col| row[col]).collect()
}

/// Map model inputs to table columns: by name when every model feature is
/// present, otherwise positionally when the widths agree.
fn align_columns(model_names: &[String], table_names: &[String]) -> Result<Vec<usize>, ModelError> {
    let by_name: Option<Vec<usize>> = model_names
        .iter()
        .map(|name| table_names.iter().position(|candidate| candidate == name))
        .collect();
    match by_name {
        Some(columns) if !model_names.is_empty() => Ok(columns),
        _ if model_names.len() == table_names.len() => {
            if model_names != table_names {
                tracing::warn!(
                    "Feature columns {:?} do not match model features {:?}; using column order",
                    table_names,
                    model_names
                );
            }
            Ok((0..table_names.len()).collect())
        }
        _ => Err(ModelError::FeatureCount {
            expected: model_names.len(),
            actual: table_names.len(),
        }),
    }
}
