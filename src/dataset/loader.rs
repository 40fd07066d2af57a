//! CSV loader for labeled and unlabeled feature tables.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Prefix that marks a column as a model input.
pub const FEATURE_PREFIX: &str = "f";
/// Name of the binary target column.
pub const LABEL_COLUMN: &str = "label";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },
    #[error("{path}: line {line}, column {column}: invalid number {value:?}")]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("{path}: line {line}: label must be 0 or 1, got {value:?}")]
    InvalidLabel {
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("Data must include a label column named \"label\"")]
    MissingLabel,
}

/// Whether the loader should read the `label` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Skip the label column even when present.
    Ignore,
    /// Fail with [`DatasetError::MissingLabel`] when the column is absent.
    Require,
}

/// Feature matrix loaded from a CSV, optionally with binary labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    /// Names of the selected feature columns, in file order.
    pub feature_names: Vec<String>,
    /// Feature matrix, row-major, aligned with `feature_names`.
    pub rows: Vec<Vec<f32>>,
    /// Labels aligned with `rows`, when loaded with [`LabelPolicy::Require`].
    pub labels: Option<Vec<u8>>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Borrow the labels, failing when the table was loaded without them.
    pub fn require_labels(&self) -> Result<&[u8], DatasetError> {
        self.labels.as_deref().ok_or(DatasetError::MissingLabel)
    }

    /// Copy the given rows (and their labels) into a new table.
    pub fn select_rows(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            feature_names: self.feature_names.clone(),
            rows: indices.iter().map(|&idx| self.rows[idx].clone()).collect(),
            labels: self
                .labels
                .as_ref()
                .map(|labels| indices.iter().map(|&idx| labels[idx]).collect()),
        }
    }
}

/// Load a CSV file with a header row.
pub fn load_csv(path: &Path, labels: LabelPolicy) -> Result<FeatureTable, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_records(reader, path, labels)
}

/// Parse CSV text from any reader; `origin` only labels error messages.
pub fn read_csv<R: Read>(
    input: R,
    origin: &Path,
    labels: LabelPolicy,
) -> Result<FeatureTable, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    parse_records(reader, origin, labels)
}

fn parse_records<R: Read>(
    mut reader: csv::Reader<R>,
    origin: &Path,
    policy: LabelPolicy,
) -> Result<FeatureTable, DatasetError> {
    let read_err = |source: csv::Error| DatasetError::Read {
        path: origin.to_path_buf(),
        source,
    };
    let headers = reader.headers().map_err(read_err)?.clone();

    let feature_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with(FEATURE_PREFIX))
        .map(|(idx, name)| (idx, name.to_string()))
        .collect();
    let label_column = match policy {
        LabelPolicy::Ignore => None,
        LabelPolicy::Require => Some(
            headers
                .iter()
                .position(|name| name == LABEL_COLUMN)
                .ok_or(DatasetError::MissingLabel)?,
        ),
    };

    let mut rows = Vec::new();
    let mut labels = label_column.map(|_| Vec::new());
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(read_err)?;
        // Header occupies line 1.
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(idx as u64 + 2);

        let mut row = Vec::with_capacity(feature_columns.len());
        for (col_idx, name) in &feature_columns {
            let cell = record.get(*col_idx).unwrap_or_default();
            let value = cell
                .parse::<f32>()
                .map_err(|_| DatasetError::InvalidNumber {
                    path: origin.to_path_buf(),
                    line,
                    column: name.clone(),
                    value: cell.to_string(),
                })?;
            row.push(value);
        }
        rows.push(row);

        if let (Some(col_idx), Some(labels)) = (label_column, labels.as_mut()) {
            let cell = record.get(col_idx).unwrap_or_default();
            labels.push(parse_label(cell).ok_or_else(|| DatasetError::InvalidLabel {
                path: origin.to_path_buf(),
                line,
                value: cell.to_string(),
            })?);
        }
    }

    tracing::debug!(
        rows = rows.len(),
        features = feature_columns.len(),
        "Loaded {}",
        origin.display()
    );
    Ok(FeatureTable {
        feature_names: feature_columns.into_iter().map(|(_, name)| name).collect(),
        rows,
        labels,
    })
}

fn parse_label(cell: &str) -> Option<u8> {
    let value = cell.parse::<f64>().ok()?;
    if value == 0.0 {
        Some(0)
    } else if value == 1.0 {
        Some(1)
    } else {
        None
    }
}
