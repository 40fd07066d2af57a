//! Fit a gradient-boosted classifier on a labelled CSV and save it.
//!
//! Rows are split with a seeded shuffle, the model is fit on the training
//! side, and ROC AUC is measured on the held-out side. Nothing is written
//! when loading, splitting or fitting fails.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::TrainSettings;
use crate::dataset::{
    DatasetError, FeatureTable, LabelPolicy, SplitError, load_csv, train_test_split,
};
use crate::ml::gbdt::{FitError, GbdtModel, TrainDataset, TrainOptions, train_gbdt};
use crate::ml::metrics::{ConfusionMatrix, MetricError, accuracy, roc_auc};
use crate::ml::{ModelArtifact, ModelError};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Metric(#[from] MetricError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Inputs for one training run.
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub data_path: PathBuf,
    pub out_path: PathBuf,
    pub settings: TrainSettings,
}

/// Summary of a completed training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub out_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Held-out ROC AUC; `None` when the test split holds a single class.
    pub auc: Option<f64>,
    /// Held-out accuracy at a 0.5 threshold.
    pub accuracy: f32,
}

impl From<&TrainSettings> for TrainOptions {
    fn from(settings: &TrainSettings) -> Self {
        Self {
            n_estimators: settings.n_estimators,
            learning_rate: settings.learning_rate,
            max_depth: settings.max_depth,
            bins: settings.bins,
            ..TrainOptions::default()
        }
    }
}

/// Load, split, fit, score and save.
pub fn train_file(request: &TrainRequest) -> Result<TrainReport, TrainError> {
    let table = load_csv(&request.data_path, LabelPolicy::Require)?;
    let outcome = fit_table(&table, &request.settings)?;
    ModelArtifact::from(outcome.model).save(&request.out_path)?;
    tracing::info!("Saved model to {}", request.out_path.display());
    Ok(TrainReport {
        out_path: request.out_path.clone(),
        train_rows: outcome.train_rows,
        test_rows: outcome.test_rows,
        auc: outcome.auc,
        accuracy: outcome.accuracy,
    })
}

struct FitOutcome {
    model: GbdtModel,
    train_rows: usize,
    test_rows: usize,
    auc: Option<f64>,
    accuracy: f32,
}

fn fit_table(table: &FeatureTable, settings: &TrainSettings) -> Result<FitOutcome, TrainError> {
    table.require_labels()?;
    let split = train_test_split(table.len(), settings.test_fraction, settings.seed)?;
    let train = table.select_rows(&split.train);
    let test = table.select_rows(&split.test);
    tracing::info!(
        train_rows = train.len(),
        test_rows = test.len(),
        features = table.n_features(),
        seed = settings.seed,
        "Split dataset"
    );

    let dataset = TrainDataset {
        feature_names: train.feature_names.clone(),
        y: train.require_labels()?.to_vec(),
        x: train.rows,
    };
    let model = train_gbdt(&dataset, &TrainOptions::from(settings))?;

    let test_labels = test.require_labels()?;
    let scores: Vec<f64> = test.rows.iter().map(|row| model.predict_proba(row)).collect();
    let auc = match roc_auc(test_labels, &scores) {
        Ok(auc) => Some(auc),
        Err(MetricError::Undefined(class)) => {
            tracing::info!("Test split only contains class {class}; skipping AUC");
            None
        }
        Err(err) => return Err(err.into()),
    };
    let predicted: Vec<u8> = scores.iter().map(|&p| u8::from(p >= 0.5)).collect();
    let accuracy = accuracy(&ConfusionMatrix::from_binary(test_labels, &predicted));
    tracing::info!(?auc, accuracy, "Evaluated held-out split");

    Ok(FitOutcome {
        model,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        auc,
        accuracy,
    })
}
