//! Tabular inputs for the training and evaluation tools.

pub mod loader;
pub mod split;

pub use loader::{
    DatasetError, FEATURE_PREFIX, FeatureTable, LABEL_COLUMN, LabelPolicy, load_csv, read_csv,
};
pub use split::{SplitError, SplitIndices, train_test_split};
