use thiserror::Error;

use super::model::{GbdtModel, MODEL_VERSION, Node, RegressionTree, sigmoid};

/// Clamp applied to the class prior before taking log-odds.
const PRIOR_EPS: f64 = 1e-6;
/// Hessian sums below this produce a zero leaf.
const MIN_HESSIAN_SUM: f64 = 1e-12;

/// Training hyperparameters for tree boosting.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Learning rate applied per round.
    pub learning_rate: f64,
    /// Maximum number of splits on any root-to-leaf path.
    pub max_depth: usize,
    /// Number of bins used for split search.
    pub bins: usize,
    /// Nodes with fewer rows than this become leaves.
    pub min_samples_split: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            bins: 255,
            min_samples_split: 2,
        }
    }
}

/// In-memory dataset used for training.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Feature column names in input order.
    pub feature_names: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Binary labels aligned with `x`.
    pub y: Vec<u8>,
}

#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("Empty training set")]
    Empty,
    #[error("Mismatched training inputs/labels ({rows} rows, {labels} labels)")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("Training data has no feature columns")]
    NoFeatures,
    #[error("Too many feature columns: {0}")]
    TooManyFeatures(usize),
    #[error("Row {row} has {actual} values but expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Row {row}, column {column} is not a finite number")]
    NonFiniteFeature { row: usize, column: String },
    #[error("Label {0} is not binary")]
    NonBinaryLabel(u8),
    #[error("Training labels must contain both classes")]
    SingleClass,
    #[error("Invalid training option: {0}")]
    InvalidOption(String),
}

/// Train a binary classifier with log-loss gradient boosting over regression trees.
pub fn train_gbdt(dataset: &TrainDataset, options: &TrainOptions) -> Result<GbdtModel, FitError> {
    validate_options(options)?;
    validate_dataset(dataset)?;

    let n = dataset.x.len();
    let n_features = dataset.feature_names.len();
    let bins = options.bins;
    let (mins, maxs) = compute_feature_min_max(&dataset.x, n_features);
    let binned = bin_features(&dataset.x, &mins, &maxs, bins);

    let targets: Vec<f64> = dataset.y.iter().map(|&label| f64::from(label)).collect();
    let prior = (targets.iter().sum::<f64>() / n as f64).clamp(PRIOR_EPS, 1.0 - PRIOR_EPS);
    let init_raw = (prior / (1.0 - prior)).ln();
    let mut raw = vec![init_raw; n];

    let grower = TreeGrower {
        x: &dataset.x,
        binned: &binned,
        n_features,
        bins,
        max_depth: options.max_depth,
        min_samples_split: options.min_samples_split,
    };

    let mut trees = Vec::with_capacity(options.n_estimators);
    for _round in 0..options.n_estimators {
        let (residuals, hessians) = compute_residuals(&targets, &raw);
        let tree = grower.grow(&residuals, &hessians);
        for (score, row) in raw.iter_mut().zip(&dataset.x) {
            *score += options.learning_rate * tree.predict(row);
        }
        trees.push(tree);
    }

    tracing::debug!(
        rows = n,
        features = n_features,
        trees = trees.len(),
        "Fitted gradient-boosted trees"
    );
    Ok(GbdtModel {
        model_version: MODEL_VERSION,
        feature_names: dataset.feature_names.clone(),
        learning_rate: options.learning_rate,
        init_raw,
        trees,
    })
}

fn validate_options(options: &TrainOptions) -> Result<(), FitError> {
    if options.n_estimators == 0 {
        return Err(FitError::InvalidOption("n_estimators must be at least 1".into()));
    }
    if !options.learning_rate.is_finite() || options.learning_rate <= 0.0 {
        return Err(FitError::InvalidOption("learning_rate must be > 0".into()));
    }
    if options.max_depth == 0 {
        return Err(FitError::InvalidOption("max_depth must be at least 1".into()));
    }
    if !(2..=256).contains(&options.bins) {
        return Err(FitError::InvalidOption("bins must be between 2 and 256".into()));
    }
    if options.min_samples_split < 2 {
        return Err(FitError::InvalidOption("min_samples_split must be at least 2".into()));
    }
    Ok(())
}

fn validate_dataset(dataset: &TrainDataset) -> Result<(), FitError> {
    if dataset.x.len() != dataset.y.len() {
        return Err(FitError::LengthMismatch {
            rows: dataset.x.len(),
            labels: dataset.y.len(),
        });
    }
    if dataset.x.is_empty() {
        return Err(FitError::Empty);
    }
    let n_features = dataset.feature_names.len();
    if n_features == 0 {
        return Err(FitError::NoFeatures);
    }
    if n_features > usize::from(u16::MAX) + 1 {
        return Err(FitError::TooManyFeatures(n_features));
    }
    for (row_idx, row) in dataset.x.iter().enumerate() {
        if row.len() != n_features {
            return Err(FitError::RaggedRow {
                row: row_idx,
                expected: n_features,
                actual: row.len(),
            });
        }
        if let Some(col) = row.iter().position(|v| !v.is_finite()) {
            return Err(FitError::NonFiniteFeature {
                row: row_idx,
                column: dataset.feature_names[col].clone(),
            });
        }
    }
    let mut seen = [false; 2];
    for &label in &dataset.y {
        match label {
            0 | 1 => seen[label as usize] = true,
            other => return Err(FitError::NonBinaryLabel(other)),
        }
    }
    if !(seen[0] && seen[1]) {
        return Err(FitError::SingleClass);
    }
    Ok(())
}

/// Negative gradients and hessians of the log-loss at the current raw scores.
fn compute_residuals(targets: &[f64], raw: &[f64]) -> (Vec<f64>, Vec<f64>) {
    targets
        .iter()
        .zip(raw)
        .map(|(&target, &score)| {
            let p = sigmoid(score);
            (target - p, p * (1.0 - p))
        })
        .unzip()
}

fn compute_feature_min_max(x: &[Vec<f32>], feature_len: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mins = vec![f32::INFINITY; feature_len];
    let mut maxs = vec![f32::NEG_INFINITY; feature_len];
    for row in x {
        for (j, &v) in row.iter().take(feature_len).enumerate() {
            if v.is_finite() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
    }
    for j in 0..feature_len {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_features(x: &[Vec<f32>], mins: &[f32], maxs: &[f32], bins: usize) -> Vec<Vec<u8>> {
    let top = (bins - 1) as f32;
    x.iter()
        .map(|row| {
            mins.iter()
                .zip(maxs)
                .enumerate()
                .map(|(j, (&min, &max))| {
                    let v = row.get(j).copied().unwrap_or(0.0);
                    let t = ((v - min) / (max - min)).clamp(0.0, 1.0);
                    (t * top).round() as u8
                })
                .collect()
        })
        .collect()
}

struct TreeGrower<'a> {
    x: &'a [Vec<f32>],
    binned: &'a [Vec<u8>],
    n_features: usize,
    bins: usize,
    max_depth: usize,
    min_samples_split: usize,
}

#[derive(Debug, Clone)]
struct BestSplit {
    score: f64,
    feature_index: usize,
    split_bin: usize,
    threshold: f32,
}

impl TreeGrower<'_> {
    fn grow(&self, residuals: &[f64], hessians: &[f64]) -> RegressionTree {
        let mut nodes = Vec::new();
        let rows: Vec<usize> = (0..self.x.len()).collect();
        self.grow_node(rows, 0, residuals, hessians, &mut nodes);
        RegressionTree { nodes }
    }

    fn grow_node(
        &self,
        rows: Vec<usize>,
        depth: usize,
        residuals: &[f64],
        hessians: &[f64],
        nodes: &mut Vec<Node>,
    ) -> u32 {
        let idx = nodes.len();
        nodes.push(Node::Leaf { value: 0.0 });

        let split = if depth < self.max_depth && rows.len() >= self.min_samples_split {
            self.best_split(&rows, residuals)
        } else {
            None
        };
        let node = match split {
            Some(split) => {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&i| self.binned[i][split.feature_index] as usize <= split.split_bin);
                let left = self.grow_node(left_rows, depth + 1, residuals, hessians, nodes);
                let right = self.grow_node(right_rows, depth + 1, residuals, hessians, nodes);
                Node::Split {
                    feature_index: split.feature_index as u16,
                    threshold: split.threshold,
                    left,
                    right,
                }
            }
            None => Node::Leaf {
                value: newton_leaf(&rows, residuals, hessians),
            },
        };
        nodes[idx] = node;
        idx as u32
    }

    fn best_split(&self, rows: &[usize], residuals: &[f64]) -> Option<BestSplit> {
        let mut best: Option<BestSplit> = None;
        for feature_idx in 0..self.n_features {
            let Some(split) = self.best_split_for_feature(rows, residuals, feature_idx) else {
                continue;
            };
            if best.as_ref().is_none_or(|current| split.score < current.score) {
                best = Some(split);
            }
        }
        best
    }

    fn best_split_for_feature(
        &self,
        rows: &[usize],
        residuals: &[f64],
        feature_idx: usize,
    ) -> Option<BestSplit> {
        let bins = self.bins;
        let mut counts = vec![0u32; bins];
        let mut sums = vec![0f64; bins];
        let mut sums_sq = vec![0f64; bins];
        let mut bin_min = vec![f32::INFINITY; bins];
        let mut bin_max = vec![f32::NEG_INFINITY; bins];
        for &i in rows {
            let b = self.binned[i][feature_idx] as usize;
            let r = residuals[i];
            let v = self.x[i][feature_idx];
            counts[b] += 1;
            sums[b] += r;
            sums_sq[b] += r * r;
            bin_min[b] = bin_min[b].min(v);
            bin_max[b] = bin_max[b].max(v);
        }
        let total_count: u32 = counts.iter().sum();
        let total_sum: f64 = sums.iter().sum();
        let total_sum_sq: f64 = sums_sq.iter().sum();

        let mut best_score = f64::INFINITY;
        let mut best_bin = None;

        let mut left_count = 0u32;
        let mut left_sum = 0f64;
        let mut left_sum_sq = 0f64;

        for split_bin in 0..(bins - 1) {
            left_count += counts[split_bin];
            left_sum += sums[split_bin];
            left_sum_sq += sums_sq[split_bin];
            let right_count = total_count - left_count;
            if left_count == 0 || right_count == 0 {
                continue;
            }
            let right_sum = total_sum - left_sum;
            let right_sum_sq = total_sum_sq - left_sum_sq;
            let left_sse = left_sum_sq - (left_sum * left_sum) / left_count as f64;
            let right_sse = right_sum_sq - (right_sum * right_sum) / right_count as f64;
            let score = left_sse + right_sse;
            if score < best_score {
                best_score = score;
                best_bin = Some(split_bin);
            }
        }

        let split_bin = best_bin?;
        let left_max = bin_max[..=split_bin]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let right_min = bin_min[split_bin + 1..]
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min);
        Some(BestSplit {
            score: best_score,
            feature_index: feature_idx,
            split_bin,
            threshold: midpoint_threshold(left_max, right_min),
        })
    }
}

/// Threshold in `[left_max, right_min)` so raw values partition exactly like their bins.
fn midpoint_threshold(left_max: f32, right_min: f32) -> f32 {
    let mid = ((f64::from(left_max) + f64::from(right_min)) / 2.0) as f32;
    if mid >= right_min { left_max } else { mid }
}

/// Newton step for the log-loss: `sum(residual) / sum(p * (1 - p))`.
fn newton_leaf(rows: &[usize], residuals: &[f64], hessians: &[f64]) -> f64 {
    let (num, den) = rows.iter().fold((0.0, 0.0), |(num, den), &i| {
        (num + residuals[i], den + hessians[i])
    });
    if den < MIN_HESSIAN_SUM { 0.0 } else { num / den }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(x: Vec<Vec<f32>>, y: Vec<u8>) -> TrainDataset {
        let width = x.first().map(Vec::len).unwrap_or(0);
        TrainDataset {
            feature_names: (0..width).map(|j| format!("f{j}")).collect(),
            x,
            y,
        }
    }

    fn threshold_dataset() -> TrainDataset {
        let x = (0..20)
            .map(|i| vec![i as f32, ((i * 7) % 5) as f32])
            .collect();
        let y = (0..20).map(|i| u8::from(i >= 10)).collect();
        dataset(x, y)
    }

    fn xor_dataset() -> TrainDataset {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for _ in 0..5 {
            for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
                x.push(vec![a, b]);
                y.push(u8::from(a != b));
            }
        }
        dataset(x, y)
    }

    #[test]
    fn separates_threshold_data() {
        let data = threshold_dataset();
        let model = train_gbdt(&data, &TrainOptions::default()).unwrap();
        assert_eq!(model.trees.len(), 100);
        for (row, &label) in data.x.iter().zip(&data.y) {
            assert_eq!(model.predict_class(row), label);
            let p = model.predict_proba(row);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn learns_interaction_with_depth_two() {
        let data = xor_dataset();
        let options = TrainOptions {
            max_depth: 2,
            ..TrainOptions::default()
        };
        let model = train_gbdt(&data, &options).unwrap();
        for (row, &label) in data.x.iter().zip(&data.y) {
            assert_eq!(model.predict_class(row), label, "row {row:?}");
        }
    }

    #[test]
    fn trees_respect_max_depth() {
        let options = TrainOptions {
            max_depth: 2,
            n_estimators: 10,
            ..TrainOptions::default()
        };
        let model = train_gbdt(&threshold_dataset(), &options).unwrap();
        assert!(model.trees.iter().all(|tree| tree.depth() <= 2));
        model.validate().unwrap();
    }

    #[test]
    fn init_raw_is_prior_log_odds() {
        let data = dataset(
            vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]],
            vec![0, 0, 0, 1],
        );
        let options = TrainOptions {
            n_estimators: 1,
            ..TrainOptions::default()
        };
        let model = train_gbdt(&data, &options).unwrap();
        let expected = (0.25f64 / 0.75).ln();
        assert!((model.init_raw - expected).abs() < 1e-12);
    }

    #[test]
    fn training_is_deterministic() {
        let data = threshold_dataset();
        let first = train_gbdt(&data, &TrainOptions::default()).unwrap();
        let second = train_gbdt(&data, &TrainOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn thresholds_partition_like_bins() {
        assert_eq!(midpoint_threshold(1.0, 3.0), 2.0);
        let next = f32::from_bits(1.0f32.to_bits() + 1);
        let t = midpoint_threshold(1.0, next);
        assert!(t >= 1.0 && t < next);
    }

    #[test]
    fn rejects_single_class() {
        let data = dataset(vec![vec![0.0], vec![1.0]], vec![1, 1]);
        assert_eq!(
            train_gbdt(&data, &TrainOptions::default()).unwrap_err(),
            FitError::SingleClass
        );
    }

    #[test]
    fn rejects_ragged_rows_and_missing_features() {
        let mut data = dataset(vec![vec![0.0, 1.0], vec![1.0]], vec![0, 1]);
        assert!(matches!(
            train_gbdt(&data, &TrainOptions::default()),
            Err(FitError::RaggedRow { row: 1, .. })
        ));
        data.feature_names.clear();
        data.x = vec![vec![], vec![]];
        assert_eq!(
            train_gbdt(&data, &TrainOptions::default()).unwrap_err(),
            FitError::NoFeatures
        );
    }

    #[test]
    fn rejects_non_finite_features() {
        let data = dataset(vec![vec![0.0], vec![f32::NAN]], vec![0, 1]);
        assert!(matches!(
            train_gbdt(&data, &TrainOptions::default()),
            Err(FitError::NonFiniteFeature { row: 1, .. })
        ));
    }

    #[test]
    fn rejects_zero_depth() {
        let options = TrainOptions {
            max_depth: 0,
            ..TrainOptions::default()
        };
        assert!(matches!(
            train_gbdt(&threshold_dataset(), &options),
            Err(FitError::InvalidOption(_))
        ));
    }
}
