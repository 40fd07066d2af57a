use serde::{Deserialize, Serialize};

use crate::ml::classifier::{Classifier, ProbabilisticClassifier};

/// Current model format version.
pub const MODEL_VERSION: i64 = 1;

/// Node of a regression tree stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// Internal node: rows with `feature <= threshold` go left.
    Split {
        feature_index: u16,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// Terminal node carrying the raw-score contribution.
    Leaf { value: f64 },
}

/// Depth-limited regression tree used as the weak learner.
///
/// The root lives at index 0 and every child index is greater than its
/// parent's, so traversal always terminates on a validated tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

impl RegressionTree {
    /// Single-leaf tree.
    pub fn leaf(value: f64) -> Self {
        Self {
            nodes: vec![Node::Leaf { value }],
        }
    }

    /// Predict the tree value for a feature vector.
    pub fn predict(&self, features: &[f32]) -> f64 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature_index as usize)
                        .copied()
                        .unwrap_or(0.0);
                    let next = if value <= *threshold { *left } else { *right };
                    idx = next as usize;
                }
                Some(Node::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }

    /// Longest root-to-leaf path, counted in splits.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left as usize).max(walk(nodes, *right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature_index as usize >= n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature_index} but model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [*left as usize, *right as usize] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child index {child}"));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("node {idx} has a non-finite leaf value"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Gradient-boosted tree model for binary classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    /// Model format version.
    pub model_version: i64,
    /// Feature column names in input order.
    pub feature_names: Vec<String>,
    /// Learning rate applied to each tree prediction.
    pub learning_rate: f64,
    /// Log-odds of the positive class before boosting.
    pub init_raw: f64,
    /// One tree per boosting round.
    pub trees: Vec<RegressionTree>,
}

impl GbdtModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {MODEL_VERSION})",
                self.model_version
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("learning_rate must be > 0".to_string());
        }
        if !self.init_raw.is_finite() {
            return Err("init_raw must be finite".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len())
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Predict the raw log-odds for a feature vector.
    pub fn predict_raw(&self, features: &[f32]) -> f64 {
        self.trees.iter().fold(self.init_raw, |raw, tree| {
            raw + self.learning_rate * tree.predict(features)
        })
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, features: &[f32]) -> f64 {
        sigmoid(self.predict_raw(features))
    }

    /// Predicted class (0 or 1) at a 0.5 threshold.
    pub fn predict_class(&self, features: &[f32]) -> u8 {
        u8::from(self.predict_proba(features) >= 0.5)
    }
}

impl Classifier for GbdtModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &[f32]) -> f64 {
        f64::from(self.predict_class(features))
    }

    fn probabilities(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for GbdtModel {
    fn predict_proba(&self, features: &[f32]) -> f64 {
        GbdtModel::predict_proba(self, features)
    }
}

/// Numerically-stable logistic function.
pub fn sigmoid(raw: f64) -> f64 {
    if raw >= 0.0 {
        1.0 / (1.0 + (-raw).exp())
    } else {
        let e = raw.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_tree() -> RegressionTree {
        RegressionTree {
            nodes: vec![
                Node::Split {
                    feature_index: 0,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: -1.0 },
                Node::Leaf { value: 2.0 },
            ],
        }
    }

    fn model(trees: Vec<RegressionTree>) -> GbdtModel {
        GbdtModel {
            model_version: MODEL_VERSION,
            feature_names: vec!["f0".into(), "f1".into()],
            learning_rate: 1.0,
            init_raw: 0.0,
            trees,
        }
    }

    #[test]
    fn tree_predict_branches() {
        let tree = split_tree();
        assert_eq!(tree.predict(&[0.0]), -1.0);
        assert_eq!(tree.predict(&[0.5]), -1.0);
        assert_eq!(tree.predict(&[0.6]), 2.0);
        assert_eq!(tree.depth(), 1);
        assert_eq!(RegressionTree::leaf(3.0).depth(), 0);
    }

    #[test]
    fn model_sums_scaled_trees() {
        let mut model = model(vec![split_tree(), RegressionTree::leaf(0.5)]);
        model.learning_rate = 0.5;
        model.init_raw = 1.0;
        assert!((model.predict_raw(&[0.0, 0.0]) - 0.75).abs() < 1e-12);
        assert!((model.predict_raw(&[1.0, 0.0]) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn model_predicts_class_from_probability() {
        let model = model(vec![split_tree()]);
        assert_eq!(model.predict_class(&[0.0, 0.0]), 0);
        assert_eq!(model.predict_class(&[1.0, 0.0]), 1);
        let p = model.predict_proba(&[1.0, 0.0]);
        assert!(p > 0.5 && p < 1.0);
        assert_eq!(Classifier::predict(&model, &[1.0, 0.0]), 1.0);
        assert!(model.probabilities().is_some());
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn validate_rejects_backward_child_links() {
        let tree = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature_index: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                Node::Leaf { value: 0.0 },
            ],
        };
        let err = model(vec![tree]).validate().unwrap_err();
        assert!(err.contains("invalid child index 0"), "{err}");
    }

    #[test]
    fn validate_rejects_unknown_feature() {
        let tree = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature_index: 5,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: 0.0 },
                Node::Leaf { value: 0.0 },
            ],
        };
        assert!(model(vec![tree]).validate().is_err());
    }
}
