/// Prediction surface shared by every loadable model.
pub trait Classifier {
    /// Feature column names seen at fit time, in model input order.
    fn feature_names(&self) -> &[String];

    /// Number of input features per row.
    fn n_features(&self) -> usize {
        self.feature_names().len()
    }

    /// Predicted class for a feature row.
    fn predict(&self, features: &[f32]) -> f64;

    /// Probability view of the model, when it exposes one.
    fn probabilities(&self) -> Option<&dyn ProbabilisticClassifier> {
        None
    }
}

/// Models that can score the positive class.
pub trait ProbabilisticClassifier {
    /// Probability of the positive class, in `[0, 1]`.
    fn predict_proba(&self, features: &[f32]) -> f64;
}
