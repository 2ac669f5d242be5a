//! Risk classifier port: trait for the pre-trained diabetes model.
//!
//! This trait keeps the model (algorithm, artifact format, training) out of
//! the application logic. Tests inject stub implementations.

use crate::domain::FeatureVector;

/// Errors raised while running a prediction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model produced a non-finite score")]
    NonFinite,

    #[error("Prediction failed: {0}")]
    Failed(String),
}

/// Binary risk classifier.
///
/// Implementations receive the feature vector in [`crate::domain::FEATURE_NAMES`]
/// order and return a label: `0` means no risk, any other value means risk.
pub trait RiskClassifier: Send + Sync {
    /// Short identifier for logs and the UI.
    fn name(&self) -> &str;

    /// Predict the label for one feature vector.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the model cannot produce a label. The
    /// caller reports the error for this request only.
    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError>;
}
