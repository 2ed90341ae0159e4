//! Classifier port: Trait for the externally supplied risk model.
//!
//! The model is an opaque, pre-trained artifact. The engine only relies on
//! the shape of its inputs and outputs.

use crate::domain::RiskLabel;

/// Error type for classifier operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not readable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model artifact malformed: {0}")]
    Format(String),

    #[error("Model artifact incompatible: {0}")]
    Incompatible(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model does not expose class probabilities")]
    ProbabilitiesUnsupported,
}

/// Trait for a pre-trained binary diabetes classifier.
///
/// Implementations must be safe for concurrent read-only use: the engine
/// shares one loaded instance across all requests and never mutates it.
pub trait RiskClassifier: Send + Sync {
    /// Feature names in the order the model was trained on.
    fn feature_names(&self) -> &[String];

    /// Predict the risk label for one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError::Inference` if the model cannot score the input.
    fn predict(&self, features: &[f64]) -> Result<RiskLabel, ModelError>;

    /// Whether [`predict_proba`](Self::predict_proba) is available.
    fn supports_probabilities(&self) -> bool;

    /// Probability of the high-risk class.
    ///
    /// # Errors
    /// Returns `ModelError::ProbabilitiesUnsupported` for label-only models.
    fn predict_proba(&self, _features: &[f64]) -> Result<f64, ModelError> {
        Err(ModelError::ProbabilitiesUnsupported)
    }

    /// Content fingerprint of the loaded artifact, if known.
    fn fingerprint(&self) -> Option<&str> {
        None
    }

    /// Feature schema version the model was trained against, if declared.
    fn schema_version(&self) -> Option<u32> {
        None
    }
}
