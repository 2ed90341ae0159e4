//! Artifact adapter: Implementation of RiskClassifier over an exported linear model.
//!
//! The training pipeline exports the fitted scaler and model parameters as
//! JSON. Two model kinds are understood:
//!
//! - `logistic`: logistic regression, optionally followed by an isotonic
//!   calibration curve. Exposes class probabilities.
//! - `linear_svm`: linear SVM. Hard labels only, so assessments made with it
//!   are flagged as label-only.
//!
//! Only the shape of the artifact is checked here (array lengths, finite
//! values, positive scales, monotone calibration). Feature order against the
//! canonical schema is checked by the model adapter at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::RiskLabel;
use crate::ports::{ModelError, RiskClassifier};

/// File names tried, in order, when the configured path is a directory.
const CANDIDATE_FILES: [&str; 2] = ["diabetes_model.json", "model.json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic,
    LinearSvm,
}

/// Piecewise-linear isotonic calibration curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicCalibration {
    /// Raw probability breakpoints, strictly increasing
    pub x: Vec<f64>,
    /// Calibrated probability at each breakpoint, non-decreasing
    pub y: Vec<f64>,
}

impl IsotonicCalibration {
    fn validate(&self) -> Result<(), ModelError> {
        if self.x.len() < 2 || self.x.len() != self.y.len() {
            return Err(ModelError::Format(
                "calibration needs at least two points and equal x/y lengths".into(),
            ));
        }
        if self.x.iter().chain(&self.y).any(|v| !v.is_finite()) {
            return Err(ModelError::Format("calibration contains non-finite values".into()));
        }
        if self.x.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ModelError::Format(
                "calibration breakpoints must be strictly increasing".into(),
            ));
        }
        if self.y.windows(2).any(|w| w[0] > w[1]) || self.y.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(ModelError::Format(
                "calibrated values must be non-decreasing within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Map a raw probability through the curve, clamping outside the breakpoints.
    ///
    /// # Errors
    /// Returns `ModelError::Inference` for a non-finite probability.
    pub fn apply(&self, p: f64) -> Result<f64, ModelError> {
        if !p.is_finite() {
            return Err(ModelError::Inference(format!(
                "cannot calibrate non-finite probability {p}"
            )));
        }
        let (Some(&first), Some(&last)) = (self.x.first(), self.x.last()) else {
            return Err(ModelError::Format("empty calibration curve".into()));
        };
        if p <= first {
            return Ok(self.y[0]);
        }
        if p >= last {
            return Ok(self.y[self.y.len() - 1]);
        }
        // p is strictly inside the breakpoints, so partition_point is at least 1.
        let i = self.x.partition_point(|&x| x <= p).saturating_sub(1);
        let (x0, x1, y0, y1) = (self.x[i], self.x[i + 1], self.y[i], self.y[i + 1]);
        Ok(y0 + (p - x0) * (y1 - y0) / (x1 - x0))
    }
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedModel {
    pub kind: ModelKind,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    #[serde(default)]
    pub calibration: Option<IsotonicCalibration>,
    /// Probability cut-off for the high label (logistic only, default 0.5)
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Feature schema version the model was trained against, if recorded
    #[serde(default)]
    pub schema_version: Option<u32>,
}

impl ExportedModel {
    fn validate(&self) -> Result<(), ModelError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(ModelError::Format("model declares no features".into()));
        }
        if self.coefficients.len() != n || self.scaler_mean.len() != n || self.scaler_scale.len() != n {
            return Err(ModelError::Format(
                "Model parameter lengths do not match feature_names length".into(),
            ));
        }
        let all_finite = self
            .coefficients
            .iter()
            .chain(&self.scaler_mean)
            .chain(&self.scaler_scale)
            .chain(std::iter::once(&self.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ModelError::Format("model contains non-finite parameters".into()));
        }
        if self.scaler_scale.iter().any(|s| *s <= 0.0) {
            return Err(ModelError::Format("scaler_scale entries must be > 0".into()));
        }
        if let Some(t) = self.threshold {
            if !(t > 0.0 && t < 1.0) {
                return Err(ModelError::Format(format!("threshold {t} must lie in (0, 1)")));
            }
        }
        match self.kind {
            ModelKind::Logistic => {
                if let Some(c) = &self.calibration {
                    c.validate()?;
                }
            }
            ModelKind::LinearSvm => {
                if self.calibration.is_some() || self.threshold.is_some() {
                    return Err(ModelError::Format(
                        "linear_svm artifacts carry no calibration or threshold".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Signed distance from the decision boundary on standardized features.
    fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        let n = self.feature_names.len();
        if features.len() != n {
            return Err(ModelError::Inference(format!(
                "Feature count mismatch: got {}, expected {}",
                features.len(),
                n
            )));
        }
        if features.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::Inference("non-finite feature value".into()));
        }

        let z = features
            .iter()
            .zip(&self.coefficients)
            .zip(self.scaler_mean.iter().zip(&self.scaler_scale))
            .map(|((x, w), (mean, scale))| w * (x - mean) / scale)
            .sum::<f64>()
            + self.intercept;
        if !z.is_finite() {
            return Err(ModelError::Inference(format!(
                "decision value {z} is not finite; artifact parameters overflow"
            )));
        }
        Ok(z)
    }

    fn probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        let raw = sigmoid(self.decision_function(features)?);
        match &self.calibration {
            Some(c) => c.apply(raw),
            None => Ok(raw),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Classifier backed by an exported model artifact.
///
/// Immutable after loading, so a single instance can be shared by all
/// requests.
#[derive(Debug, Clone)]
pub struct ArtifactClassifier {
    model: ExportedModel,
    fingerprint: String,
}

impl ArtifactClassifier {
    /// Load an artifact from a file, or from a directory containing
    /// `diabetes_model.json` or `model.json`.
    ///
    /// # Errors
    /// Returns `ModelError::Io` if no artifact can be read and
    /// `ModelError::Format` if its content is malformed.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model_path = if path.is_dir() {
            CANDIDATE_FILES
                .iter()
                .map(|name| path.join(name))
                .find(|p| p.exists())
                .ok_or_else(|| {
                    ModelError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!(
                            "No model JSON found in {path:?} (expected {})",
                            CANDIDATE_FILES.join(" or ")
                        ),
                    ))
                })?
        } else {
            path.to_path_buf()
        };

        let bytes = std::fs::read(&model_path)?;
        let classifier = Self::from_json_bytes(&bytes)?;

        tracing::info!(
            "Loaded {:?} model from {:?} (n_features={}, fingerprint={})",
            classifier.model.kind,
            model_path,
            classifier.model.feature_names.len(),
            &classifier.fingerprint[..12]
        );

        Ok(classifier)
    }

    /// Parse an artifact already held in memory.
    ///
    /// # Errors
    /// Returns `ModelError::Format` if the JSON is malformed or inconsistent.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: ExportedModel =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Format(e.to_string()))?;
        model.validate()?;
        Ok(Self {
            model,
            fingerprint: sha256_hex_bytes(bytes),
        })
    }

    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.model.kind
    }

    fn threshold(&self) -> f64 {
        self.model.threshold.unwrap_or(0.5)
    }
}

impl RiskClassifier for ArtifactClassifier {
    fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    fn predict(&self, features: &[f64]) -> Result<RiskLabel, ModelError> {
        let high = match self.model.kind {
            ModelKind::Logistic => self.model.probability(features)? >= self.threshold(),
            ModelKind::LinearSvm => self.model.decision_function(features)? > 0.0,
        };
        Ok(if high { RiskLabel::High } else { RiskLabel::Low })
    }

    fn supports_probabilities(&self) -> bool {
        self.model.kind == ModelKind::Logistic
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        match self.model.kind {
            ModelKind::Logistic => self.model.probability(features),
            ModelKind::LinearSvm => Err(ModelError::ProbabilitiesUnsupported),
        }
    }

    fn fingerprint(&self) -> Option<&str> {
        Some(&self.fingerprint)
    }

    fn schema_version(&self) -> Option<u32> {
        self.model.schema_version
    }
}
