//! Model adapter: Enforces the feature-vector contract around a classifier.
//!
//! The adapter checks once, at construction, that the classifier was trained
//! on the canonical feature order, and on every call that the vector has the
//! canonical length and that the classifier's outputs are well formed.

use std::sync::Arc;

use crate::domain::{EncodedFeatureVector, Feature, ModelPrediction, FEATURE_COUNT, SCHEMA_VERSION};
use crate::ports::{ModelError, RiskClassifier};
use crate::{EngineError, Result};

/// Contract wrapper over a shared, read-only classifier.
pub struct ModelAdapter<C>
where
    C: RiskClassifier,
{
    classifier: Arc<C>,
}

impl<C> Clone for ModelAdapter<C>
where
    C: RiskClassifier,
{
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C> ModelAdapter<C>
where
    C: RiskClassifier,
{
    /// Wrap a classifier after checking its declared feature order.
    ///
    /// Names are compared through [`Feature::from_alias`], so an artifact
    /// using the training dataset's column names is accepted as long as the
    /// order matches.
    ///
    /// A classifier that declares a schema version must declare the current
    /// [`SCHEMA_VERSION`]; one that declares none is trusted on its names.
    ///
    /// # Errors
    /// Returns `EngineError::ModelUnavailable` if the classifier declares a
    /// different schema version, number or order of features.
    pub fn new(classifier: Arc<C>) -> Result<Self> {
        if let Some(version) = classifier.schema_version() {
            if version != SCHEMA_VERSION {
                return Err(ModelError::Incompatible(format!(
                    "model trained on schema v{version}, engine uses v{SCHEMA_VERSION}"
                ))
                .into());
            }
        }
        let declared = classifier.feature_names();
        if declared.len() != FEATURE_COUNT {
            return Err(ModelError::Incompatible(format!(
                "model expects {} features, schema has {FEATURE_COUNT}",
                declared.len()
            ))
            .into());
        }
        for (i, (name, expected)) in declared.iter().zip(Feature::ALL).enumerate() {
            if Feature::from_alias(name) != Some(expected) {
                return Err(ModelError::Incompatible(format!(
                    "model feature {i} is '{name}', schema expects '{expected}'"
                ))
                .into());
            }
        }
        Ok(Self { classifier })
    }

    /// Run inference on an encoded vector.
    ///
    /// # Errors
    /// Returns `EngineError::ModelUnavailable` if inference fails or the
    /// classifier returns an invalid probability.
    pub fn predict(&self, vector: &EncodedFeatureVector) -> Result<ModelPrediction> {
        self.predict_features(vector.as_slice())
    }

    /// Run inference on a raw slice that is expected to be in canonical order.
    ///
    /// # Errors
    /// Returns `EngineError::SchemaMismatch` if the slice length is wrong and
    /// `EngineError::ModelUnavailable` if the classifier fails.
    pub fn predict_features(&self, features: &[f64]) -> Result<ModelPrediction> {
        if features.len() != FEATURE_COUNT {
            tracing::error!(
                "Feature vector contract violated: got {} values, expected {}",
                features.len(),
                FEATURE_COUNT
            );
            return Err(EngineError::SchemaMismatch {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }

        let label = self.classifier.predict(features)?;

        if !self.classifier.supports_probabilities() {
            return Ok(ModelPrediction::label_only(label));
        }

        let probability_high = self.classifier.predict_proba(features)?;
        if !(0.0..=1.0).contains(&probability_high) {
            return Err(ModelError::Inference(format!(
                "probability {probability_high} outside [0, 1]"
            ))
            .into());
        }

        Ok(ModelPrediction::with_probability(label, probability_high))
    }

    #[must_use]
    pub fn supports_probabilities(&self) -> bool {
        self.classifier.supports_probabilities()
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.classifier.fingerprint()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{ConfidenceSource, RiskLabel, FEATURE_NAMES};

    /// Classifier returning fixed outputs, for exercising the contract.
    pub(crate) struct StubClassifier {
        pub names: Vec<String>,
        pub label: RiskLabel,
        pub probability: Option<f64>,
        pub fail: bool,
        pub schema_version: Option<u32>,
    }

    impl StubClassifier {
        pub(crate) fn new(label: RiskLabel, probability: Option<f64>) -> Self {
            Self {
                names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
                label,
                probability,
                fail: false,
                schema_version: None,
            }
        }
    }

    impl RiskClassifier for StubClassifier {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, _features: &[f64]) -> std::result::Result<RiskLabel, ModelError> {
            if self.fail {
                return Err(ModelError::Inference("stub failure".into()));
            }
            Ok(self.label)
        }

        fn supports_probabilities(&self) -> bool {
            self.probability.is_some()
        }

        fn predict_proba(&self, _features: &[f64]) -> std::result::Result<f64, ModelError> {
            self.probability.ok_or(ModelError::ProbabilitiesUnsupported)
        }

        fn schema_version(&self) -> Option<u32> {
            self.schema_version
        }
    }

    fn vector() -> EncodedFeatureVector {
        EncodedFeatureVector::from_array([1.0, 45.0, 1.0, 0.0, 2.0, 31.0, 7.2, 160.0])
    }

    #[test]
    fn test_predict_with_probability() {
        let adapter = ModelAdapter::new(Arc::new(StubClassifier::new(RiskLabel::High, Some(0.8))))
            .expect("canonical names");
        let p = adapter.predict(&vector()).expect("Should predict");
        assert_eq!(p.label, RiskLabel::High);
        assert!((p.probability_high - 0.8).abs() < f64::EPSILON);
        assert_eq!(p.confidence_source, ConfidenceSource::Probability);
    }

    #[test]
    fn test_label_only_mode() {
        let adapter = ModelAdapter::new(Arc::new(StubClassifier::new(RiskLabel::Low, None)))
            .expect("canonical names");
        let p = adapter.predict(&vector()).expect("Should predict");
        assert_eq!(p.confidence_source, ConfidenceSource::LabelOnly);
        assert!(p.probability_high.abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrong_length_is_schema_mismatch() {
        let adapter = ModelAdapter::new(Arc::new(StubClassifier::new(RiskLabel::Low, Some(0.1))))
            .expect("canonical names");
        let err = adapter.predict_features(&[1.0; 7]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::SchemaMismatch {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_reordered_model_rejected() {
        let mut stub = StubClassifier::new(RiskLabel::Low, Some(0.1));
        stub.names.swap(0, 1);
        let err = ModelAdapter::new(Arc::new(stub)).err().expect("Should reject");
        assert!(matches!(err, EngineError::ModelUnavailable(_)));
    }

    #[test]
    fn test_schema_version_checked() {
        let mut stub = StubClassifier::new(RiskLabel::Low, Some(0.1));
        stub.schema_version = Some(SCHEMA_VERSION + 1);
        let err = ModelAdapter::new(Arc::new(stub)).err().expect("Should reject");
        assert!(matches!(err, EngineError::ModelUnavailable(_)));

        let mut stub = StubClassifier::new(RiskLabel::Low, Some(0.1));
        stub.schema_version = Some(SCHEMA_VERSION);
        assert!(ModelAdapter::new(Arc::new(stub)).is_ok());
    }

    #[test]
    fn test_dataset_column_names_accepted() {
        let mut stub = StubClassifier::new(RiskLabel::Low, Some(0.1));
        stub.names[6] = "HbA1c_level".into();
        stub.names[7] = "blood_glucose_level".into();
        assert!(ModelAdapter::new(Arc::new(stub)).is_ok());
    }

    #[test]
    fn test_failures_are_model_unavailable() {
        let mut stub = StubClassifier::new(RiskLabel::Low, Some(0.1));
        stub.fail = true;
        let adapter = ModelAdapter::new(Arc::new(stub)).expect("canonical names");
        assert!(matches!(
            adapter.predict(&vector()),
            Err(EngineError::ModelUnavailable(_))
        ));

        let adapter = ModelAdapter::new(Arc::new(StubClassifier::new(RiskLabel::High, Some(1.5))))
            .expect("canonical names");
        assert!(matches!(
            adapter.predict(&vector()),
            Err(EngineError::ModelUnavailable(_))
        ));
    }
}
