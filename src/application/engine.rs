//! Risk engine: Orchestrates one assessment.
//!
//! This service coordinates:
//! - Input validation and encoding
//! - Model inference through the adapter
//! - Guideline tiering
//! - Reconciliation and importance annotation
//!
//! The engine holds no per-request state. One instance, with its loaded
//! classifier, can serve concurrent requests without locking.

use std::sync::{Arc, OnceLock};

use crate::adapters::artifact::ArtifactClassifier;
use crate::application::ModelAdapter;
use crate::config::EngineConfig;
use crate::domain::{
    compose, encode, ClinicalTier, ImportanceTable, PatientInput,
    RawPatientInput, RiskAssessmentReport,
};
use crate::ports::RiskClassifier;
use crate::{EngineError, Result};

static SHARED: OnceLock<RiskEngine<ArtifactClassifier>> = OnceLock::new();

/// Stateless diabetes risk decision engine.
pub struct RiskEngine<C>
where
    C: RiskClassifier,
{
    model: ModelAdapter<C>,
    importance: ImportanceTable,
}

impl<C> RiskEngine<C>
where
    C: RiskClassifier,
{
    /// Create an engine over an already loaded classifier.
    ///
    /// # Errors
    /// Returns `EngineError::ModelUnavailable` if the classifier's feature
    /// order does not match the schema.
    pub fn new(classifier: Arc<C>, importance: ImportanceTable) -> Result<Self> {
        let model = ModelAdapter::new(classifier)?;
        if !model.supports_probabilities() {
            tracing::warn!("Classifier exposes labels only; reports will carry label-only confidence");
        }
        Ok(Self { model, importance })
    }

    /// Assess a raw field map as submitted by a front end.
    ///
    /// # Errors
    /// - `EngineError::Validation` listing every rejected field
    /// - `EngineError::SchemaMismatch` / `EngineError::ModelUnavailable` if
    ///   inference cannot run; no partial report is produced
    pub fn assess(&self, raw: &RawPatientInput) -> Result<RiskAssessmentReport> {
        let input = PatientInput::from_raw(raw).map_err(|e| {
            tracing::debug!("Rejected input: {} violation(s)", e.violations().len());
            EngineError::Validation(e)
        })?;
        self.assess_input(&input)
    }

    /// Assess an already typed patient record.
    ///
    /// # Errors
    /// Same as [`assess`](Self::assess).
    pub fn assess_input(&self, input: &PatientInput) -> Result<RiskAssessmentReport> {
        tracing::debug!("Step 1: Encoding patient input...");
        let vector = encode(input)?;

        tracing::debug!("Step 2: Running model inference...");
        let prediction = self.model.predict(&vector).map_err(|e| {
            match &e {
                EngineError::SchemaMismatch { .. } => {
                    tracing::error!("Assessment aborted on contract violation: {e}");
                }
                _ => tracing::warn!("Assessment unavailable: {e}"),
            }
            e
        })?;

        tracing::debug!("Step 3: Evaluating guideline thresholds...");
        let tier = ClinicalTier::for_patient(input);

        tracing::debug!("Step 4: Composing report...");
        let decision = compose(prediction, tier);
        let report = self.importance.annotate(
            decision,
            input.clone(),
            self.model.fingerprint().map(str::to_string),
        );

        tracing::info!(
            "Assessment complete: combined={}, model={}, tier={} ({}), confidence={:.2}%, discrepancy={:?}",
            report.combined_risk_level,
            report.model_prediction.label,
            report.clinical_tier.tier,
            report.clinical_tier.driving_metric.description(),
            report.confidence * 100.0,
            report.discrepancy
        );

        Ok(report)
    }

    /// The static importance ranking as `(feature_name, score)`, highest
    /// score first.
    #[must_use]
    pub fn importance_table(&self) -> Vec<(&'static str, f64)> {
        self.importance.pairs()
    }

    #[must_use]
    pub fn model(&self) -> &ModelAdapter<C> {
        &self.model
    }
}

impl RiskEngine<ArtifactClassifier> {
    /// Load the classifier artifact and importance table named by `config`.
    ///
    /// All startup checks run here so a misconfigured deployment fails before
    /// serving any request.
    ///
    /// # Errors
    /// - `EngineError::ModelUnavailable` if the artifact is missing, malformed,
    ///   incompatible, or label-only while probabilities are required
    /// - `EngineError::InvalidImportanceTable` if the table fails validation
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        tracing::info!("Initializing risk engine...");

        let classifier = ArtifactClassifier::load(&config.model_path)?;
        if config.require_probabilities && !classifier.supports_probabilities() {
            return Err(EngineError::ModelUnavailable(format!(
                "model at {:?} provides labels only, but probabilities are required",
                config.model_path
            )));
        }

        let importance = match &config.importance_path {
            Some(path) => {
                tracing::info!("Loading importance table from {:?}", path);
                ImportanceTable::from_json_file(path)?
            }
            None => ImportanceTable::bundled()?,
        };

        Self::new(Arc::new(classifier), importance)
    }

    /// Process-wide engine, built from `config` on first use.
    ///
    /// Later calls return the same instance and ignore `config`. A failed
    /// initialization is not cached, so a corrected deployment can retry.
    ///
    /// # Errors
    /// Same as [`from_config`](Self::from_config).
    pub fn shared(config: &EngineConfig) -> Result<&'static Self> {
        if let Some(engine) = SHARED.get() {
            return Ok(engine);
        }
        let engine = Self::from_config(config)?;
        // A concurrent initializer may have won; either instance is equivalent.
        Ok(SHARED.get_or_init(|| engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::model_adapter::tests::StubClassifier;
    use crate::domain::{
        ConfidenceSource, Discrepancy, DrivingMetric, Gender, RiskLabel, RiskLevel, SmokingHistory,
    };
    use serde_json::json;
    use std::path::Path;
    use tempfile::tempdir;

    fn engine(label: RiskLabel, probability: Option<f64>) -> RiskEngine<StubClassifier> {
        RiskEngine::new(
            Arc::new(StubClassifier::new(label, probability)),
            ImportanceTable::bundled().expect("bundled"),
        )
        .expect("Should build engine")
    }

    fn scenario() -> RawPatientInput {
        serde_json::from_value(json!({
            "gender": "Male",
            "age": 45,
            "bmi": 31.0,
            "smoking_history": "former",
            "hba1c": 7.2,
            "glucose": 160,
            "hypertension": "Yes",
            "heart_disease": "No"
        }))
        .expect("object")
    }

    fn bundled_config() -> EngineConfig {
        EngineConfig::default()
            .with_model_path(Path::new(env!("CARGO_MANIFEST_DIR")).join("models/diabetes_model.json"))
    }

    #[test]
    fn test_scenario_high_regardless_of_model() {
        for (label, p) in [(RiskLabel::Low, Some(0.05)), (RiskLabel::High, Some(0.95)), (RiskLabel::Low, None)] {
            let report = engine(label, p).assess(&scenario()).expect("Should assess");
            assert_eq!(report.clinical_tier.tier, RiskLevel::High);
            assert_eq!(report.clinical_tier.driving_metric, DrivingMetric::Hba1c);
            assert_eq!(report.combined_risk_level, RiskLevel::High);
        }
    }

    #[test]
    fn test_disagreement_keeps_both_signals() {
        let report = engine(RiskLabel::Low, Some(0.1)).assess(&scenario()).expect("Should assess");
        assert_eq!(report.model_prediction.label, RiskLabel::Low);
        assert_eq!(report.discrepancy, Discrepancy::GuidelineFlagsHigh);
        assert!(report.signals_disagree());
        assert!((report.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_report_is_complete() {
        let report = engine(RiskLabel::High, None).assess(&scenario()).expect("Should assess");
        assert_eq!(report.confidence_source, ConfidenceSource::LabelOnly);
        assert_eq!(report.feature_importance_ranking.len(), 8);
        assert_eq!(report.input_echo.gender, Gender::Male);
        assert_eq!(report.input_echo.smoking_history, SmokingHistory::Former);
        assert_eq!(report.advice, RiskLevel::High.advice());
        assert_eq!(report.id.len(), 36);
        assert_eq!(report.schema_version, crate::domain::SCHEMA_VERSION);
    }

    #[test]
    fn test_validation_error_surfaces_every_field() {
        let mut raw = scenario();
        raw.insert("smoking_history".into(), json!("unknown"));
        raw.insert("bmi".into(), json!(75.0));
        let err = engine(RiskLabel::Low, Some(0.1)).assess(&raw).unwrap_err();
        match err {
            EngineError::Validation(v) => {
                assert!(v.names_field("smoking_history"));
                assert!(v.names_field("bmi"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_model_failure_yields_no_report() {
        let mut stub = StubClassifier::new(RiskLabel::Low, Some(0.1));
        stub.fail = true;
        let engine = RiskEngine::new(Arc::new(stub), ImportanceTable::bundled().unwrap()).unwrap();
        let err = engine.assess(&scenario()).unwrap_err();
        assert!(matches!(err, EngineError::ModelUnavailable(_)));
        assert!(!err.is_user_correctable());
    }

    #[test]
    fn test_importance_table_sums_to_one() {
        let e = engine(RiskLabel::Low, Some(0.1));
        let table = e.importance_table();
        let sum: f64 = table.iter().map(|(_, score)| score).sum();
        assert!((sum - 1.0).abs() <= 1e-3);
        assert_eq!(table.len(), 8);
        assert_eq!(table[0].0, "hba1c_percent");
    }

    #[test]
    fn test_bundled_model_end_to_end() {
        let engine = RiskEngine::from_config(&bundled_config()).expect("Should load bundled model");
        let report = engine.assess(&scenario()).expect("Should assess");
        assert_eq!(report.combined_risk_level, RiskLevel::High);
        assert_eq!(report.confidence_source, ConfidenceSource::Probability);
        assert!(report.model_fingerprint.is_some());

        let healthy: RawPatientInput = serde_json::from_value(json!({
            "gender": "Female",
            "age": 30,
            "bmi": 22.0,
            "smoking_history": "never",
            "hba1c_percent": 5.0,
            "blood_glucose_mgdl": 90,
            "hypertension": "No",
            "heart_disease": "No"
        }))
        .unwrap();
        let report = engine.assess(&healthy).expect("Should assess");
        assert_eq!(report.model_prediction.label, RiskLabel::Low);
        assert_eq!(report.combined_risk_level, RiskLevel::Low);
        assert!(report.confidence > 0.99);
    }

    #[test]
    fn test_missing_artifact_is_model_unavailable() {
        let temp = tempdir().expect("tempdir");
        let config = EngineConfig::default().with_model_path(temp.path().join("missing.json"));
        assert!(matches!(
            RiskEngine::from_config(&config),
            Err(EngineError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_require_probabilities_refuses_label_only() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("svm.json");
        let svm = json!({
            "kind": "linear_svm",
            "feature_names": crate::domain::FEATURE_NAMES,
            "coefficients": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0],
            "intercept": 0.0,
            "scaler_mean": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.5, 100.0],
            "scaler_scale": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 30.0]
        });
        std::fs::write(&path, svm.to_string()).expect("write");

        let config = EngineConfig::default().with_model_path(&path);
        let engine = RiskEngine::from_config(&config).expect("label-only allowed by default");
        let report = engine.assess(&scenario()).expect("Should assess");
        assert_eq!(report.confidence_source, ConfidenceSource::LabelOnly);

        let strict = config.with_require_probabilities(true);
        assert!(matches!(
            RiskEngine::from_config(&strict),
            Err(EngineError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_invalid_importance_override_fails_fast() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("importance.json");
        std::fs::write(&path, r#"[{"feature": "hba1c_percent", "score": 1.0}]"#).unwrap();
        let config = bundled_config().with_importance_path(&path);
        assert!(matches!(
            RiskEngine::from_config(&config),
            Err(EngineError::InvalidImportanceTable(_))
        ));
    }

    #[test]
    fn test_shared_engine_is_cached() {
        let a = RiskEngine::shared(&bundled_config()).expect("Should init");
        let b = RiskEngine::shared(&EngineConfig::default().with_model_path("/nonexistent"))
            .expect("Should reuse cached engine");
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_shared_engine_serves_concurrent_requests() {
        let config = bundled_config();
        let reports: Vec<RiskAssessmentReport> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        RiskEngine::shared(&config)
                            .expect("Should init")
                            .assess(&scenario())
                            .expect("Should assess")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect()
        });

        assert_eq!(reports.len(), 8);
        let first = &reports[0];
        for report in &reports {
            assert_eq!(report.combined_risk_level, RiskLevel::High);
            assert_eq!(report.model_prediction, first.model_prediction);
            assert_eq!(report.model_fingerprint, first.model_fingerprint);
        }
        let mut ids: Vec<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
