//! Assessment result types.
//!
//! Represents the model output, the reconciled decision and the final
//! report returned to the caller.

use serde::{Deserialize, Serialize};

use super::clinical::ClinicalTier;
use super::importance::FeatureImportance;
use super::patient::PatientInput;
use super::schema::SCHEMA_VERSION;

/// Shown alongside every result.
pub const DISCLAIMER: &str =
    "This tool provides a preliminary risk estimate. Please consult a licensed doctor for medical advice.";

/// Three-band risk classification used for clinical tiers and the combined level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No guideline threshold crossed
    Low,
    /// Prediabetes range, follow-up recommended
    Moderate,
    /// Diabetes range, or flagged by the model
    High,
}

impl RiskLevel {
    /// Guidance text for the caller to display.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low => "Low risk. Keep maintaining healthy habits.",
            Self::Moderate => "Moderate risk. A follow-up test with your doctor is recommended.",
            Self::High => "High risk detected. Please seek medical attention.",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Binary label emitted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Low,
    High,
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Where `probability_high` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// The classifier reported a class probability.
    Probability,
    /// The classifier only reported a hard label; probability is 0 or 1.
    LabelOnly,
}

/// Output of one model inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub label: RiskLabel,

    /// Probability of the high-risk class (0.0 to 1.0)
    pub probability_high: f64,

    pub confidence_source: ConfidenceSource,
}

impl ModelPrediction {
    /// Prediction from a classifier that reports both label and probability.
    #[must_use]
    pub fn with_probability(label: RiskLabel, probability_high: f64) -> Self {
        Self {
            label,
            probability_high,
            confidence_source: ConfidenceSource::Probability,
        }
    }

    /// Degraded prediction from a label-only classifier.
    #[must_use]
    pub fn label_only(label: RiskLabel) -> Self {
        let probability_high = match label {
            RiskLabel::High => 1.0,
            RiskLabel::Low => 0.0,
        };
        Self {
            label,
            probability_high,
            confidence_source: ConfidenceSource::LabelOnly,
        }
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        confidence(self.probability_high)
    }
}

/// Distance of a probability from the 0.5 decision boundary, in [0.5, 1.0].
#[must_use]
pub fn confidence(probability_high: f64) -> f64 {
    probability_high.max(1.0 - probability_high)
}

/// How the model and the guideline tier relate when they disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discrepancy {
    /// Both signals agree on whether the case is high risk.
    None,
    /// Model says high; guideline tier is low or moderate.
    ModelFlagsHigh,
    /// Guideline tier is high; model says low.
    GuidelineFlagsHigh,
}

/// The reconciled decision, before the importance table is attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub model_prediction: ModelPrediction,
    pub clinical_tier: ClinicalTier,
    pub combined_risk_level: RiskLevel,
    pub confidence: f64,
    pub discrepancy: Discrepancy,
}

/// Complete result of one assessment. Never mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentReport {
    /// Unique identifier
    pub id: String,

    /// Raw model signal
    pub model_prediction: ModelPrediction,

    /// Raw guideline signal
    pub clinical_tier: ClinicalTier,

    pub combined_risk_level: RiskLevel,

    /// Model confidence (0.5 to 1.0)
    pub confidence: f64,

    pub confidence_source: ConfidenceSource,

    pub discrepancy: Discrepancy,

    /// Guidance for `combined_risk_level`
    pub advice: String,

    /// Training-time feature weights, descending
    pub feature_importance_ranking: Vec<FeatureImportance>,

    /// The validated input this report was computed from
    pub input_echo: PatientInput,

    /// SHA-256 of the classifier artifact, when known
    pub model_fingerprint: Option<String>,

    /// Feature schema version the input was encoded with
    pub schema_version: u32,

    /// Timestamp of assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RiskAssessmentReport {
    /// Assemble a report. All fields are supplied at once.
    #[must_use]
    pub fn new(
        decision: Decision,
        input_echo: PatientInput,
        feature_importance_ranking: Vec<FeatureImportance>,
        model_fingerprint: Option<String>,
    ) -> Self {
        Self {
            id: uuid_v4(),
            model_prediction: decision.model_prediction,
            clinical_tier: decision.clinical_tier,
            combined_risk_level: decision.combined_risk_level,
            confidence: decision.confidence,
            confidence_source: decision.model_prediction.confidence_source,
            discrepancy: decision.discrepancy,
            advice: decision.combined_risk_level.advice().to_string(),
            feature_importance_ranking,
            input_echo,
            model_fingerprint,
            schema_version: SCHEMA_VERSION,
            created_at: chrono::Utc::now(),
        }
    }

    /// True when the model and the guideline tier disagree on high risk.
    #[must_use]
    pub fn signals_disagree(&self) -> bool {
        self.discrepancy != Discrepancy::None
    }
}

/// Generate a random UUID v4 string from a CSPRNG.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
