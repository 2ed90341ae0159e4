//! Domain layer: Core decision types and logic.
//!
//! Pure Rust with no I/O in the decision path. Everything here is
//! deterministic given its inputs, except report ids and timestamps.

mod assessment;
pub mod clinical;
pub mod composer;
pub mod encoder;
mod importance;
mod patient;
mod profiles;
pub mod schema;

pub use assessment::{
    confidence, ConfidenceSource, Decision, Discrepancy, ModelPrediction, RiskAssessmentReport,
    RiskLabel, RiskLevel, DISCLAIMER,
};
pub use clinical::{classify, ClinicalTier, DrivingMetric};
pub use composer::compose;
pub use encoder::{decode, encode, EncodedFeatureVector};
pub use importance::{FeatureImportance, ImportanceTable, ImportanceTableError, SUM_TOLERANCE};
pub use patient::{FieldViolation, PatientInput, RawPatientInput, ValidationError};
pub use profiles::{risk_profiles, RiskProfile};
pub use schema::{Feature, Gender, SmokingHistory, FEATURE_COUNT, FEATURE_NAMES, SCHEMA_VERSION};
