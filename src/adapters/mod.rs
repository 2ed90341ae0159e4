//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifact`: JSON-exported linear classifiers behind `RiskClassifier`
//! - `sanitize`: redaction of clinical values in log output

pub mod artifact;
pub mod sanitize;
