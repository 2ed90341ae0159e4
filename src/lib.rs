//! # Glycorisk
//!
//! Explainable diabetes risk decision engine.
//!
//! This crate provides:
//! - Validation and canonical encoding of eight clinical inputs
//! - Guideline-based tiering from HbA1c and blood glucose
//! - A contract around an externally trained classifier
//! - Reconciliation of both signals into one report with a static
//!   feature-importance ranking
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core decision types and pure logic (schema, encoder, rules, composer)
//! - `ports`: Trait definition for the external classifier
//! - `adapters`: JSON model artifacts and log sanitization
//! - `application`: The engine orchestrating domain and ports
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::RiskEngine;
pub use config::EngineConfig;
pub use domain::{PatientInput, RawPatientInput, RiskAssessmentReport, RiskLevel, ValidationError};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] domain::ValidationError),

    #[error("Feature vector schema mismatch: expected {expected} values, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid importance table: {0}")]
    InvalidImportanceTable(#[from] domain::ImportanceTableError),
}

impl From<ports::ModelError> for EngineError {
    fn from(e: ports::ModelError) -> Self {
        Self::ModelUnavailable(e.to_string())
    }
}

impl EngineError {
    /// Whether the caller can fix this by correcting the input.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Message safe to show an end user. Internal details are logged, not
    /// returned here.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            _ => "Assessment unavailable. Please try again later.".to_string(),
        }
    }
}
