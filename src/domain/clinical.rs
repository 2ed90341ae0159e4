//! Guideline-based tiering from HbA1c and fasting glucose.
//!
//! Independent of the statistical model. Bands follow the ADA diagnostic
//! cut-offs; every lower bound is inclusive.

use serde::{Deserialize, Serialize};

use super::assessment::RiskLevel;
use super::patient::PatientInput;

/// HbA1c (%) at or above which the tier is high.
pub const HBA1C_HIGH: f64 = 6.5;
/// HbA1c (%) at or above which the tier is at least moderate.
pub const HBA1C_MODERATE: f64 = 5.7;
/// Glucose (mg/dL) at or above which the tier is high.
pub const GLUCOSE_HIGH: f64 = 126.0;
/// Glucose (mg/dL) at or above which the tier is at least moderate.
pub const GLUCOSE_MODERATE: f64 = 100.0;

/// Which raw measurement placed the patient in their tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingMetric {
    Hba1c,
    Glucose,
    None,
}

impl DrivingMetric {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Hba1c => "HbA1c",
            Self::Glucose => "blood glucose",
            Self::None => "no guideline threshold crossed",
        }
    }
}

/// Result of the clinical rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalTier {
    pub tier: RiskLevel,
    pub driving_metric: DrivingMetric,
}

impl ClinicalTier {
    #[must_use]
    pub fn for_patient(input: &PatientInput) -> Self {
        classify(input.hba1c_percent, input.blood_glucose_mgdl)
    }
}

/// Tier a patient from HbA1c (%) and blood glucose (mg/dL).
///
/// When both metrics cross the same band, HbA1c is reported as the driver
/// since it reflects the longer-term average.
#[must_use]
pub fn classify(hba1c: f64, glucose: f64) -> ClinicalTier {
    let band = |hba1c_cut: f64, glucose_cut: f64| {
        if hba1c >= hba1c_cut {
            Some(DrivingMetric::Hba1c)
        } else if glucose >= glucose_cut {
            Some(DrivingMetric::Glucose)
        } else {
            None
        }
    };

    if let Some(driving_metric) = band(HBA1C_HIGH, GLUCOSE_HIGH) {
        ClinicalTier {
            tier: RiskLevel::High,
            driving_metric,
        }
    } else if let Some(driving_metric) = band(HBA1C_MODERATE, GLUCOSE_MODERATE) {
        ClinicalTier {
            tier: RiskLevel::Moderate,
            driving_metric,
        }
    } else {
        ClinicalTier {
            tier: RiskLevel::Low,
            driving_metric: DrivingMetric::None,
        }
    }
}
