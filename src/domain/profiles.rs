//! Reference risk profiles for display next to a result.

use serde::Serialize;

use super::clinical::{classify, ClinicalTier};

/// A named reference point with its guideline tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskProfile {
    pub name: &'static str,
    pub hba1c_percent: f64,
    pub blood_glucose_mgdl: f64,
    pub clinical_tier: ClinicalTier,
}

const PROFILES: [(&str, f64, f64); 6] = [
    ("Very Healthy", 4.5, 80.0),
    ("Moderately Healthy", 5.2, 90.0),
    ("Borderline", 5.7, 100.0),
    ("Slightly Elevated", 6.0, 110.0),
    ("High Risk", 7.0, 160.0),
    ("Very High Risk", 8.0, 200.0),
];

/// Reference profiles ordered from healthiest to highest risk.
#[must_use]
pub fn risk_profiles() -> Vec<RiskProfile> {
    PROFILES
        .iter()
        .map(|&(name, hba1c_percent, blood_glucose_mgdl)| RiskProfile {
            name,
            hba1c_percent,
            blood_glucose_mgdl,
            clinical_tier: classify(hba1c_percent, blood_glucose_mgdl),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskLevel;

    #[test]
    fn test_profiles_are_monotonic() {
        let tiers: Vec<RiskLevel> = risk_profiles().iter().map(|p| p.clinical_tier.tier).collect();
        assert_eq!(
            tiers,
            vec![
                RiskLevel::Low,
                RiskLevel::Low,
                RiskLevel::Moderate,
                RiskLevel::Moderate,
                RiskLevel::High,
                RiskLevel::High,
            ]
        );
    }
}
