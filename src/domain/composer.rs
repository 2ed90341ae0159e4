//! Reconciliation of the model prediction with the guideline tier.

use super::assessment::{Decision, Discrepancy, ModelPrediction, RiskLabel, RiskLevel};
use super::clinical::ClinicalTier;

/// Merge the two signals into one decision.
///
/// The guideline tier is a floor: the model can raise the combined level to
/// high but never lower a guideline-high case. Both raw signals are kept in
/// the decision so a disagreement stays visible.
#[must_use]
pub fn compose(prediction: ModelPrediction, tier: ClinicalTier) -> Decision {
    let model_high = prediction.label == RiskLabel::High;
    let tier_high = tier.tier == RiskLevel::High;

    let combined_risk_level = if model_high || tier_high {
        RiskLevel::High
    } else if tier.tier == RiskLevel::Moderate {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let discrepancy = match (model_high, tier_high) {
        (true, false) => Discrepancy::ModelFlagsHigh,
        (false, true) => Discrepancy::GuidelineFlagsHigh,
        _ => Discrepancy::None,
    };

    Decision {
        model_prediction: prediction,
        clinical_tier: tier,
        combined_risk_level,
        confidence: prediction.confidence(),
        discrepancy,
    }
}
