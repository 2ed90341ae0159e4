//! Static feature-importance table attached to every report.
//!
//! The scores are the training-time weights of the classifier. They are
//! configuration data, validated once when the engine starts; a table that
//! does not cover exactly the canonical features, or whose scores do not sum
//! to one, is refused.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::assessment::{Decision, RiskAssessmentReport};
use super::patient::PatientInput;
use super::schema::{Feature, FEATURE_COUNT};

/// Allowed distance of the score sum from 1.0.
pub const SUM_TOLERANCE: f64 = 1e-3;

/// Weights shipped with the bundled classifier, by canonical feature name.
const DEFAULT_WEIGHTS: [(&str, f64); FEATURE_COUNT] = [
    ("hba1c_percent", 0.643_860),
    ("blood_glucose_mgdl", 0.317_668),
    ("age", 0.021_189),
    ("bmi", 0.009_640),
    ("hypertension", 0.004_004),
    ("heart_disease", 0.002_767),
    ("smoking_history", 0.000_554),
    ("gender", 0.000_319),
];

#[derive(Debug, thiserror::Error)]
pub enum ImportanceTableError {
    #[error("Failed to read importance table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed importance table: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Importance table lists {0} features, expected 8")]
    WrongLength(usize),

    #[error("Importance table names unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("Importance table lists '{0}' more than once")]
    Duplicate(String),

    #[error("Importance score for '{feature}' is invalid: {score}")]
    InvalidScore { feature: String, score: f64 },

    #[error("Importance scores sum to {0}, expected 1.0 ± 0.001")]
    BadSum(f64),
}

/// One row of the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: Feature,
    pub score: f64,
}

impl FeatureImportance {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.feature.name()
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.feature.label()
    }
}

/// On-disk form of a table entry, before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    feature: String,
    score: f64,
}

/// Validated ranking, sorted by descending score.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceTable {
    entries: Vec<FeatureImportance>,
}

impl ImportanceTable {
    /// Validate `(feature_name, score)` pairs and sort them.
    ///
    /// # Errors
    /// Returns an error unless the pairs name every canonical feature exactly
    /// once with finite, non-negative scores summing to 1.0 within
    /// [`SUM_TOLERANCE`].
    pub fn new<S: AsRef<str>>(
        pairs: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, ImportanceTableError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(FEATURE_COUNT);

        for (name, score) in pairs {
            let name = name.as_ref();
            let feature = Feature::from_name(name)
                .ok_or_else(|| ImportanceTableError::UnknownFeature(name.to_string()))?;
            if !seen.insert(feature) {
                return Err(ImportanceTableError::Duplicate(name.to_string()));
            }
            if !score.is_finite() || score < 0.0 {
                return Err(ImportanceTableError::InvalidScore {
                    feature: name.to_string(),
                    score,
                });
            }
            entries.push(FeatureImportance { feature, score });
        }

        if entries.len() != FEATURE_COUNT {
            return Err(ImportanceTableError::WrongLength(entries.len()));
        }

        let sum: f64 = entries.iter().map(|e| e.score).sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ImportanceTableError::BadSum(sum));
        }

        // Ties fall back to canonical order so the ranking is stable.
        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.feature.cmp(&b.feature))
        });

        Ok(Self { entries })
    }

    /// The table shipped with the bundled classifier.
    ///
    /// # Errors
    /// Only if the embedded weights were edited into an invalid state.
    pub fn bundled() -> Result<Self, ImportanceTableError> {
        Self::new(DEFAULT_WEIGHTS)
    }

    /// Load a table from a JSON array of `{"feature": .., "score": ..}`.
    ///
    /// # Errors
    /// Returns an error if the file is unreadable, malformed or invalid.
    pub fn from_json_file(path: &Path) -> Result<Self, ImportanceTableError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// # Errors
    /// Returns an error if the JSON is malformed or the table is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ImportanceTableError> {
        let raw: Vec<RawEntry> = serde_json::from_str(json)?;
        Self::new(raw.into_iter().map(|e| (e.feature, e.score)))
    }

    #[must_use]
    pub fn entries(&self) -> &[FeatureImportance] {
        &self.entries
    }

    /// `(feature_name, score)` pairs, highest score first.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, f64)> {
        self.entries.iter().map(|e| (e.name(), e.score)).collect()
    }

    /// Attach the ranking to a decision, producing the final report.
    #[must_use]
    pub fn annotate(
        &self,
        decision: Decision,
        input_echo: PatientInput,
        model_fingerprint: Option<String>,
    ) -> RiskAssessmentReport {
        RiskAssessmentReport::new(decision, input_echo, self.entries.clone(), model_fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table_is_valid() {
        let table = ImportanceTable::bundled().expect("Bundled table should validate");
        let sum: f64 = table.entries().iter().map(|e| e.score).sum();
        assert!((sum - 1.0).abs() <= SUM_TOLERANCE);

        let mut names: Vec<&str> = table.pairs().iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        let mut expected = crate::domain::schema::FEATURE_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_ranking_is_descending() {
        let table = ImportanceTable::bundled().expect("valid");
        assert!(table
            .entries()
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        assert_eq!(table.entries()[0].feature, Feature::Hba1cPercent);
        assert_eq!(table.entries()[0].label(), "HbA1c");
    }

    #[test]
    fn test_rejects_missing_feature() {
        let pairs: Vec<(&str, f64)> = DEFAULT_WEIGHTS[..7].to_vec();
        assert!(matches!(
            ImportanceTable::new(pairs),
            Err(ImportanceTableError::WrongLength(7))
        ));
    }

    #[test]
    fn test_rejects_duplicate_feature() {
        let mut pairs = DEFAULT_WEIGHTS.to_vec();
        pairs[7] = ("hba1c_percent", 0.000_319);
        assert!(matches!(
            ImportanceTable::new(pairs),
            Err(ImportanceTableError::Duplicate(_))
        ));
    }

    #[test]
    fn test_rejects_display_labels() {
        let mut pairs = DEFAULT_WEIGHTS.to_vec();
        pairs[0] = ("HbA1c", 0.643_860);
        assert!(matches!(
            ImportanceTable::new(pairs),
            Err(ImportanceTableError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_rejects_negative_and_bad_sum() {
        let mut pairs = DEFAULT_WEIGHTS.to_vec();
        pairs[7] = ("gender", -0.1);
        assert!(matches!(
            ImportanceTable::new(pairs),
            Err(ImportanceTableError::InvalidScore { .. })
        ));

        let mut pairs = DEFAULT_WEIGHTS.to_vec();
        pairs[0] = ("hba1c_percent", 0.5);
        assert!(matches!(
            ImportanceTable::new(pairs),
            Err(ImportanceTableError::BadSum(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"feature": "gender", "score": 0.125},
            {"feature": "age", "score": 0.125},
            {"feature": "hypertension", "score": 0.125},
            {"feature": "heart_disease", "score": 0.125},
            {"feature": "smoking_history", "score": 0.125},
            {"feature": "bmi", "score": 0.125},
            {"feature": "hba1c_percent", "score": 0.125},
            {"feature": "blood_glucose_mgdl", "score": 0.125}
        ]"#;
        let table = ImportanceTable::from_json_str(json).expect("Should parse");
        // Equal scores keep canonical order.
        assert_eq!(table.entries()[0].feature, Feature::Gender);
        assert_eq!(table.entries()[7].feature, Feature::BloodGlucoseMgdl);
    }
}
