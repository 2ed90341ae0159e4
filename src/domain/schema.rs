//! Canonical feature schema for diabetes risk assessment.
//!
//! One table defines the field order, the validity domains and the
//! categorical encodings shared by input validation, encoding, artifact
//! compatibility checks and the importance table.
//!
//! Encoded order (index = position in the feature vector):
//! gender, age, hypertension, heart_disease, smoking_history, bmi,
//! hba1c_percent, blood_glucose_mgdl

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Number of features consumed by the classifier.
pub const FEATURE_COUNT: usize = 8;

/// Bumped whenever the field order or any categorical map changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Age in whole years.
pub const AGE_RANGE: RangeInclusive<u32> = 0..=120;

/// Body-mass index in kg/m².
pub const BMI_RANGE: RangeInclusive<f64> = 10.0..=60.0;

/// Glycated hemoglobin in percent.
pub const HBA1C_RANGE: RangeInclusive<f64> = 3.0..=10.0;

/// Blood glucose in mg/dL.
pub const GLUCOSE_RANGE: RangeInclusive<f64> = 70.0..=300.0;

/// Canonical feature names in encoded order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "smoking_history",
    "bmi",
    "hba1c_percent",
    "blood_glucose_mgdl",
];

/// One input field of the schema. The discriminant is the canonical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Gender = 0,
    Age = 1,
    Hypertension = 2,
    HeartDisease = 3,
    SmokingHistory = 4,
    Bmi = 5,
    Hba1cPercent = 6,
    BloodGlucoseMgdl = 7,
}

/// Validity domain of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDomain {
    /// Whole numbers within the range.
    Integer(RangeInclusive<u32>),
    /// Finite reals within the range.
    Real(RangeInclusive<f64>),
    /// Yes/No.
    Boolean,
    /// One of the listed labels.
    Categorical(&'static [&'static str]),
}

impl Feature {
    /// All features in encoded order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Self::Gender,
        Self::Age,
        Self::Hypertension,
        Self::HeartDisease,
        Self::SmokingHistory,
        Self::Bmi,
        Self::Hba1cPercent,
        Self::BloodGlucoseMgdl,
    ];

    /// Position of this feature in the encoded vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical snake_case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Human-readable label for display next to importance scores.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::Hypertension => "Hypertension",
            Self::HeartDisease => "Heart Disease",
            Self::SmokingHistory => "Smoking History",
            Self::Bmi => "BMI",
            Self::Hba1cPercent => "HbA1c",
            Self::BloodGlucoseMgdl => "Blood Glucose",
        }
    }

    #[must_use]
    pub fn domain(self) -> FieldDomain {
        match self {
            Self::Gender => FieldDomain::Categorical(Gender::LABELS),
            Self::Age => FieldDomain::Integer(AGE_RANGE),
            Self::Hypertension | Self::HeartDisease => FieldDomain::Boolean,
            Self::SmokingHistory => FieldDomain::Categorical(SmokingHistory::LABELS),
            Self::Bmi => FieldDomain::Real(BMI_RANGE),
            Self::Hba1cPercent => FieldDomain::Real(HBA1C_RANGE),
            Self::BloodGlucoseMgdl => FieldDomain::Real(GLUCOSE_RANGE),
        }
    }

    /// Look up a feature by its canonical name only.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }

    /// Look up a feature by canonical name or one of the accepted aliases.
    ///
    /// Aliases cover the short keys used by form front ends (`hba1c`,
    /// `glucose`) and the column names of the training dataset
    /// (`HbA1c_level`, `blood_glucose_level`).
    #[must_use]
    pub fn from_alias(name: &str) -> Option<Self> {
        Self::from_name(name).or(match name {
            "hba1c" | "HbA1c_level" => Some(Self::Hba1cPercent),
            "glucose" | "blood_glucose_level" => Some(Self::BloodGlucoseMgdl),
            _ => None,
        })
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Patient gender. Encoded `Female = 0`, `Male = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const LABELS: &'static [&'static str] = &["Female", "Male"];

    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Female => 0.0,
            Self::Male => 1.0,
        }
    }

    #[must_use]
    pub fn from_code(code: f64) -> Option<Self> {
        if code == 0.0 {
            Some(Self::Female)
        } else if code == 1.0 {
            Some(Self::Male)
        } else {
            None
        }
    }

    /// Parse a label, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "female" => Some(Self::Female),
            "male" => Some(Self::Male),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

/// Smoking history, canonical six-category set.
///
/// Map: never=0, current=1, former=2, ever=3, not_current=4, no_info=5.
/// Front ends that only offer five categories send `ever` in place of
/// `not_current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokingHistory {
    Never,
    Current,
    Former,
    Ever,
    NotCurrent,
    NoInfo,
}

impl SmokingHistory {
    pub const ALL: [SmokingHistory; 6] = [
        Self::Never,
        Self::Current,
        Self::Former,
        Self::Ever,
        Self::NotCurrent,
        Self::NoInfo,
    ];

    pub const LABELS: &'static [&'static str] =
        &["never", "current", "former", "ever", "not_current", "no_info"];

    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Never => 0.0,
            Self::Current => 1.0,
            Self::Former => 2.0,
            Self::Ever => 3.0,
            Self::NotCurrent => 4.0,
            Self::NoInfo => 5.0,
        }
    }

    #[must_use]
    pub fn from_code(code: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Parse a canonical label. The legacy spellings `No Info` and
    /// `not current` are accepted for `no_info` and `not_current`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace(' ', "_");
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == normalized)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        Self::LABELS[self.code() as usize]
    }
}

/// Encode a Yes/No field.
#[must_use]
pub fn encode_bool(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Decode a Yes/No field; anything other than exactly 0 or 1 is rejected.
#[must_use]
pub fn decode_bool(code: f64) -> Option<bool> {
    if code == 0.0 {
        Some(false)
    } else if code == 1.0 {
        Some(true)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_matches_names() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(feature.name(), FEATURE_NAMES[i]);
            assert_eq!(Feature::from_name(FEATURE_NAMES[i]), Some(*feature));
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Feature::from_alias("hba1c"), Some(Feature::Hba1cPercent));
        assert_eq!(Feature::from_alias("HbA1c_level"), Some(Feature::Hba1cPercent));
        assert_eq!(Feature::from_alias("glucose"), Some(Feature::BloodGlucoseMgdl));
        assert_eq!(Feature::from_alias("bmi"), Some(Feature::Bmi));
        assert_eq!(Feature::from_name("hba1c"), None);
        assert_eq!(Feature::from_alias("weight"), None);
    }

    #[test]
    fn test_smoking_map_is_canonical() {
        let codes: Vec<f64> = SmokingHistory::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        for s in SmokingHistory::ALL {
            assert_eq!(SmokingHistory::from_code(s.code()), Some(s));
            assert_eq!(SmokingHistory::parse(s.as_str()), Some(s));
        }
        assert_eq!(SmokingHistory::from_code(6.0), None);
    }

    #[test]
    fn test_smoking_legacy_labels() {
        assert_eq!(SmokingHistory::parse("No Info"), Some(SmokingHistory::NoInfo));
        assert_eq!(SmokingHistory::parse("not current"), Some(SmokingHistory::NotCurrent));
        assert_eq!(SmokingHistory::parse("unknown"), None);
    }

    #[test]
    fn test_gender_and_bool_codes() {
        assert_eq!(Gender::Female.code(), 0.0);
        assert_eq!(Gender::Male.code(), 1.0);
        assert_eq!(Gender::parse(" male "), Some(Gender::Male));
        assert_eq!(Gender::from_code(0.5), None);
        assert_eq!(decode_bool(encode_bool(true)), Some(true));
        assert_eq!(decode_bool(2.0), None);
    }
}
