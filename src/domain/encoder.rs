//! Feature encoding: `PatientInput` to the classifier's numeric vector.

use serde::{Deserialize, Serialize};

use super::patient::{PatientInput, ValidationError, Violations};
use super::schema::{decode_bool, encode_bool, Feature, Gender, SmokingHistory, FEATURE_COUNT};

/// Fixed-length feature vector in canonical schema order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatureVector([f64; FEATURE_COUNT]);

impl EncodedFeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Wrap raw values already in canonical order.
    #[must_use]
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Wrap a slice, rejecting any length other than [`FEATURE_COUNT`].
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        <[f64; FEATURE_COUNT]>::try_from(values).ok().map(Self)
    }
}

/// Validate and encode a patient record.
///
/// # Errors
/// Returns a `ValidationError` listing every out-of-range field; nothing is
/// clamped.
pub fn encode(input: &PatientInput) -> Result<EncodedFeatureVector, ValidationError> {
    input.validate()?;

    let mut v = [0.0; FEATURE_COUNT];
    v[Feature::Gender.index()] = input.gender.code();
    v[Feature::Age.index()] = f64::from(input.age);
    v[Feature::Hypertension.index()] = encode_bool(input.hypertension);
    v[Feature::HeartDisease.index()] = encode_bool(input.heart_disease);
    v[Feature::SmokingHistory.index()] = input.smoking_history.code();
    v[Feature::Bmi.index()] = input.bmi;
    v[Feature::Hba1cPercent.index()] = input.hba1c_percent;
    v[Feature::BloodGlucoseMgdl.index()] = input.blood_glucose_mgdl;

    Ok(EncodedFeatureVector(v))
}

/// Reverse [`encode`], mapping categorical codes back to their labels.
///
/// # Errors
/// Returns a `ValidationError` for codes outside the canonical maps and for
/// values outside the schema ranges.
pub fn decode(vector: &EncodedFeatureVector) -> Result<PatientInput, ValidationError> {
    let mut out = Violations::default();
    let code = |f: Feature| vector.get(f);

    let gender = Gender::from_code(code(Feature::Gender));
    if gender.is_none() {
        out.push(Feature::Gender.name(), format!("code {} not in gender map", code(Feature::Gender)));
    }
    let smoking_history = SmokingHistory::from_code(code(Feature::SmokingHistory));
    if smoking_history.is_none() {
        out.push(
            Feature::SmokingHistory.name(),
            format!("code {} not in smoking_history map", code(Feature::SmokingHistory)),
        );
    }
    let hypertension = decode_bool(code(Feature::Hypertension));
    if hypertension.is_none() {
        out.push(Feature::Hypertension.name(), "expected 0 or 1");
    }
    let heart_disease = decode_bool(code(Feature::HeartDisease));
    if heart_disease.is_none() {
        out.push(Feature::HeartDisease.name(), "expected 0 or 1");
    }
    let age = code(Feature::Age);
    if age.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&age) {
        out.push(Feature::Age.name(), format!("{age} is not a whole number of years"));
    }
    out.into_result()?;

    let (Some(gender), Some(smoking_history), Some(hypertension), Some(heart_disease)) =
        (gender, smoking_history, hypertension, heart_disease)
    else {
        return Err(ValidationError::single("vector", "undecodable feature vector"));
    };

    let input = PatientInput {
        gender,
        age: age as u32,
        bmi: code(Feature::Bmi),
        smoking_history,
        hba1c_percent: code(Feature::Hba1cPercent),
        blood_glucose_mgdl: code(Feature::BloodGlucoseMgdl),
        hypertension,
        heart_disease,
    };
    input.validate()?;
    Ok(input)
}
