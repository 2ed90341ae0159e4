//! Patient input for diabetes risk assessment.
//!
//! `PatientInput` is the typed value object a caller hands to the engine.
//! `PatientInput::from_raw` builds it from a loosely typed field map (as a
//! form or JSON front end would submit it), collecting every problem in one
//! pass instead of stopping at the first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{Feature, FieldDomain, Gender, SmokingHistory, FEATURE_COUNT};

/// Field name to raw value, as submitted by a front end.
pub type RawPatientInput = BTreeMap<String, Value>;

/// Clinical and demographic inputs for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub gender: Gender,

    /// Age in whole years (0-120)
    pub age: u32,

    /// Body-mass index (10.0-60.0)
    pub bmi: f64,

    pub smoking_history: SmokingHistory,

    /// Glycated hemoglobin in % (3.0-10.0)
    pub hba1c_percent: f64,

    /// Blood glucose in mg/dL (70-300)
    pub blood_glucose_mgdl: f64,

    pub hypertension: bool,

    pub heart_disease: bool,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// User-correctable input problems. Always lists every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Invalid patient input: {}", render_violations(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

fn render_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Build from collected violations. Returns `None` when there are none.
    #[must_use]
    pub fn from_violations(violations: Vec<FieldViolation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// Shorthand for a single-field error.
    #[must_use]
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the rejected fields, in the order they were found.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[must_use]
    pub fn names_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

/// Accumulates violations while a record is being checked.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldViolation>);

impl Violations {
    pub(crate) fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.into(),
            reason: reason.into(),
        });
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationError> {
        match ValidationError::from_violations(self.0) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn check_real(out: &mut Violations, feature: Feature, value: f64) {
    let FieldDomain::Real(range) = feature.domain() else {
        return;
    };
    if !value.is_finite() {
        out.push(feature.name(), "must be a finite number");
    } else if !range.contains(&value) {
        out.push(
            feature.name(),
            format!(
                "{value} out of range [{}, {}]",
                range.start(),
                range.end()
            ),
        );
    }
}

fn check_age(out: &mut Violations, age: u32) {
    if let FieldDomain::Integer(range) = Feature::Age.domain() {
        if !range.contains(&age) {
            out.push(
                Feature::Age.name(),
                format!("{age} out of range [{}, {}]", range.start(), range.end()),
            );
        }
    }
}

impl PatientInput {
    /// Check every field against its schema domain.
    ///
    /// # Errors
    /// Returns a `ValidationError` listing every out-of-range field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut out = Violations::default();

        check_age(&mut out, self.age);
        check_real(&mut out, Feature::Bmi, self.bmi);
        check_real(&mut out, Feature::Hba1cPercent, self.hba1c_percent);
        check_real(&mut out, Feature::BloodGlucoseMgdl, self.blood_glucose_mgdl);

        out.into_result()
    }

    /// Build and validate a patient record from a raw field map.
    ///
    /// Keys may be canonical feature names or the aliases accepted by
    /// [`Feature::from_alias`]. Unknown keys, keys supplied twice (canonical
    /// and alias), missing fields, wrong types, unrecognized categorical
    /// labels and out-of-range values are all reported together.
    ///
    /// # Errors
    /// Returns a `ValidationError` naming every rejected field.
    pub fn from_raw(raw: &RawPatientInput) -> Result<Self, ValidationError> {
        let mut out = Violations::default();
        let mut values: [Option<&Value>; FEATURE_COUNT] = [None; FEATURE_COUNT];

        for (key, value) in raw {
            match Feature::from_alias(key) {
                Some(feature) => {
                    let slot = &mut values[feature.index()];
                    if slot.is_some() {
                        out.push(feature.name(), format!("supplied more than once (via '{key}')"));
                    } else {
                        *slot = Some(value);
                    }
                }
                None => out.push(key.as_str(), "unknown field"),
            }
        }

        let gender = field(&mut out, &values, Feature::Gender, |v| {
            v.as_str()
                .and_then(Gender::parse)
                .ok_or_else(|| format!("expected one of {}", Gender::LABELS.join(", ")))
        });
        let age = field(&mut out, &values, Feature::Age, parse_age);
        let bmi = field(&mut out, &values, Feature::Bmi, parse_number);
        let smoking_history = field(&mut out, &values, Feature::SmokingHistory, |v| {
            v.as_str().and_then(SmokingHistory::parse).ok_or_else(|| {
                format!(
                    "unrecognized value {v}; expected one of {}",
                    SmokingHistory::LABELS.join(", ")
                )
            })
        });
        let hba1c_percent = field(&mut out, &values, Feature::Hba1cPercent, parse_number);
        let blood_glucose_mgdl = field(&mut out, &values, Feature::BloodGlucoseMgdl, parse_number);
        let hypertension = field(&mut out, &values, Feature::Hypertension, parse_bool);
        let heart_disease = field(&mut out, &values, Feature::HeartDisease, parse_bool);

        // Range problems on fields that did parse are reported alongside
        // parse failures on the others.
        if let Some(a) = age {
            check_age(&mut out, a);
        }
        for (feature, value) in [
            (Feature::Bmi, bmi),
            (Feature::Hba1cPercent, hba1c_percent),
            (Feature::BloodGlucoseMgdl, blood_glucose_mgdl),
        ] {
            if let Some(v) = value {
                check_real(&mut out, feature, v);
            }
        }
        out.into_result()?;

        match (
            gender,
            age,
            bmi,
            smoking_history,
            hba1c_percent,
            blood_glucose_mgdl,
            hypertension,
            heart_disease,
        ) {
            (
                Some(gender),
                Some(age),
                Some(bmi),
                Some(smoking_history),
                Some(hba1c_percent),
                Some(blood_glucose_mgdl),
                Some(hypertension),
                Some(heart_disease),
            ) => Ok(Self {
                gender,
                age,
                bmi,
                smoking_history,
                hba1c_percent,
                blood_glucose_mgdl,
                hypertension,
                heart_disease,
            }),
            _ => Err(ValidationError::single("input", "incomplete patient record")),
        }
    }
}

fn field<T>(
    out: &mut Violations,
    values: &[Option<&Value>],
    feature: Feature,
    parse: impl FnOnce(&Value) -> Result<T, String>,
) -> Option<T> {
    match values[feature.index()] {
        None | Some(Value::Null) => {
            out.push(feature.name(), "missing");
            None
        }
        Some(value) => match parse(value) {
            Ok(v) => Some(v),
            Err(reason) => {
                out.push(feature.name(), reason);
                None
            }
        },
    }
}

fn parse_number(value: &Value) -> Result<f64, String> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(format!("expected a number, got {value}")),
    }
}

fn parse_age(value: &Value) -> Result<u32, String> {
    let n = parse_number(value)?;
    if n.fract() != 0.0 {
        return Err(format!("{n} is not a whole number of years"));
    }
    if n < 0.0 || n > f64::from(u32::MAX) {
        return Err(format!("{n} out of range [0, 120]"));
    }
    Ok(n as u32)
}

fn parse_bool(value: &Value) -> Result<bool, String> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(false),
            Some(x) if x == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => Some(true),
            "no" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| format!("expected Yes or No, got {value}"))
}
