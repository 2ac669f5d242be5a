//! Patient input types for diabetes risk assessment.
//!
//! Categorical answers are closed enums. Anything outside the lists below is
//! rejected when parsed, so the feature encoder only ever sees known values.

use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// A single problem found while checking patient input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: unknown value '{value}'")]
    UnknownCategory { field: &'static str, value: String },

    #[error("{field}: {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field}: value must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field}: '{value}' is not a valid number")]
    NotANumber { field: &'static str, value: String },

    #[error("{field}: value is required")]
    Missing { field: &'static str },
}

/// Every problem found in one submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

/// Closed set of answers for a categorical form field.
pub trait Category: Copy + PartialEq + Sized + 'static {
    /// Field name used in error messages and logs.
    const FIELD: &'static str;

    /// Every answer, in the order the form offers them.
    const ALL: &'static [Self];

    /// Label shown to the user and accepted on input.
    fn label(self) -> &'static str;

    /// Parse a label, ignoring ASCII case and surrounding whitespace.
    ///
    /// # Errors
    /// Returns `ValidationError::UnknownCategory` for anything not in `ALL`.
    fn parse_label(value: &str) -> Result<Self, ValidationError> {
        Self::parse_for(Self::FIELD, value)
    }

    /// Like [`Category::parse_label`], reporting errors under `field`.
    ///
    /// # Errors
    /// Returns `ValidationError::UnknownCategory` for anything not in `ALL`.
    fn parse_for(field: &'static str, value: &str) -> Result<Self, ValidationError> {
        let wanted = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownCategory {
                field,
                value: value.to_string(),
            })
    }

    /// Next answer, wrapping around (selector widgets).
    #[must_use]
    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous answer, wrapping around.
    #[must_use]
    fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

macro_rules! impl_category_conversions {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as Category>::parse_label(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for &'static str {
            fn from(value: $ty) -> Self {
                value.label()
            }
        }
    };
}

/// Gender as offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Gender {
    Male,
    Female,
}

impl Category for Gender {
    const FIELD: &'static str = "gender";
    const ALL: &'static [Self] = &[Self::Male, Self::Female];

    fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Yes/no clinical history answer (hypertension, heart disease).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Finding {
    Negative,
    Positive,
}

impl Category for Finding {
    const FIELD: &'static str = "finding";
    const ALL: &'static [Self] = &[Self::Negative, Self::Positive];

    fn label(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Positive => "positive",
        }
    }
}

/// Smoking history, canonical four-answer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SmokingHistory {
    NoInfo,
    Current,
    Never,
    Past,
}

impl Category for SmokingHistory {
    const FIELD: &'static str = "smoking_history";
    const ALL: &'static [Self] = &[Self::NoInfo, Self::Current, Self::Never, Self::Past];

    fn label(self) -> &'static str {
        match self {
            Self::NoInfo => "No Info",
            Self::Current => "Current",
            Self::Never => "Never",
            Self::Past => "Past",
        }
    }
}

impl_category_conversions!(Gender);
impl_category_conversions!(Finding);
impl_category_conversions!(SmokingHistory);

/// Inclusive bounds for a numeric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check `value` for `field`.
    ///
    /// # Errors
    /// Returns `NotFinite` for NaN/infinite values and `OutOfRange` otherwise.
    pub fn check(&self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if !self.contains(value) {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

pub const AGE_BOUNDS: Bounds = Bounds::new(0.0, 120.0);
pub const BMI_BOUNDS: Bounds = Bounds::new(10.0, 50.0);
pub const GLUCOSE_BOUNDS: Bounds = Bounds::new(50.0, 300.0);
pub const HBA1C_BOUNDS: Bounds = Bounds::new(3.0, 15.0);
pub const HEIGHT_CM_BOUNDS: Bounds = Bounds::new(50.0, 250.0);
pub const WEIGHT_KG_BOUNDS: Bounds = Bounds::new(10.0, 300.0);

/// Answers from one completed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub gender: Gender,

    /// Age in whole years
    pub age: u8,

    pub hypertension: Finding,

    pub heart_disease: Finding,

    pub smoking_history: SmokingHistory,

    /// Body mass index (kg/m²)
    pub bmi: f64,

    /// Blood glucose in mg/dL
    pub blood_glucose: u16,

    /// Glycated hemoglobin in %
    pub hba1c: f64,
}

impl Default for PatientInput {
    /// Form defaults: the values each widget starts at.
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: 30,
            hypertension: Finding::Negative,
            heart_disease: Finding::Negative,
            smoking_history: SmokingHistory::NoInfo,
            bmi: 25.0,
            blood_glucose: 100,
            hba1c: 5.5,
        }
    }
}

impl PatientInput {
    /// Check numeric fields against the form bounds.
    ///
    /// # Errors
    /// Returns every out-of-range or non-finite field at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let errors: Vec<ValidationError> = [
            AGE_BOUNDS.check("age", f64::from(self.age)),
            BMI_BOUNDS.check("bmi", self.bmi),
            GLUCOSE_BOUNDS.check("blood_glucose", f64::from(self.blood_glucose)),
            HBA1C_BOUNDS.check("hba1c", self.hba1c),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        ValidationErrors(errors).into_result()
    }
}

/// Height and weight, for forms that ask for those instead of BMI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl BodyMeasurements {
    /// `weight_kg / height_m²`, rounded to two decimals.
    ///
    /// # Errors
    /// Returns errors for heights or weights outside their bounds.
    pub fn bmi(&self) -> Result<f64, ValidationErrors> {
        let errors: Vec<ValidationError> = [
            HEIGHT_CM_BOUNDS.check("height_cm", self.height_cm),
            WEIGHT_KG_BOUNDS.check("weight_kg", self.weight_kg),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();
        ValidationErrors(errors).into_result()?;

        let height_m = self.height_cm / 100.0;
        round2(self.weight_kg / (height_m * height_m))
            .map_err(|_| ValidationError::NotFinite { field: "bmi" }.into())
    }
}

/// Round to two decimals, ties to even on the exact binary value.
///
/// # Errors
/// Returns the parse error if the formatted value cannot be read back.
pub fn round2(value: f64) -> Result<f64, ParseFloatError> {
    format!("{value:.2}").parse()
}

/// Patient input as submitted in a JSON document.
///
/// BMI may be given directly or derived from `height_cm` and `weight_kg`.
/// When both are present the explicit BMI wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDocument {
    pub gender: Gender,
    pub age: u8,
    #[serde(deserialize_with = "hypertension_finding")]
    pub hypertension: Finding,
    #[serde(deserialize_with = "heart_disease_finding")]
    pub heart_disease: Finding,
    pub smoking_history: SmokingHistory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    pub blood_glucose: u16,
    pub hba1c: f64,
}

fn finding_for<'de, D>(field: &'static str, deserializer: D) -> Result<Finding, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Finding::parse_for(field, &raw).map_err(de::Error::custom)
}

fn hypertension_finding<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Finding, D::Error> {
    finding_for("hypertension", deserializer)
}

fn heart_disease_finding<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Finding, D::Error> {
    finding_for("heart_disease", deserializer)
}

impl PatientDocument {
    /// Resolve BMI and build a [`PatientInput`].
    ///
    /// Range checks are left to [`PatientInput::validate`].
    ///
    /// # Errors
    /// Returns `Missing { field: "bmi" }` when neither BMI nor both body
    /// measurements are present, or the measurement errors.
    pub fn into_input(self) -> Result<PatientInput, ValidationErrors> {
        let bmi = match (self.bmi, self.height_cm, self.weight_kg) {
            (Some(bmi), _, _) => bmi,
            (None, Some(height_cm), Some(weight_kg)) => BodyMeasurements {
                height_cm,
                weight_kg,
            }
            .bmi()?,
            _ => return Err(ValidationError::Missing { field: "bmi" }.into()),
        };

        Ok(PatientInput {
            gender: self.gender,
            age: self.age,
            hypertension: self.hypertension,
            heart_disease: self.heart_disease,
            smoking_history: self.smoking_history,
            bmi,
            blood_glucose: self.blood_glucose,
            hba1c: self.hba1c,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_categories() {
        assert_eq!("male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!(" Female ".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("positive".parse::<Finding>(), Ok(Finding::Positive));
        assert_eq!("No Info".parse::<SmokingHistory>(), Ok(SmokingHistory::NoInfo));
        assert_eq!("past".parse::<SmokingHistory>(), Ok(SmokingHistory::Past));
    }

    #[test]
    fn test_unknown_smoking_history_is_rejected() {
        let err = "Unknown".parse::<SmokingHistory>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownCategory {
                field: "smoking_history",
                value: "Unknown".to_string(),
            }
        );

        // Labels from the five-answer forms are not part of this table.
        assert!("Former Low Risk".parse::<SmokingHistory>().is_err());
    }

    #[test]
    fn test_selector_cycles() {
        assert_eq!(SmokingHistory::Past.next(), SmokingHistory::NoInfo);
        assert_eq!(SmokingHistory::NoInfo.prev(), SmokingHistory::Past);
        assert_eq!(Gender::Male.next(), Gender::Female);
        assert_eq!(Finding::Negative.prev(), Finding::Positive);
    }

    #[test]
    fn test_default_input_is_valid() {
        assert!(PatientInput::default().validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let input = PatientInput {
            age: 121,
            bmi: f64::NAN,
            blood_glucose: 20,
            hba1c: 15.0,
            ..PatientInput::default()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.0.len(), 3);
        assert!(errors.to_string().contains("age"));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::NotFinite { field: "bmi" })));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let input = PatientInput {
            age: 0,
            bmi: 50.0,
            blood_glucose: 300,
            hba1c: 3.0,
            ..PatientInput::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_bmi_from_measurements() {
        let m = BodyMeasurements {
            height_cm: 170.0,
            weight_kg: 70.0,
        };
        assert_eq!(m.bmi().expect("valid measurements"), 24.22);
    }

    #[test]
    fn test_bmi_rounds_ties_to_even() {
        let cases = [(200.0, 96.5, 24.12), (120.0, 33.3, 23.12), (170.0, 70.0, 24.22)];
        for (height_cm, weight_kg, expected) in cases {
            let m = BodyMeasurements {
                height_cm,
                weight_kg,
            };
            assert_eq!(m.bmi().expect("valid measurements"), expected, "{m:?}");
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(24.125).unwrap(), 24.12);
        assert_eq!(round2(31.0).unwrap(), 31.0);
    }

    #[test]
    fn test_bmi_rejects_zero_height() {
        let m = BodyMeasurements {
            height_cm: 0.0,
            weight_kg: 70.0,
        };
        assert!(m.bmi().is_err());
    }

    #[test]
    fn test_document_json_roundtrip_labels() {
        let json = r#"{"gender":"male","age":45,"hypertension":"positive",
            "heart_disease":"negative","smoking_history":"Current",
            "bmi":31.0,"blood_glucose":210,"hba1c":7.2}"#;
        let doc: PatientDocument = serde_json::from_str(json).expect("valid document");
        let input = doc.into_input().expect("bmi present");
        assert_eq!(input.smoking_history, SmokingHistory::Current);

        let out = serde_json::to_value(&input).expect("serialize");
        assert_eq!(out["smoking_history"], "Current");
        assert_eq!(out["gender"], "male");
    }

    #[test]
    fn test_document_rejects_unknown_category() {
        let json = r#"{"gender":"male","age":45,"hypertension":"positive",
            "heart_disease":"negative","smoking_history":"Unknown",
            "bmi":31.0,"blood_glucose":210,"hba1c":7.2}"#;
        let err = serde_json::from_str::<PatientDocument>(json).unwrap_err();
        assert!(err.to_string().contains("smoking_history"));
    }

    #[test]
    fn test_document_names_the_unknown_finding() {
        for field in ["hypertension", "heart_disease"] {
            let mut doc = serde_json::json!({
                "gender": "male", "age": 45, "hypertension": "negative",
                "heart_disease": "negative", "smoking_history": "Never",
                "bmi": 31.0, "blood_glucose": 210, "hba1c": 7.2
            });
            doc[field] = "maybe".into();

            let err = serde_json::from_value::<PatientDocument>(doc).unwrap_err();
            assert!(
                err.to_string().starts_with(&format!("{field}: unknown value 'maybe'")),
                "{err}"
            );
        }
    }

    #[test]
    fn test_document_derives_bmi() {
        let doc = PatientDocument {
            gender: Gender::Female,
            age: 40,
            hypertension: Finding::Negative,
            heart_disease: Finding::Negative,
            smoking_history: SmokingHistory::Never,
            bmi: None,
            height_cm: Some(170.0),
            weight_kg: Some(70.0),
            blood_glucose: 90,
            hba1c: 5.0,
        };
        assert_eq!(doc.into_input().expect("derivable").bmi, 24.22);
    }

    #[test]
    fn test_document_requires_some_bmi() {
        let doc = PatientDocument {
            gender: Gender::Female,
            age: 40,
            hypertension: Finding::Negative,
            heart_disease: Finding::Negative,
            smoking_history: SmokingHistory::Never,
            bmi: None,
            height_cm: Some(170.0),
            weight_kg: None,
            blood_glucose: 90,
            hba1c: 5.0,
        };
        let errors = doc.into_input().unwrap_err();
        assert_eq!(errors.0, vec![ValidationError::Missing { field: "bmi" }]);
    }
}
