//! Feature encoder.
//!
//! Maps a validated [`PatientInput`] to the fixed-order numeric vector the
//! risk model was trained on. Column order and the code tables are a contract
//! with the model artifact: the loader refuses artifacts whose declared
//! feature names or smoking taxonomy differ from the constants here.

use serde::{Deserialize, Serialize};

use super::patient::{Category, Finding, Gender, PatientInput, SmokingHistory};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 8;

/// Column names, in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "smoking_history",
    "bmi",
    "HbA1c_level",
    "blood_glucose_level",
];

/// Identifier of the smoking-history code table used by [`Encode`].
pub const SMOKING_TAXONOMY: &str = "smoking-v1";

/// Column positions within a [`FeatureVector`].
pub mod column {
    pub const GENDER: usize = 0;
    pub const AGE: usize = 1;
    pub const HYPERTENSION: usize = 2;
    pub const HEART_DISEASE: usize = 3;
    pub const SMOKING_HISTORY: usize = 4;
    pub const BMI: usize = 5;
    pub const HBA1C: usize = 6;
    pub const BLOOD_GLUCOSE: usize = 7;
}

/// Numeric code of a categorical answer.
pub trait Encode: Category {
    fn code(self) -> u8;

    /// Inverse of [`Encode::code`].
    fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }
}

impl Encode for Gender {
    fn code(self) -> u8 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }
}

impl Encode for Finding {
    fn code(self) -> u8 {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }
}

impl Encode for SmokingHistory {
    fn code(self) -> u8 {
        match self {
            Self::NoInfo => 0,
            Self::Current => 1,
            Self::Never => 2,
            Self::Past => 3,
        }
    }
}

/// Wrong number of values for a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Expected {FEATURE_COUNT} features, got {0}")]
pub struct FeatureCountError(pub usize);

/// Model input in fixed column order (see [`FEATURE_NAMES`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Build a vector from raw values.
    ///
    /// # Errors
    /// Returns `FeatureCountError` unless exactly [`FEATURE_COUNT`] values are given.
    pub fn from_slice(values: &[f64]) -> Result<Self, FeatureCountError> {
        let array: [f64; FEATURE_COUNT] = values
            .try_into()
            .map_err(|_| FeatureCountError(values.len()))?;
        Ok(Self(array))
    }

    /// Value of the named column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }

    /// `(name, value)` pairs in column order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }

    /// Map the categorical columns back to their answers.
    ///
    /// Returns `None` if any of them holds a value outside its code table.
    #[must_use]
    pub fn decode_categories(&self) -> Option<DecodedCategories> {
        Some(DecodedCategories {
            gender: decode(self.0[column::GENDER])?,
            hypertension: decode(self.0[column::HYPERTENSION])?,
            heart_disease: decode(self.0[column::HEART_DISEASE])?,
            smoking_history: decode(self.0[column::SMOKING_HISTORY])?,
        })
    }
}

/// Categorical answers recovered from a [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCategories {
    pub gender: Gender,
    pub hypertension: Finding,
    pub heart_disease: Finding,
    pub smoking_history: SmokingHistory,
}

fn decode<T: Encode>(value: f64) -> Option<T> {
    if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return None;
    }
    T::from_code(value as u8)
}

/// Encode a patient's answers into model order.
///
/// Pure and total; range checks happen before this, in
/// [`PatientInput::validate`].
#[must_use]
pub fn encode(input: &PatientInput) -> FeatureVector {
    FeatureVector([
        f64::from(input.gender.code()),
        f64::from(input.age),
        f64::from(input.hypertension.code()),
        f64::from(input.heart_disease.code()),
        f64::from(input.smoking_history.code()),
        input.bmi,
        input.hba1c,
        f64::from(input.blood_glucose),
    ])
}
