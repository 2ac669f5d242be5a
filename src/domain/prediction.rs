//! Prediction result types.
//!
//! Represents the outcome of one form submission: the model's label plus the
//! rule-based metric bands.

use serde::Serialize;

use super::bands::{BandAnnotations, Severity};
use super::features::FeatureVector;
use super::patient::PatientInput;

/// Model verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    NoRisk,
    Risk,
}

impl RiskLabel {
    /// Interpret a raw model output: 0 is no risk, anything else is risk.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        if raw == 0 {
            Self::NoRisk
        } else {
            Self::Risk
        }
    }

    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::NoRisk => "No Diabetes Risk Detected",
            Self::Risk => "Possible Diabetes Risk Detected",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoRisk => "No signs of diabetes were detected based on the provided information.",
            Self::Risk => {
                "Your results suggest a potential risk. Please consult a medical professional."
            }
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::NoRisk => Severity::Healthy,
            Self::Risk => Severity::Danger,
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRisk => write!(f, "NO RISK"),
            Self::Risk => write!(f, "RISK"),
        }
    }
}

/// Everything shown for one submission. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    /// Request identifier, for correlating log lines
    pub id: String,

    pub label: RiskLabel,

    /// Value returned by the classifier
    pub raw_label: i64,

    pub bands: BandAnnotations,

    pub input: PatientInput,

    pub features: FeatureVector,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    /// Assemble a result; bands come from `input`, not from the model.
    #[must_use]
    pub fn new(input: PatientInput, features: FeatureVector, raw_label: i64) -> Self {
        Self {
            id: request_id(),
            label: RiskLabel::from_raw(raw_label),
            raw_label,
            bands: BandAnnotations::for_input(&input),
            input,
            features,
            created_at: chrono::Utc::now(),
        }
    }
}

/// 64-bit random request id, hex encoded.
fn request_id() -> String {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 8] = rng.gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::encode;

    #[test]
    fn test_label_from_raw() {
        assert_eq!(RiskLabel::from_raw(0), RiskLabel::NoRisk);
        assert_eq!(RiskLabel::from_raw(1), RiskLabel::Risk);
        assert_eq!(RiskLabel::from_raw(-3), RiskLabel::Risk);
    }

    #[test]
    fn test_bands_do_not_depend_on_label() {
        let input = PatientInput {
            bmi: 31.0,
            blood_glucose: 210,
            hba1c: 7.2,
            ..PatientInput::default()
        };
        let features = encode(&input);

        let negative = PredictionResult::new(input.clone(), features, 0);
        let positive = PredictionResult::new(input, features, 1);

        assert_eq!(negative.label, RiskLabel::NoRisk);
        assert_eq!(positive.label, RiskLabel::Risk);
        assert_eq!(negative.bands, positive.bands);
        assert_eq!(negative.bands.worst(), Severity::Danger);
    }

    #[test]
    fn test_request_ids_differ() {
        let id1 = request_id();
        let id2 = request_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 16);
    }

    #[test]
    fn test_result_serializes_labels() {
        let input = PatientInput::default();
        let result = PredictionResult::new(input.clone(), encode(&input), 0);
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["label"], "no_risk");
        assert_eq!(json["input"]["smoking_history"], "No Info");
        assert_eq!(json["bands"][0]["label"], "Overweight");
        assert_eq!(json["bands"][1]["label"], "Normal");
    }
}
