//! Logistic model adapter: implementation of `RiskClassifier` for a
//! standardized logistic-regression artifact.
//!
//! The artifact is a JSON file exported by the training pipeline:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "diabetes-logreg",
//!   "smoking_taxonomy": "smoking-v1",
//!   "feature_names": ["gender", "age", "..."],
//!   "scaler_mean": [...],
//!   "scaler_std": [...],
//!   "coefficients": [...],
//!   "intercept": -1.2,
//!   "threshold": 0.5
//! }
//! ```
//!
//! # Contract checks
//!
//! Loading fails unless the artifact's `feature_names` equal
//! [`FEATURE_NAMES`] in order and its `smoking_taxonomy` equals
//! [`SMOKING_TAXONOMY`]. A model trained on another column order or another
//! smoking code table would silently produce garbage otherwise.
//!
//! An optional SHA-256 pin of the artifact bytes can be supplied (see
//! `GLYCOCHECK_MODEL_SHA256`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES, SMOKING_TAXONOMY};
use crate::ports::{ClassifierError, RiskClassifier};

/// File looked up when the model path is a directory.
pub const MODEL_FILE_NAME: &str = "risk_model.json";

/// Artifact format understood by this adapter.
pub const FORMAT_VERSION: u32 = 1;

/// Error type for model loading.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("No model artifact at {0:?} (expected a JSON file or a directory containing {MODEL_FILE_NAME})")]
    NotFound(PathBuf),

    #[error("Failed to read model artifact {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported model format version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),

    #[error("Model was trained with smoking taxonomy '{found}', encoder uses '{expected}'")]
    TaxonomyMismatch { expected: &'static str, found: String },

    #[error("Model feature order {found:?} does not match encoder order {expected:?}")]
    FeatureOrder {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Model parameter '{name}' has {got} values, expected {FEATURE_COUNT}")]
    ParameterLength { name: &'static str, got: usize },

    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("Model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    #[serde(default = "default_model_name")]
    pub name: String,
    pub smoking_taxonomy: String,
    pub feature_names: Vec<String>,
    pub scaler_mean: Vec<f64>,
    pub scaler_std: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_model_name() -> String {
    "logistic".to_string()
}

fn default_threshold() -> f64 {
    0.5
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn fixed<const N: usize>(name: &'static str, values: &[f64]) -> Result<[f64; N], ModelError> {
    values.try_into().map_err(|_| ModelError::ParameterLength {
        name,
        got: values.len(),
    })
}

/// Resolve a file or directory to the artifact file.
fn resolve_artifact_path(path: &Path) -> Result<PathBuf, ModelError> {
    let candidate = if path.is_dir() {
        path.join(MODEL_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(ModelError::NotFound(path.to_path_buf()))
    }
}

/// Standardized logistic regression over the encoded feature vector.
#[derive(Debug, Clone)]
pub struct LinearModel {
    name: String,
    scaler_mean: [f64; FEATURE_COUNT],
    scaler_std: [f64; FEATURE_COUNT],
    coefficients: [f64; FEATURE_COUNT],
    intercept: f64,
    threshold: f64,
    sha256: Option<String>,
}

impl LinearModel {
    /// Load an artifact from a file, or from `risk_model.json` inside a directory.
    ///
    /// # Errors
    /// Returns `ModelError` if the file is missing or unreadable, fails the
    /// checksum pin, or does not satisfy the encoder contract.
    pub fn load(path: &Path, expected_sha256: Option<&str>) -> Result<Self, ModelError> {
        let artifact_path = resolve_artifact_path(path)?;
        let bytes = fs::read(&artifact_path).map_err(|source| ModelError::Read {
            path: artifact_path.clone(),
            source,
        })?;

        let digest = sha256_hex(&bytes);
        if let Some(expected) = expected_sha256 {
            if !expected.trim().eq_ignore_ascii_case(&digest) {
                tracing::error!("Model checksum mismatch for {:?}", artifact_path);
                return Err(ModelError::ChecksumMismatch {
                    expected: expected.trim().to_ascii_lowercase(),
                    actual: digest,
                });
            }
        } else {
            tracing::warn!(
                "Loading model {:?} without a checksum pin (set GLYCOCHECK_MODEL_SHA256 to enforce one)",
                artifact_path
            );
        }

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        let mut model = Self::from_artifact(artifact)?;
        model.sha256 = Some(digest);

        tracing::info!(
            "Loaded model '{}' from {:?} (taxonomy={}, threshold={})",
            model.name,
            artifact_path,
            SMOKING_TAXONOMY,
            model.threshold
        );

        Ok(model)
    }

    /// Build a model from already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError` if the artifact does not match the encoder
    /// contract or holds unusable parameters.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        if artifact.format_version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(artifact.format_version));
        }

        if artifact.smoking_taxonomy != SMOKING_TAXONOMY {
            return Err(ModelError::TaxonomyMismatch {
                expected: SMOKING_TAXONOMY,
                found: artifact.smoking_taxonomy,
            });
        }

        if artifact.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelError::FeatureOrder {
                expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
                found: artifact.feature_names,
            });
        }

        let scaler_mean: [f64; FEATURE_COUNT] = fixed("scaler_mean", &artifact.scaler_mean)?;
        let scaler_std: [f64; FEATURE_COUNT] = fixed("scaler_std", &artifact.scaler_std)?;
        let coefficients: [f64; FEATURE_COUNT] = fixed("coefficients", &artifact.coefficients)?;

        if scaler_std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(ModelError::InvalidParameter(
                "scaler_std values must be finite and positive".into(),
            ));
        }
        if scaler_mean
            .iter()
            .chain(coefficients.iter())
            .chain(std::iter::once(&artifact.intercept))
            .any(|v| !v.is_finite())
        {
            return Err(ModelError::InvalidParameter(
                "scaler_mean, coefficients and intercept must be finite".into(),
            ));
        }
        if !(artifact.threshold > 0.0 && artifact.threshold < 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "threshold {} must be inside (0, 1)",
                artifact.threshold
            )));
        }

        Ok(Self {
            name: artifact.name,
            scaler_mean,
            scaler_std,
            coefficients,
            intercept: artifact.intercept,
            threshold: artifact.threshold,
            sha256: None,
        })
    }

    /// SHA-256 of the artifact bytes, when loaded from disk.
    #[must_use]
    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Positive-class probability for one feature vector.
    ///
    /// # Errors
    /// Returns `ClassifierError::NonFinite` if the linear score overflows.
    pub fn probability(&self, features: &FeatureVector) -> Result<f64, ClassifierError> {
        let z = features
            .as_array()
            .iter()
            .zip(self.scaler_mean.iter())
            .zip(self.scaler_std.iter())
            .zip(self.coefficients.iter())
            .fold(self.intercept, |acc, (((x, mean), std), coef)| {
                acc + coef * (x - mean) / std
            });

        if !z.is_finite() {
            return Err(ClassifierError::NonFinite);
        }
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl RiskClassifier for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError> {
        let p = self.probability(features)?;
        tracing::debug!("Model '{}' probability={:.3}", self.name, p);
        Ok(i64::from(p >= self.threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{encode, PatientInput};
    use tempfile::tempdir;

    fn artifact(coefficients: [f64; FEATURE_COUNT], intercept: f64) -> ModelArtifact {
        ModelArtifact {
            format_version: FORMAT_VERSION,
            name: "test-model".into(),
            smoking_taxonomy: SMOKING_TAXONOMY.into(),
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            scaler_mean: vec![0.0; FEATURE_COUNT],
            scaler_std: vec![1.0; FEATURE_COUNT],
            coefficients: coefficients.to_vec(),
            intercept,
            threshold: 0.5,
        }
    }

    fn write_artifact(path: &Path, artifact: &ModelArtifact) -> Vec<u8> {
        let bytes = serde_json::to_vec_pretty(artifact).expect("serialize artifact");
        std::fs::write(path, &bytes).expect("write artifact");
        bytes
    }

    #[test]
    fn test_load_from_directory() {
        let temp = tempdir().expect("tempdir");
        write_artifact(&temp.path().join(MODEL_FILE_NAME), &artifact([0.0; 8], 0.0));

        let model = LinearModel::load(temp.path(), None).expect("load model");
        assert_eq!(model.name(), "test-model");
        assert_eq!(model.sha256().map(str::len), Some(64));
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let temp = tempdir().expect("tempdir");
        let err = LinearModel::load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_load_checks_sha256_pin() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("custom.json");
        let bytes = write_artifact(&path, &artifact([0.0; 8], 0.0));

        let good = sha256_hex(&bytes).to_ascii_uppercase();
        assert!(LinearModel::load(&path, Some(&good)).is_ok());

        let bad = "0".repeat(64);
        let err = LinearModel::load(&path, Some(&bad)).unwrap_err();
        assert!(matches!(err, ModelError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_rejects_permuted_feature_order() {
        let mut a = artifact([0.0; 8], 0.0);
        a.feature_names.swap(6, 7);
        let err = LinearModel::from_artifact(a).unwrap_err();
        assert!(matches!(err, ModelError::FeatureOrder { .. }));
    }

    #[test]
    fn test_rejects_other_smoking_taxonomy() {
        let mut a = artifact([0.0; 8], 0.0);
        a.smoking_taxonomy = "smoking-5way".into();
        let err = LinearModel::from_artifact(a).unwrap_err();
        assert!(err.to_string().contains("smoking-5way"));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut a = artifact([0.0; 8], 0.0);
        a.coefficients.pop();
        assert!(matches!(
            LinearModel::from_artifact(a).unwrap_err(),
            ModelError::ParameterLength {
                name: "coefficients",
                got: 7
            }
        ));

        let mut a = artifact([0.0; 8], 0.0);
        a.scaler_std[3] = 0.0;
        assert!(matches!(
            LinearModel::from_artifact(a).unwrap_err(),
            ModelError::InvalidParameter(_)
        ));

        let mut a = artifact([0.0; 8], 0.0);
        a.threshold = 1.0;
        assert!(LinearModel::from_artifact(a).is_err());

        let mut a = artifact([0.0; 8], 0.0);
        a.format_version = 2;
        assert!(matches!(
            LinearModel::from_artifact(a).unwrap_err(),
            ModelError::UnsupportedVersion(2)
        ));
    }

    #[test]
    fn test_predict_uses_threshold() {
        // Only HbA1c carries weight: z = 2 * (hba1c - 6.0)
        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients[6] = 2.0;
        let mut a = artifact(coefficients, 0.0);
        a.scaler_mean[6] = 6.0;
        let model = LinearModel::from_artifact(a).expect("valid artifact");

        let high = PatientInput {
            hba1c: 7.2,
            ..PatientInput::default()
        };
        let low = PatientInput {
            hba1c: 5.0,
            ..PatientInput::default()
        };
        assert_eq!(model.predict(&encode(&high)).expect("predict"), 1);
        assert_eq!(model.predict(&encode(&low)).expect("predict"), 0);

        let p = model.probability(&encode(&low)).expect("probability");
        assert!(p > 0.0 && p < 0.5);
    }

    #[test]
    fn test_predict_reports_non_finite_score() {
        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients[1] = f64::MAX;
        let mut a = artifact([0.0; 8], 0.0);
        a.coefficients = coefficients.to_vec();
        let model = LinearModel::from_artifact(a).expect("finite parameters");

        let input = PatientInput {
            age: 90,
            ..PatientInput::default()
        };
        let err = model.predict(&encode(&input)).unwrap_err();
        assert!(matches!(err, ClassifierError::NonFinite));
    }

    #[test]
    fn test_bundled_model_loads() {
        let model = LinearModel::load(Path::new("models"), None).expect("bundled model loads");
        assert!(model.threshold() > 0.0);
    }
}
