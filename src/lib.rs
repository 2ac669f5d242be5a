//! # Glycocheck
//!
//! Diabetes risk assessment from a short health questionnaire.
//!
//! This crate provides:
//! - Encoding of questionnaire answers into the model's 8-feature vector
//! - Rule-based BMI, blood glucose and HbA1c bands with severities
//! - A pluggable risk classifier, with a logistic model loaded from JSON
//! - Terminal UI and a one-shot JSON CLI
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (patient input, features, bands, predictions)
//! - `ports`: Trait definitions for external collaborators
//! - `adapters`: Concrete implementations (logistic model, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment configuration
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{PatientInput, PredictionResult, RiskLabel};

/// Result type for Glycocheck operations
pub type Result<T> = std::result::Result<T, GlycocheckError>;

/// Main error type for Glycocheck
#[derive(Debug, thiserror::Error)]
pub enum GlycocheckError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Model unavailable: {0}")]
    Model(#[from] adapters::ModelError),

    #[error("Invalid patient data: {0}")]
    Validation(#[from] domain::ValidationErrors),

    #[error("Risk classifier failed: {0}")]
    Classifier(#[from] ports::ClassifierError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<domain::ValidationError> for GlycocheckError {
    fn from(err: domain::ValidationError) -> Self {
        Self::Validation(err.into())
    }
}

impl GlycocheckError {
    /// Startup errors: the process cannot serve any request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Model(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    #[test]
    fn test_error_classes() {
        assert!(GlycocheckError::Config("bad".into()).is_fatal());
        assert!(GlycocheckError::Model(adapters::ModelError::UnsupportedVersion(9)).is_fatal());

        let validation: GlycocheckError = ValidationError::Missing { field: "bmi" }.into();
        assert!(!validation.is_fatal());
        assert!(validation.to_string().contains("bmi"));

        assert!(!GlycocheckError::Classifier(ports::ClassifierError::NonFinite).is_fatal());
    }
}
