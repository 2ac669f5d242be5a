//! Assessment service: turns one form submission into a prediction.
//!
//! This service coordinates:
//! - Input validation
//! - Feature encoding
//! - Classifier invocation
//! - Metric banding

use std::sync::Arc;

use crate::domain::{encode, BandAnnotations, PatientInput, PredictionResult};
use crate::ports::RiskClassifier;
use crate::GlycocheckError;

/// Service for running risk assessments.
///
/// Holds no mutable state, so one instance can be shared across worker
/// threads through `Arc`.
pub struct AssessmentService<C: RiskClassifier> {
    classifier: Arc<C>,
}

impl<C: RiskClassifier> AssessmentService<C> {
    /// Create a new assessment service.
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    #[must_use]
    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Run the full pipeline for one submission.
    ///
    /// 1. Validate input ranges
    /// 2. Encode to the feature vector
    /// 3. Ask the classifier for a label
    /// 4. Attach the metric bands
    ///
    /// # Errors
    /// Returns `GlycocheckError::Validation` before the classifier is
    /// called, or `GlycocheckError::Classifier` if prediction fails.
    pub fn assess(&self, input: PatientInput) -> Result<PredictionResult, GlycocheckError> {
        self.assess_with_progress(input, || {})
    }

    /// [`assess`](Self::assess), calling `on_encoded` once the features are
    /// ready and before the classifier runs.
    ///
    /// # Errors
    /// Same as [`assess`](Self::assess). `on_encoded` is not called when
    /// validation fails.
    pub fn assess_with_progress<F>(
        &self,
        input: PatientInput,
        on_encoded: F,
    ) -> Result<PredictionResult, GlycocheckError>
    where
        F: FnOnce(),
    {
        tracing::debug!("Step 1: Validating input...");
        if let Err(errors) = input.validate() {
            tracing::info!("Rejected submission with {} invalid field(s)", errors.0.len());
            return Err(errors.into());
        }

        tracing::debug!("Step 2: Encoding features...");
        let features = encode(&input);
        on_encoded();

        tracing::debug!("Step 3: Running classifier '{}'...", self.classifier.name());
        let raw_label = self.classifier.predict(&features).map_err(|e| {
            tracing::warn!("Classifier '{}' failed: {}", self.classifier.name(), e);
            e
        })?;

        tracing::debug!("Step 4: Banding metrics...");
        let result = PredictionResult::new(input, features, raw_label);

        tracing::info!(
            "Assessment {} complete: label={}, worst band={}",
            result.id,
            result.label,
            result.bands.worst()
        );

        Ok(result)
    }

    /// Rule-based bands alone, without consulting the model.
    #[must_use]
    pub fn bands(&self, input: &PatientInput) -> BandAnnotations {
        BandAnnotations::for_input(input)
    }
}

impl<C: RiskClassifier> Clone for AssessmentService<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BmiBand, FeatureVector, Finding, Gender, GlucoseBand, Hba1cBand, RiskLabel, Severity,
        SmokingHistory, ValidationError,
    };
    use crate::ports::ClassifierError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier(i64);

    impl RiskClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &FeatureVector) -> Result<i64, ClassifierError> {
            Ok(self.0)
        }
    }

    struct FailingClassifier;

    impl RiskClassifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _features: &FeatureVector) -> Result<i64, ClassifierError> {
            Err(ClassifierError::Failed("model exploded".into()))
        }
    }

    #[derive(Default)]
    struct CountingClassifier {
        calls: AtomicUsize,
    }

    impl RiskClassifier for CountingClassifier {
        fn name(&self) -> &str {
            "counting"
        }

        fn predict(&self, _features: &FeatureVector) -> Result<i64, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    fn scenario() -> PatientInput {
        PatientInput {
            gender: Gender::Male,
            age: 45,
            hypertension: Finding::Positive,
            heart_disease: Finding::Negative,
            smoking_history: SmokingHistory::Current,
            bmi: 31.0,
            blood_glucose: 210,
            hba1c: 7.2,
        }
    }

    #[test]
    fn test_scenario_with_risk_label() {
        let service = AssessmentService::new(Arc::new(FixedClassifier(1)));
        let result = service.assess(scenario()).expect("Should assess");

        assert_eq!(result.label, RiskLabel::Risk);
        assert_eq!(result.raw_label, 1);
        assert_eq!(
            result.features.as_slice(),
            &[1.0, 45.0, 1.0, 0.0, 1.0, 31.0, 7.2, 210.0]
        );
        assert_eq!(result.bands.bmi.1, BmiBand::ObesityClass1);
        assert_eq!(result.bands.blood_glucose.1, GlucoseBand::DiabeticRange);
        assert_eq!(result.bands.hba1c.1, Hba1cBand::Diabetes);
        assert_eq!(result.input, scenario());
    }

    #[test]
    fn test_bands_ignore_classifier_output() {
        let no_risk = AssessmentService::new(Arc::new(FixedClassifier(0)))
            .assess(scenario())
            .expect("Should assess");

        assert_eq!(no_risk.label, RiskLabel::NoRisk);
        assert!(no_risk
            .bands
            .entries()
            .iter()
            .all(|entry| entry.severity == Severity::Danger));
    }

    #[test]
    fn test_validation_never_reaches_classifier() {
        let classifier = Arc::new(CountingClassifier::default());
        let service = AssessmentService::new(Arc::clone(&classifier));

        let input = PatientInput {
            bmi: 75.0,
            hba1c: f64::NAN,
            ..scenario()
        };
        let err = service.assess(input).unwrap_err();

        match err {
            GlycocheckError::Validation(errors) => {
                assert_eq!(errors.0.len(), 2);
                assert!(matches!(
                    errors.0[0],
                    ValidationError::OutOfRange { field: "bmi", .. }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);

        service.assess(scenario()).expect("Should assess");
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_progress_callback_runs_between_encoding_and_prediction() {
        let classifier = Arc::new(CountingClassifier::default());
        let service = AssessmentService::new(Arc::clone(&classifier));

        let mut calls_when_encoded = None;
        service
            .assess_with_progress(scenario(), || {
                calls_when_encoded = Some(classifier.calls.load(Ordering::SeqCst));
            })
            .expect("Should assess");
        assert_eq!(calls_when_encoded, Some(0));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);

        let mut encoded = false;
        let invalid = PatientInput {
            age: 130,
            ..scenario()
        };
        assert!(service
            .assess_with_progress(invalid, || encoded = true)
            .is_err());
        assert!(!encoded);
    }

    #[test]
    fn test_classifier_failure_is_per_request() {
        let service = AssessmentService::new(Arc::new(FailingClassifier));
        let err = service.assess(scenario()).unwrap_err();

        assert!(matches!(err, GlycocheckError::Classifier(_)));
        assert!(!err.is_fatal());
        assert_eq!(service.classifier_name(), "failing");
    }

    #[test]
    fn test_bands_without_model() {
        let service = AssessmentService::new(Arc::new(FailingClassifier));
        let bands = service.bands(&PatientInput::default());

        assert_eq!(bands.bmi.1, BmiBand::Overweight);
        assert_eq!(bands.blood_glucose.1, GlucoseBand::Normal);
        assert_eq!(bands.hba1c.1, Hba1cBand::Normal);
    }
}
