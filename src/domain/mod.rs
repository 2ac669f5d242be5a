//! Domain layer: patient input, feature encoding and metric bands.
//!
//! Pure types and functions with no I/O. Everything here is deterministic
//! apart from the request id and timestamp on [`PredictionResult`].

mod bands;
pub mod features;
mod patient;
mod prediction;

pub use bands::{Band, BandAnnotations, BandEntry, BmiBand, GlucoseBand, Hba1cBand, Severity};
pub use features::{
    encode, DecodedCategories, Encode, FeatureCountError, FeatureVector, FEATURE_COUNT,
    FEATURE_NAMES, SMOKING_TAXONOMY,
};
pub use patient::{
    round2, BodyMeasurements, Bounds, Category, Finding, Gender, PatientDocument, PatientInput,
    SmokingHistory, ValidationError, ValidationErrors, AGE_BOUNDS, BMI_BOUNDS, GLUCOSE_BOUNDS,
    HBA1C_BOUNDS, HEIGHT_CM_BOUNDS, WEIGHT_KG_BOUNDS,
};
pub use prediction::{PredictionResult, RiskLabel};
