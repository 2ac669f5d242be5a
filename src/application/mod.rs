//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with the classifier port to
//! implement the assessment use case.

mod assessment;

pub use assessment::AssessmentService;
