//! Ports layer: trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the application and the pre-trained risk model.

mod classifier;

pub use classifier::{ClassifierError, RiskClassifier};
