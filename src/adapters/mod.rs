//! Adapters layer: concrete implementations of ports.
//!
//! - `linear`: logistic-regression model loaded from a JSON artifact
//! - `sanitize`: health-data filtering for logs

pub mod linear;
pub mod sanitize;

pub use linear::{LinearModel, ModelError};
