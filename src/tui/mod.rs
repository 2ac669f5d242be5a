//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - Questionnaire form (demographics, medical history, health metrics)
//! - Assessment progress and result view with metric bands

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
pub use worker::{remaining_latency, AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};
