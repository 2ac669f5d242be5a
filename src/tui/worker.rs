//! Background assessment worker.
//!
//! Runs one assessment off the render loop and reports progress over a
//! channel. The final message is held back until the configured minimum
//! perceived latency has elapsed, so the loading state never flickers.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::application::AssessmentService;
use crate::domain::{PatientInput, PredictionResult};
use crate::ports::RiskClassifier;

/// Progress updates from the assessment worker.
#[derive(Debug, Clone)]
pub enum AssessmentProgress {
    /// Validating and encoding the answers
    Encoding,
    /// Features encoded, classifier running
    Predicting,
    /// Assessment complete
    Complete(Box<PredictionResult>),
    /// Assessment failed; the app keeps running
    Failed(String),
}

/// Handle to a running assessment worker.
pub struct AssessmentWorkerHandle {
    /// Receiver for progress updates
    pub progress_rx: Receiver<AssessmentProgress>,
    /// Thread handle (for joining)
    _handle: JoinHandle<()>,
}

impl AssessmentWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<AssessmentProgress> {
        self.progress_rx.try_recv().ok()
    }
}

/// Time still to wait before the result may be shown.
#[must_use]
pub fn remaining_latency(elapsed: Duration, min_latency: Duration) -> Duration {
    min_latency.saturating_sub(elapsed)
}

/// Assessment worker that runs the pipeline in the background.
pub struct AssessmentWorker;

impl AssessmentWorker {
    /// Spawn a background assessment.
    ///
    /// Returns a handle to receive progress updates.
    pub fn spawn<C>(
        service: AssessmentService<C>,
        input: PatientInput,
        min_latency: Duration,
    ) -> AssessmentWorkerHandle
    where
        C: RiskClassifier + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_with_progress(&service, input, min_latency, &tx);
        });

        AssessmentWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_with_progress<C: RiskClassifier>(
        service: &AssessmentService<C>,
        input: PatientInput,
        min_latency: Duration,
        tx: &Sender<AssessmentProgress>,
    ) {
        let started = Instant::now();

        // Send errors mean the UI dropped the handle; nothing left to report to.
        let _ = tx.send(AssessmentProgress::Encoding);

        let on_encoded = || {
            let _ = tx.send(AssessmentProgress::Predicting);
        };
        let outcome = match service.assess_with_progress(input, on_encoded) {
            Ok(result) => AssessmentProgress::Complete(Box::new(result)),
            Err(e) => AssessmentProgress::Failed(e.to_string()),
        };

        let wait = remaining_latency(started.elapsed(), min_latency);
        if !wait.is_zero() {
            thread::sleep(wait);
        }

        let _ = tx.send(outcome);
    }
}
