//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration
//! - Background assessment via worker thread

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::LinearModel;
use crate::application::AssessmentService;
use crate::config::AppConfig;
use crate::domain::PatientInput;
use crate::ports::RiskClassifier;

use super::ui::{
    form::{render_patient_form, PatientFormState},
    render_disclaimer,
    result::{render_assessment, AssessmentState},
};
use super::worker::{AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Assessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssessmentPhase {
    Encoding,
    Predicting,
}

/// Main application state
pub struct App<C: RiskClassifier + 'static> {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    service: AssessmentService<C>,

    /// Minimum time the loading state stays visible
    min_latency: Duration,

    form_state: PatientFormState,

    assessment_state: AssessmentState,

    /// Answers of the running or shown assessment, for [B]ack
    submitted: Option<PatientInput>,

    /// Pending assessment worker (if running)
    pending_worker: Option<AssessmentWorkerHandle>,

    /// Current phase (for progress animation)
    phase: Option<AssessmentPhase>,

    /// When the current phase started (for progress animation)
    phase_started_at: Option<Instant>,
}

impl App<LinearModel> {
    /// Create the application with the model named by `config`.
    ///
    /// # Errors
    /// Returns a fatal `GlycocheckError::Model` if the artifact cannot be
    /// loaded or verified; the UI never starts without a model.
    pub fn new(config: &AppConfig) -> crate::Result<Self> {
        let model = LinearModel::load(&config.model_path, config.model_sha256.as_deref())?;
        let service = AssessmentService::new(Arc::new(model));
        Ok(Self::with_dependencies(service, config.min_perceived_latency))
    }
}

impl<C: RiskClassifier + 'static> App<C> {
    /// Create application with an injected service (Composition Root pattern).
    pub fn with_dependencies(service: AssessmentService<C>, min_latency: Duration) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            service,
            min_latency,
            form_state: PatientFormState::default(),
            assessment_state: AssessmentState::default(),
            submitted: None,
            pending_worker: None,
            phase: None,
            phase_started_at: None,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();
            self.tick_progress();

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(2)])
                    .split(f.area());

                match self.screen {
                    Screen::Form => render_patient_form(f, chunks[0], &self.form_state),
                    Screen::Assessment => render_assessment(
                        f,
                        chunks[0],
                        &self.assessment_state,
                        self.service.classifier_name(),
                    ),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            // Short poll to keep the progress bar moving
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Poll the background worker for progress updates.
    fn poll_worker(&mut self) {
        loop {
            // Take the message out before mutating `self`.
            let Some(progress) = self
                .pending_worker
                .as_ref()
                .and_then(AssessmentWorkerHandle::try_recv)
            else {
                break;
            };

            match progress {
                AssessmentProgress::Encoding => self.set_phase(AssessmentPhase::Encoding),
                AssessmentProgress::Predicting => self.set_phase(AssessmentPhase::Predicting),
                AssessmentProgress::Complete(result) => {
                    self.assessment_state = AssessmentState::Complete {
                        result,
                        show_inputs: false,
                    };
                    self.finish_worker();
                }
                AssessmentProgress::Failed(message) => {
                    tracing::warn!("Assessment failed; staying on result screen");
                    self.assessment_state = AssessmentState::Failed { message };
                    self.finish_worker();
                }
            }
        }
    }

    fn finish_worker(&mut self) {
        self.pending_worker = None;
        self.phase = None;
        self.phase_started_at = None;
    }

    fn set_phase(&mut self, phase: AssessmentPhase) {
        let current = self.assessment_state.progress().unwrap_or(0.0);
        let (floor, _, _) = self.phase_curve(phase);
        let progress = current.max(floor);

        self.phase = Some(phase);
        self.phase_started_at = Some(Instant::now());
        self.assessment_state = match phase {
            AssessmentPhase::Encoding => AssessmentState::Encoding { progress },
            AssessmentPhase::Predicting => AssessmentState::Predicting { progress },
        };
    }

    /// (start floor, target, time constant in seconds) of the fake progress curve.
    fn phase_curve(&self, phase: AssessmentPhase) -> (f64, f64, f64) {
        match phase {
            AssessmentPhase::Encoding => (0.0, 0.30, 0.3),
            AssessmentPhase::Predicting => {
                let tau = (self.min_latency.as_secs_f64() / 3.0).max(0.3);
                (0.30, 0.95, tau)
            }
        }
    }

    fn tick_progress(&mut self) {
        if self.pending_worker.is_none() {
            return;
        }
        let (Some(phase), Some(started_at)) = (self.phase, self.phase_started_at) else {
            return;
        };
        let Some(current) = self.assessment_state.progress() else {
            return;
        };

        let elapsed = Instant::now()
            .saturating_duration_since(started_at)
            .as_secs_f64();
        let (floor, target, tau) = self.phase_curve(phase);

        // Monotonic, asymptotically approaches the phase target.
        let k = 1.0 - (-elapsed / tau).exp();
        let desired = (floor + (target - floor) * k).clamp(0.0, target);
        let progress = desired.max(current).min(target);

        self.assessment_state = match phase {
            AssessmentPhase::Encoding => AssessmentState::Encoding { progress },
            AssessmentPhase::Predicting => AssessmentState::Predicting { progress },
        };
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Assessment => self.handle_assessment_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left => self.form_state.cycle(false),
            KeyCode::Right => self.form_state.cycle(true),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form_state.load_sample_data(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_assessment_key(&mut self, key: KeyCode) {
        if self.pending_worker.is_some() {
            return;
        }

        match key {
            KeyCode::Char('i') | KeyCode::Char('I') => {
                if let AssessmentState::Complete { show_inputs, .. } = &mut self.assessment_state {
                    *show_inputs = !*show_inputs;
                }
            }
            KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Esc => {
                self.form_state = self
                    .submitted
                    .take()
                    .map(|input| PatientFormState::from_input(&input))
                    .unwrap_or_default();
                self.assessment_state = AssessmentState::Idle;
                self.screen = Screen::Form;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.submitted = None;
                self.form_state = PatientFormState::default();
                self.assessment_state = AssessmentState::Idle;
                self.screen = Screen::Form;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let input = match self.form_state.to_input() {
            Ok(input) => input,
            Err(errors) => {
                tracing::debug!("Form rejected with {} invalid field(s)", errors.0.len());
                self.form_state.error_message = Some(errors.to_string());
                return;
            }
        };

        self.screen = Screen::Assessment;
        self.assessment_state = AssessmentState::Encoding { progress: 0.0 };
        self.phase = Some(AssessmentPhase::Encoding);
        self.phase_started_at = Some(Instant::now());

        let worker = AssessmentWorker::spawn(self.service.clone(), input.clone(), self.min_latency);
        self.pending_worker = Some(worker);
        self.submitted = Some(input);

        // Clear typed buffers from the UI immediately.
        self.form_state.clear_sensitive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, RiskLabel};
    use crate::ports::ClassifierError;
    use std::thread;

    struct Stub(Result<i64, ClassifierError>);

    impl RiskClassifier for Stub {
        fn name(&self) -> &str {
            "stub"
        }

        fn predict(&self, _features: &FeatureVector) -> Result<i64, ClassifierError> {
            self.0.clone()
        }
    }

    fn app_with(outcome: Result<i64, ClassifierError>) -> App<Stub> {
        App::with_dependencies(
            AssessmentService::new(Arc::new(Stub(outcome))),
            Duration::ZERO,
        )
    }

    fn wait_for_worker(app: &mut App<Stub>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.pending_worker.is_some() && Instant::now() < deadline {
            app.poll_worker();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(app.pending_worker.is_none(), "worker did not finish");
    }

    fn press(app: &mut App<Stub>, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_invalid_form_stays_on_form() {
        let mut app = app_with(Ok(1));
        app.form_state.age = "200".into();

        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Form);
        assert!(app.pending_worker.is_none());
        let message = app.form_state.error_message.clone().unwrap_or_default();
        assert!(message.contains("age"));
    }

    #[test]
    fn test_submit_shows_result_and_back_keeps_inputs() {
        let mut app = app_with(Ok(1));
        press(&mut app, KeyCode::Char('S'));
        let expected = app.form_state.to_input().expect("sample is valid");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Assessment);
        assert_eq!(app.form_state.to_input(), Ok(PatientInput::default()));

        wait_for_worker(&mut app);
        match &app.assessment_state {
            AssessmentState::Complete {
                result,
                show_inputs,
            } => {
                assert_eq!(result.label, RiskLabel::Risk);
                assert!(!show_inputs);
            }
            other => panic!("unexpected state: {other:?}"),
        }

        press(&mut app, KeyCode::Char('i'));
        assert!(matches!(
            app.assessment_state,
            AssessmentState::Complete {
                show_inputs: true,
                ..
            }
        ));

        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.screen(), Screen::Form);
        assert_eq!(app.form_state.to_input(), Ok(expected));
    }

    #[test]
    fn test_new_assessment_resets_form() {
        let mut app = app_with(Ok(0));
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        wait_for_worker(&mut app);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Form);
        assert_eq!(app.form_state.to_input(), Ok(PatientInput::default()));
        assert!(app.submitted.is_none());
    }

    #[test]
    fn test_classifier_failure_keeps_app_running() {
        let mut app = app_with(Err(ClassifierError::Failed("boom".into())));
        press(&mut app, KeyCode::Enter);
        wait_for_worker(&mut app);

        match &app.assessment_state {
            AssessmentState::Failed { message } => assert!(message.contains("boom")),
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(!app.should_quit());

        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.screen(), Screen::Form);
    }

    #[test]
    fn test_keys_ignored_while_running() {
        let mut app = App::with_dependencies(
            AssessmentService::new(Arc::new(Stub(Ok(0)))),
            Duration::from_millis(200),
        );
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.screen(), Screen::Assessment);

        app.tick_progress();
        let progress = app.assessment_state.progress().unwrap_or(0.0);
        assert!((0.0..=0.95).contains(&progress));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(Ok(0));
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit());

        let mut app = app_with(Ok(0));
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit());
    }
}
