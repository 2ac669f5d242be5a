//! Assessment progress and result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{round2, BandEntry, PredictionResult};
use crate::tui::styles::MedicalTheme;

/// Assessment screen state
#[derive(Debug, Clone, Default)]
pub enum AssessmentState {
    /// Not started
    #[default]
    Idle,
    /// Encoding answers
    Encoding { progress: f64 },
    /// Classifier running, or result held for the minimum latency
    Predicting { progress: f64 },
    /// Completed with result
    Complete {
        result: Box<PredictionResult>,
        show_inputs: bool,
    },
    /// Classifier failed for this request
    Failed { message: String },
}

impl AssessmentState {
    /// Progress of a running assessment, if any.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        match self {
            Self::Encoding { progress } | Self::Predicting { progress } => Some(*progress),
            _ => None,
        }
    }
}

/// Render the assessment screen
pub fn render_assessment(f: &mut Frame, area: Rect, state: &AssessmentState, model_name: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], model_name);
    match state {
        AssessmentState::Idle => {}
        AssessmentState::Encoding { progress } => {
            render_progress(f, chunks[1], "Encoding", *progress, "Preparing your answers...")
        }
        AssessmentState::Predicting { progress } => render_progress(
            f,
            chunks[1],
            "Predicting",
            *progress,
            "Analyzing your data...",
        ),
        AssessmentState::Complete {
            result,
            show_inputs,
        } => render_result(f, chunks[1], result, *show_inputs),
        AssessmentState::Failed { message } => render_error(f, chunks[1], message),
    }
    render_footer(f, chunks[2], state);
}

fn render_header(f: &mut Frame, area: Rect, model_name: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Prediction Result", MedicalTheme::title()),
        Span::styled(
            format!(" │ Model: {model_name}"),
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_progress(f: &mut Frame, area: Rect, stage: &str, progress: f64, description: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .margin(2)
        .split(area);

    let stage_text = Paragraph::new(Line::from(vec![
        Span::styled("Stage: ", MedicalTheme::text_secondary()),
        Span::styled(stage, MedicalTheme::focused()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(stage_text, chunks[0]);

    let progress = progress.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::info())
        .ratio(progress)
        .label(format!("{:.0}%", progress * 100.0));
    f.render_widget(gauge, chunks[1]);

    let desc = Paragraph::new(Line::from(Span::styled(
        description,
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(desc, chunks[2]);
}

fn render_result(f: &mut Frame, area: Rect, result: &PredictionResult, show_inputs: bool) {
    let mut constraints = vec![Constraint::Length(5), Constraint::Length(6)];
    if show_inputs {
        constraints.push(Constraint::Length(10));
    }
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(area);

    render_verdict(f, chunks[0], result);
    render_bands(f, chunks[1], &result.bands.entries());
    if show_inputs {
        render_inputs(f, chunks[2], result);
    }
}

fn render_verdict(f: &mut Frame, area: Rect, result: &PredictionResult) {
    let style = MedicalTheme::verdict(result.label);

    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(result.label.headline(), style)),
        Line::from(Span::styled(
            result.label.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::severity(result.label.severity())),
    );

    f.render_widget(verdict, area);
}

fn render_bands(f: &mut Frame, area: Rect, entries: &[BandEntry]) {
    let lines: Vec<Line> = entries
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<16}", entry.metric_name),
                    MedicalTheme::text_secondary(),
                ),
                Span::styled(
                    format!("{:>8}  ", round2(entry.value).unwrap_or(entry.value)),
                    MedicalTheme::text(),
                ),
                Span::styled(
                    format!("{} ({})", entry.label, entry.range),
                    MedicalTheme::severity(entry.severity),
                ),
            ])
        })
        .collect();

    let bands = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" Health Metrics ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(bands, area);
}

fn render_inputs(f: &mut Frame, area: Rect, result: &PredictionResult) {
    let input = &result.input;
    let rows = [
        ("Gender", input.gender.to_string()),
        ("Age", input.age.to_string()),
        ("Hypertension", input.hypertension.to_string()),
        ("Heart Disease", input.heart_disease.to_string()),
        ("Smoking History", input.smoking_history.to_string()),
        ("BMI", format!("{:.2}", input.bmi)),
        ("Blood Glucose", format!("{} mg/dL", input.blood_glucose)),
        ("HbA1c", format!("{:.1}%", input.hba1c)),
    ];

    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!(" {label:<16}"), MedicalTheme::text_secondary()),
                Span::styled(value, MedicalTheme::text()),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" Your Inputs ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(panel, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_footer(f: &mut Frame, area: Rect, state: &AssessmentState) {
    let content = match state {
        AssessmentState::Complete { show_inputs, .. } => Line::from(vec![
            Span::styled("[I] ", MedicalTheme::key_hint()),
            Span::styled(
                if *show_inputs { "Hide Inputs " } else { "View Inputs " },
                MedicalTheme::key_desc(),
            ),
            Span::styled("[B] ", MedicalTheme::key_hint()),
            Span::styled("Back ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Assessment ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        AssessmentState::Failed { .. } => Line::from(vec![
            Span::styled("[B] ", MedicalTheme::key_hint()),
            Span::styled("Back ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Assessment ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![Span::styled(
            "Processing...",
            MedicalTheme::text_muted(),
        )]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
