//! Questionnaire form: three sections of selectors and numeric inputs.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    BodyMeasurements, Bounds, Category, Finding, Gender, PatientInput, SmokingHistory,
    ValidationError, ValidationErrors, AGE_BOUNDS, GLUCOSE_BOUNDS,
};
use crate::tui::styles::MedicalTheme;

/// How BMI is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BmiMode {
    #[default]
    Direct,
    FromMeasurements,
}

impl BmiMode {
    fn toggle(self) -> Self {
        match self {
            Self::Direct => Self::FromMeasurements,
            Self::FromMeasurements => Self::Direct,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Direct => "enter BMI",
            Self::FromMeasurements => "height + weight",
        }
    }
}

/// One input on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Gender,
    Age,
    Hypertension,
    HeartDisease,
    SmokingHistory,
    BmiMode,
    Bmi,
    HeightCm,
    WeightKg,
    BloodGlucose,
    Hba1c,
}

impl Field {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::Hypertension => "Hypertension",
            Self::HeartDisease => "Heart Disease",
            Self::SmokingHistory => "Smoking History",
            Self::BmiMode => "BMI Input",
            Self::Bmi => "BMI",
            Self::HeightCm => "Height",
            Self::WeightKg => "Weight",
            Self::BloodGlucose => "Blood Glucose",
            Self::Hba1c => "HbA1c",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::Age => "years (0-120)",
            Self::Bmi => "kg/m² (10-50)",
            Self::HeightCm => "cm (50-250)",
            Self::WeightKg => "kg (10-300)",
            Self::BloodGlucose => "mg/dL (50-300)",
            Self::Hba1c => "% (3-15), ≥6.5% is considered diabetic",
            _ => "",
        }
    }

    /// Selector fields cycle with ←/→ instead of taking typed input.
    #[must_use]
    pub fn is_selector(self) -> bool {
        matches!(
            self,
            Self::Gender
                | Self::Hypertension
                | Self::HeartDisease
                | Self::SmokingHistory
                | Self::BmiMode
        )
    }
}

/// Form sections, in display order.
const SECTIONS: [(&str, &[Field]); 3] = [
    ("Demographics", &[Field::Gender, Field::Age]),
    (
        "Medical History",
        &[Field::Hypertension, Field::HeartDisease, Field::SmokingHistory],
    ),
    (
        "Health Metrics",
        &[
            Field::BmiMode,
            Field::Bmi,
            Field::HeightCm,
            Field::WeightKg,
            Field::BloodGlucose,
            Field::Hba1c,
        ],
    ),
];

/// Patient form state
pub struct PatientFormState {
    pub gender: Gender,
    pub hypertension: Finding,
    pub heart_disease: Finding,
    pub smoking_history: SmokingHistory,
    pub bmi_mode: BmiMode,
    pub age: String,
    pub bmi: String,
    pub height_cm: String,
    pub weight_kg: String,
    pub blood_glucose: String,
    pub hba1c: String,
    pub selected: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        Self::from_input(&PatientInput::default())
    }
}

impl PatientFormState {
    /// Form pre-filled with earlier answers.
    #[must_use]
    pub fn from_input(input: &PatientInput) -> Self {
        Self {
            gender: input.gender,
            hypertension: input.hypertension,
            heart_disease: input.heart_disease,
            smoking_history: input.smoking_history,
            bmi_mode: BmiMode::Direct,
            age: input.age.to_string(),
            bmi: format_decimal(input.bmi),
            height_cm: String::new(),
            weight_kg: String::new(),
            blood_glucose: input.blood_glucose.to_string(),
            hba1c: format_decimal(input.hba1c),
            selected: 0,
            error_message: None,
        }
    }

    /// Fields currently on screen; BMI or height and weight depending on mode.
    #[must_use]
    pub fn visible_fields(&self) -> Vec<Field> {
        SECTIONS
            .iter()
            .flat_map(|(_, fields)| fields.iter().copied())
            .filter(|field| self.is_visible(*field))
            .collect()
    }

    fn is_visible(&self, field: Field) -> bool {
        match field {
            Field::Bmi => self.bmi_mode == BmiMode::Direct,
            Field::HeightCm | Field::WeightKg => self.bmi_mode == BmiMode::FromMeasurements,
            _ => true,
        }
    }

    #[must_use]
    pub fn selected_field(&self) -> Field {
        let fields = self.visible_fields();
        fields[self.selected.min(fields.len() - 1)]
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % self.visible_fields().len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        let len = self.visible_fields().len();
        self.selected = (self.selected + len - 1) % len;
    }

    /// Cycle the selected selector field.
    pub fn cycle(&mut self, forward: bool) {
        fn step<T: Category>(value: T, forward: bool) -> T {
            if forward {
                value.next()
            } else {
                value.prev()
            }
        }

        match self.selected_field() {
            Field::Gender => self.gender = step(self.gender, forward),
            Field::Hypertension => self.hypertension = step(self.hypertension, forward),
            Field::HeartDisease => self.heart_disease = step(self.heart_disease, forward),
            Field::SmokingHistory => self.smoking_history = step(self.smoking_history, forward),
            Field::BmiMode => self.bmi_mode = self.bmi_mode.toggle(),
            _ => return,
        }
        self.error_message = None;
    }

    fn buffer_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Age => Some(&mut self.age),
            Field::Bmi => Some(&mut self.bmi),
            Field::HeightCm => Some(&mut self.height_cm),
            Field::WeightKg => Some(&mut self.weight_kg),
            Field::BloodGlucose => Some(&mut self.blood_glucose),
            Field::Hba1c => Some(&mut self.hba1c),
            _ => None,
        }
    }

    fn buffer(&self, field: Field) -> Option<&str> {
        match field {
            Field::Age => Some(&self.age),
            Field::Bmi => Some(&self.bmi),
            Field::HeightCm => Some(&self.height_cm),
            Field::WeightKg => Some(&self.weight_kg),
            Field::BloodGlucose => Some(&self.blood_glucose),
            Field::Hba1c => Some(&self.hba1c),
            _ => None,
        }
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        if !(c.is_ascii_digit() || c == '.') {
            return;
        }
        let field = self.selected_field();
        if let Some(buffer) = self.buffer_mut(field) {
            buffer.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = self.selected_field();
        if let Some(buffer) = self.buffer_mut(field) {
            buffer.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = self.selected_field();
        if let Some(buffer) = self.buffer_mut(field) {
            buffer.clear();
        }
    }

    /// BMI derived from height and weight, when both parse and are in range.
    #[must_use]
    pub fn derived_bmi(&self) -> Option<f64> {
        let measurements = BodyMeasurements {
            height_cm: self.height_cm.trim().parse().ok()?,
            weight_kg: self.weight_kg.trim().parse().ok()?,
        };
        measurements.bmi().ok()
    }

    /// Wipe all field buffers from memory and reset to the defaults.
    ///
    /// Called as soon as an assessment starts so typed answers do not stay
    /// in the UI state.
    pub fn clear_sensitive(&mut self) {
        for buffer in [
            &mut self.age,
            &mut self.bmi,
            &mut self.height_cm,
            &mut self.weight_kg,
            &mut self.blood_glucose,
            &mut self.hba1c,
        ] {
            buffer.zeroize();
        }
        *self = Self::default();
    }

    /// Parse and validate every field.
    ///
    /// # Errors
    /// Returns all problems at once: missing or malformed numbers and
    /// out-of-range values.
    pub fn to_input(&self) -> Result<PatientInput, ValidationErrors> {
        let mut errors = Vec::new();

        let age: Option<u8> = parse_whole(&self.age, "age", AGE_BOUNDS, &mut errors);
        let blood_glucose: Option<u16> =
            parse_whole(&self.blood_glucose, "blood_glucose", GLUCOSE_BOUNDS, &mut errors);
        let hba1c = parse_decimal(&self.hba1c, "hba1c", &mut errors);

        let bmi = match self.bmi_mode {
            BmiMode::Direct => parse_decimal(&self.bmi, "bmi", &mut errors),
            BmiMode::FromMeasurements => {
                let height_cm = parse_decimal(&self.height_cm, "height_cm", &mut errors);
                let weight_kg = parse_decimal(&self.weight_kg, "weight_kg", &mut errors);
                match (height_cm, weight_kg) {
                    (Some(height_cm), Some(weight_kg)) => {
                        match (BodyMeasurements {
                            height_cm,
                            weight_kg,
                        })
                        .bmi()
                        {
                            Ok(bmi) => Some(bmi),
                            Err(e) => {
                                errors.extend(e.0);
                                None
                            }
                        }
                    }
                    _ => None,
                }
            }
        };

        let input = match (age, bmi, blood_glucose, hba1c) {
            (Some(age), Some(bmi), Some(blood_glucose), Some(hba1c)) if errors.is_empty() => {
                PatientInput {
                    gender: self.gender,
                    age,
                    hypertension: self.hypertension,
                    heart_disease: self.heart_disease,
                    smoking_history: self.smoking_history,
                    bmi,
                    blood_glucose,
                    hba1c,
                }
            }
            _ => return Err(ValidationErrors(errors)),
        };

        input.validate()?;
        Ok(input)
    }

    /// Load a sample patient (elevated glucose and HbA1c).
    pub fn load_sample_data(&mut self) {
        *self = Self::from_input(&PatientInput {
            gender: Gender::Female,
            age: 54,
            hypertension: Finding::Positive,
            heart_disease: Finding::Negative,
            smoking_history: SmokingHistory::Past,
            bmi: 29.4,
            blood_glucose: 140,
            hba1c: 6.1,
        });
    }
}

/// Whole numbers keep one decimal place, as the form widgets show them.
fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn parse_whole<T>(
    raw: &str,
    field: &'static str,
    bounds: Bounds,
    errors: &mut Vec<ValidationError>,
) -> Option<T>
where
    T: TryFrom<u32>,
{
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(ValidationError::Missing { field });
        return None;
    }
    let Ok(value) = raw.parse::<u32>() else {
        errors.push(ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        });
        return None;
    };
    if let Err(e) = bounds.check(field, f64::from(value)) {
        errors.push(e);
        return None;
    }
    T::try_from(value).ok()
}

fn parse_decimal(raw: &str, field: &'static str, errors: &mut Vec<ValidationError>) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(ValidationError::Missing { field });
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(ValidationError::NotANumber {
                field,
                value: raw.to_string(),
            });
            None
        }
    }
}

/// Render the questionnaire form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_sections(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Diabetes Risk Assessment", MedicalTheme::title()),
        Span::styled(
            " │ Answer the questions below",
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

fn render_form_sections(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let selected = state.selected_field();

    let mut lines = Vec::new();
    for (title, fields) in SECTIONS {
        lines.push(Line::from(Span::styled(
            format!(" {title}"),
            MedicalTheme::subtitle(),
        )));
        for field in fields.iter().copied().filter(|candidate| state.is_visible(*candidate)) {
            lines.push(field_line(state, field, field == selected));
        }
        if fields.contains(&Field::WeightKg) && state.bmi_mode == BmiMode::FromMeasurements {
            let derived = state
                .derived_bmi()
                .map_or_else(|| "-".to_string(), |bmi| format!("{bmi:.2}"));
            lines.push(Line::from(vec![
                Span::styled(format!("   {:<18}", "Calculated BMI"), MedicalTheme::text_muted()),
                Span::styled(derived, MedicalTheme::text_secondary()),
            ]));
        }
        lines.push(Line::from(""));
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );

    f.render_widget(form, area);
}

fn field_line(state: &PatientFormState, field: Field, is_selected: bool) -> Line<'_> {
    let label_style = if is_selected {
        MedicalTheme::focused()
    } else {
        MedicalTheme::text_secondary()
    };
    let marker = if is_selected { " ▶ " } else { "   " };

    let mut spans = vec![
        Span::styled(marker, MedicalTheme::cursor()),
        Span::styled(format!("{:<18}", field.label()), label_style),
    ];

    if field.is_selector() {
        let value = match field {
            Field::Gender => state.gender.label(),
            Field::Hypertension => state.hypertension.label(),
            Field::HeartDisease => state.heart_disease.label(),
            Field::SmokingHistory => state.smoking_history.label(),
            _ => state.bmi_mode.label(),
        };
        if is_selected {
            spans.push(Span::styled("◀ ", MedicalTheme::cursor()));
            spans.push(Span::styled(value, MedicalTheme::text()));
            spans.push(Span::styled(" ▶", MedicalTheme::cursor()));
        } else {
            spans.push(Span::styled(value, MedicalTheme::text()));
        }
    } else {
        let buffer = state.buffer(field).unwrap_or_default();
        if buffer.is_empty() {
            spans.push(Span::styled(field.hint(), MedicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(buffer, MedicalTheme::text()));
            spans.push(Span::styled(
                format!("  {}", field.hint()),
                MedicalTheme::text_muted(),
            ));
        }
        if is_selected {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }
    }

    Line::from(spans)
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Change ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
