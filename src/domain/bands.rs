//! Threshold bands for BMI, blood glucose and HbA1c.
//!
//! These are display-only guidance labels. They are computed from the raw
//! metrics and never feed into the risk model.
//!
//! Listed upper bounds (24.9, 29.9, 125, 6.4, ...) are inclusive. A value in
//! the gap between one band's listed upper bound and the next band's lower
//! bound stays in the lower band, so every real input lands in exactly one
//! band. NaN lands in the highest band.

use std::fmt;

use serde::Serialize;

use super::patient::PatientInput;

/// How a band should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Healthy,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Warning => write!(f, "warning"),
            Self::Danger => write!(f, "danger"),
        }
    }
}

/// A qualitative band of one metric.
pub trait Band: Copy {
    /// Metric key, e.g. `"bmi"`.
    const METRIC: &'static str;

    /// Metric name for display.
    const METRIC_NAME: &'static str;

    fn label(self) -> &'static str;

    /// Human-readable range, e.g. `"≥6.5%"`.
    fn range(self) -> &'static str;

    fn severity(self) -> Severity;

    /// Flattened view for rendering and serialization.
    fn entry(self, value: f64) -> BandEntry {
        BandEntry {
            metric: Self::METRIC,
            metric_name: Self::METRIC_NAME,
            value,
            label: self.label(),
            range: self.range(),
            severity: self.severity(),
        }
    }
}

/// Body mass index bands (kg/m²).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiBand {
    Underweight,
    Normal,
    Overweight,
    ObesityClass1,
    ObesityClass2,
    ObesityClass3,
}

impl BmiBand {
    #[must_use]
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else if bmi < 35.0 {
            Self::ObesityClass1
        } else if bmi < 40.0 {
            Self::ObesityClass2
        } else {
            Self::ObesityClass3
        }
    }
}

impl Band for BmiBand {
    const METRIC: &'static str = "bmi";
    const METRIC_NAME: &'static str = "BMI";

    fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::ObesityClass1 => "Obesity (Class 1)",
            Self::ObesityClass2 => "Obesity (Class 2)",
            Self::ObesityClass3 => "Obesity (Class 3)",
        }
    }

    fn range(self) -> &'static str {
        match self {
            Self::Underweight => "<18.5",
            Self::Normal => "18.5-24.9",
            Self::Overweight => "25-29.9",
            Self::ObesityClass1 => "30-34.9",
            Self::ObesityClass2 => "35-39.9",
            Self::ObesityClass3 => "≥40",
        }
    }

    fn severity(self) -> Severity {
        match self {
            Self::Normal => Severity::Healthy,
            Self::Underweight | Self::Overweight => Severity::Warning,
            Self::ObesityClass1 | Self::ObesityClass2 | Self::ObesityClass3 => Severity::Danger,
        }
    }
}

/// Blood glucose bands (mg/dL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseBand {
    Normal,
    PreDiabetes,
    DiabeticRange,
}

impl GlucoseBand {
    #[must_use]
    pub fn classify(mg_dl: f64) -> Self {
        if mg_dl <= 100.0 {
            Self::Normal
        } else if mg_dl < 126.0 {
            Self::PreDiabetes
        } else {
            Self::DiabeticRange
        }
    }
}

impl Band for GlucoseBand {
    const METRIC: &'static str = "blood_glucose";
    const METRIC_NAME: &'static str = "Blood Glucose";

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::PreDiabetes => "Pre-diabetes",
            Self::DiabeticRange => "Diabetic range",
        }
    }

    fn range(self) -> &'static str {
        match self {
            Self::Normal => "≤100 mg/dL",
            Self::PreDiabetes => "101-125 mg/dL",
            Self::DiabeticRange => "≥126 mg/dL",
        }
    }

    fn severity(self) -> Severity {
        match self {
            Self::Normal => Severity::Healthy,
            Self::PreDiabetes => Severity::Warning,
            Self::DiabeticRange => Severity::Danger,
        }
    }
}

/// HbA1c bands (%).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hba1cBand {
    Normal,
    PreDiabetes,
    Diabetes,
}

impl Hba1cBand {
    #[must_use]
    pub fn classify(percent: f64) -> Self {
        if percent < 5.7 {
            Self::Normal
        } else if percent < 6.5 {
            Self::PreDiabetes
        } else {
            Self::Diabetes
        }
    }
}

impl Band for Hba1cBand {
    const METRIC: &'static str = "hba1c";
    const METRIC_NAME: &'static str = "HbA1c";

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::PreDiabetes => "Pre-diabetes",
            Self::Diabetes => "Diabetes",
        }
    }

    fn range(self) -> &'static str {
        match self {
            Self::Normal => "<5.7%",
            Self::PreDiabetes => "5.7-6.4%",
            Self::Diabetes => "≥6.5%",
        }
    }

    fn severity(self) -> Severity {
        match self {
            Self::Normal => Severity::Healthy,
            Self::PreDiabetes => Severity::Warning,
            Self::Diabetes => Severity::Danger,
        }
    }
}

macro_rules! impl_band_display {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{} ({})", self.label(), self.range())
                }
            }
        )+
    };
}

impl_band_display!(BmiBand, GlucoseBand, Hba1cBand);

/// One metric's band, flattened for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandEntry {
    pub metric: &'static str,
    pub metric_name: &'static str,
    pub value: f64,
    pub label: &'static str,
    pub range: &'static str,
    pub severity: Severity,
}

/// Bands for all three metrics of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "Vec<BandEntry>")]
pub struct BandAnnotations {
    pub bmi: (f64, BmiBand),
    pub blood_glucose: (f64, GlucoseBand),
    pub hba1c: (f64, Hba1cBand),
}

impl BandAnnotations {
    #[must_use]
    pub fn for_values(bmi: f64, blood_glucose: f64, hba1c: f64) -> Self {
        Self {
            bmi: (bmi, BmiBand::classify(bmi)),
            blood_glucose: (blood_glucose, GlucoseBand::classify(blood_glucose)),
            hba1c: (hba1c, Hba1cBand::classify(hba1c)),
        }
    }

    #[must_use]
    pub fn for_input(input: &PatientInput) -> Self {
        Self::for_values(input.bmi, f64::from(input.blood_glucose), input.hba1c)
    }

    /// BMI, glucose, HbA1c, in that order.
    #[must_use]
    pub fn entries(&self) -> [BandEntry; 3] {
        [
            self.bmi.1.entry(self.bmi.0),
            self.blood_glucose.1.entry(self.blood_glucose.0),
            self.hba1c.1.entry(self.hba1c.0),
        ]
    }

    /// Highest severity across the three metrics.
    #[must_use]
    pub fn worst(&self) -> Severity {
        self.entries()
            .iter()
            .map(|e| e.severity)
            .max()
            .unwrap_or(Severity::Healthy)
    }
}

impl From<BandAnnotations> for Vec<BandEntry> {
    fn from(bands: BandAnnotations) -> Self {
        bands.entries().to_vec()
    }
}
