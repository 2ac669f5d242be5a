//! Log sanitization: keeps patient answers out of log files.
//!
//! Formatted log lines are scanned for health values written as
//! `key=value` or `key: value` (the shapes produced by `tracing` fields and
//! `Debug` output) and the values are replaced with `[REDACTED]`. Covered:
//! - numeric metrics (age, BMI, glucose, HbA1c, height, weight)
//! - categorical answers (gender, hypertension, heart disease, smoking)
//! - whole feature vectors
//!
//! This is a fallback. Call sites should not log patient values in the first
//! place; the writer catches `Debug` dumps and mistakes.
//!
//! Input longer than `GLYCOCHECK_SANITIZE_MAX_BYTES` (default 16 KiB) is
//! truncated before scanning.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const REDACTED: &str = "${key}${sep}[REDACTED]";

static PATTERNS: OnceLock<RedactionPatterns> = OnceLock::new();

struct RedactionPatterns {
    any: RegexSet,
    rules: Vec<Regex>,
}

fn patterns() -> &'static RedactionPatterns {
    PATTERNS.get_or_init(|| {
        let sources = [
            // Numeric metrics, optionally quoted.
            r#"(?i)(?P<key>\b(?:age|bmi|hba1c|hba1c_level|blood_glucose|blood_glucose_level|glucose|height_cm|weight_kg)\b)(?P<sep>\s*[=:]\s*)"?-?\d+(?:\.\d+)?"?"#,
            // Categorical answers: quoted labels or bare Debug variants.
            r#"(?i)(?P<key>\b(?:gender|hypertension|heart_disease|smoking_history)\b)(?P<sep>\s*[=:]\s*)(?:"[^"]*"|[A-Za-z_]+)"#,
            // Feature vectors, bare or wrapped in their Debug type name.
            r"(?i)(?P<key>\bfeatures\b)(?P<sep>\s*[=:]\s*)(?:FeatureVector\()?\[[^\]]*\]\)?",
        ];

        let any = RegexSet::new(sources).expect("Valid regex set");
        let rules = sources
            .iter()
            .map(|s| Regex::new(s).expect("Valid regex"))
            .collect();

        RedactionPatterns { any, rules }
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("GLYCOCHECK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact health values from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);
    let patterns = patterns();

    let mut out = prefix.to_string();
    for idx in patterns.any.matches(prefix).into_iter() {
        out = patterns.rules[idx].replace_all(&out, REDACTED).into_owned();
    }

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// True if `input` contains a value [`sanitize`] would redact.
#[must_use]
pub fn contains_health_data(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    patterns().any.is_match(prefix)
}

/// `MakeWriter` wrapper that sanitizes each formatted log line before it
/// reaches the inner writer.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn drain_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_complete_lines()?;

        // A single line with no newline must not grow without bound.
        if self.pending.len() > max_sanitize_bytes().saturating_mul(2) {
            let rest = std::mem::take(&mut self.pending);
            self.write_sanitized(&rest)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_complete_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.write_sanitized(&rest)?;
        }
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{encode, PatientInput};

    #[test]
    fn test_redacts_numeric_fields() {
        let line = "assessment started age=45 bmi=31.0 hba1c: 7.2 blood_glucose=\"210\"";
        let out = sanitize(line);
        assert!(!out.contains("45"));
        assert!(!out.contains("31.0"));
        assert!(!out.contains("7.2"));
        assert!(!out.contains("210"));
        assert!(out.contains("age=[REDACTED]"));
        assert!(out.contains("hba1c: [REDACTED]"));
    }

    #[test]
    fn test_redacts_categorical_fields() {
        let line = r#"gender="female" smoking_history="No Info" hypertension=positive"#;
        let out = sanitize(line);
        assert!(!out.contains("female"));
        assert!(!out.contains("No Info"));
        assert!(!out.contains("positive"));
    }

    #[test]
    fn test_redacts_debug_dump_of_input() {
        let input = PatientInput {
            age: 63,
            bmi: 33.3,
            ..PatientInput::default()
        };
        let out = sanitize(&format!("{input:?}"));
        assert!(!out.contains("63"));
        assert!(!out.contains("33.3"));
        assert!(!out.contains("Male"));
        assert!(!out.contains("NoInfo"));
    }

    #[test]
    fn test_redacts_feature_vectors() {
        let features = encode(&PatientInput::default());
        let out = sanitize(&format!("features={features:?} done"));
        assert_eq!(out, "features=[REDACTED] done");

        let out = sanitize(&format!("features={:?}", features.as_slice()));
        assert_eq!(out, "features=[REDACTED]");
    }

    #[test]
    fn test_leaves_ordinary_lines_alone() {
        let line = "Loaded model 'diabetes-logreg' (threshold=0.5), usage: 3 stages";
        assert_eq!(sanitize(line), line);
        assert!(!contains_health_data(line));
        assert!(contains_health_data("bmi=22.1"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let out = sanitize_with_limit("age=45 and more text after it", 10);
        assert!(out.ends_with("[TRUNCATED]"));
        assert!(!out.contains("45"));
    }

    #[test]
    fn test_writer_sanitizes_lines() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter {
                inner: &mut sink,
                pending: Vec::new(),
            };
            writer.write_all(b"first age=").expect("write");
            writer.write_all(b"50\nsecond line\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(sink).expect("utf8");
        assert_eq!(text, "first age=[REDACTED]\nsecond line\n");
    }
}
