//! Runtime configuration from `GLYCOCHECK_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::{GlycocheckError, Result};

pub const DEFAULT_MODEL_PATH: &str = "models";
pub const DEFAULT_LOG_FILE: &str = "glycocheck.log";
pub const DEFAULT_MIN_LATENCY_MS: u64 = 1500;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

impl std::str::FromStr for LogMode {
    type Err = GlycocheckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(GlycocheckError::Config(format!(
                "GLYCOCHECK_LOG_MODE must be auto, file or stdout (got '{other}')"
            ))),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Model artifact file, or a directory holding `risk_model.json`
    pub model_path: PathBuf,

    /// Expected SHA-256 of the artifact bytes (lowercase hex)
    pub model_sha256: Option<String>,

    /// Minimum time the loading state stays visible after submit
    pub min_perceived_latency: Duration,

    pub log_mode: LogMode,

    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_sha256: None,
            min_perceived_latency: Duration::from_millis(DEFAULT_MIN_LATENCY_MS),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `GlycocheckError::Config` for malformed values.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or blank variables use defaults.
    ///
    /// # Errors
    /// Returns `GlycocheckError::Config` for malformed values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = get("GLYCOCHECK_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }

        if let Some(hex) = get("GLYCOCHECK_MODEL_SHA256") {
            config.model_sha256 = Some(parse_sha256(&hex)?);
        }

        if let Some(ms) = get("GLYCOCHECK_MIN_LATENCY_MS") {
            let ms = ms.parse::<u64>().map_err(|_| {
                GlycocheckError::Config(format!(
                    "GLYCOCHECK_MIN_LATENCY_MS must be a whole number of milliseconds (got '{ms}')"
                ))
            })?;
            config.min_perceived_latency = Duration::from_millis(ms);
        }

        if let Some(mode) = get("GLYCOCHECK_LOG_MODE") {
            config.log_mode = mode.parse()?;
        }

        if let Some(file) = get("GLYCOCHECK_LOG_FILE") {
            config.log_file = PathBuf::from(file);
        }

        Ok(config)
    }
}

/// Normalize a SHA-256 digest to lowercase hex.
///
/// # Errors
/// Returns `GlycocheckError::Config` unless `hex` is 64 hex digits.
pub fn parse_sha256(hex: &str) -> Result<String> {
    let hex = hex.trim();
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GlycocheckError::Config(
            "Model SHA-256 must be 64 hex characters".to_string(),
        ));
    }
    Ok(hex.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model_path, PathBuf::from("models"));
        assert_eq!(config.min_perceived_latency, Duration::from_millis(1500));
        assert_eq!(config.log_mode, LogMode::Auto);
    }

    #[test]
    fn test_overrides() {
        let digest = "AB".repeat(32);
        let config = AppConfig::from_lookup(lookup(&[
            ("GLYCOCHECK_MODEL_PATH", "/opt/models/risk.json"),
            ("GLYCOCHECK_MODEL_SHA256", digest.as_str()),
            ("GLYCOCHECK_MIN_LATENCY_MS", "0"),
            ("GLYCOCHECK_LOG_MODE", "Stdout"),
            ("GLYCOCHECK_LOG_FILE", "/tmp/g.log"),
        ]))
        .unwrap();

        assert_eq!(config.model_path, PathBuf::from("/opt/models/risk.json"));
        assert_eq!(config.model_sha256, Some("ab".repeat(32)));
        assert_eq!(config.min_perceived_latency, Duration::ZERO);
        assert_eq!(config.log_mode, LogMode::Stdout);
        assert_eq!(config.log_file, PathBuf::from("/tmp/g.log"));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GLYCOCHECK_MODEL_PATH", "  "),
            ("GLYCOCHECK_MIN_LATENCY_MS", ""),
        ]))
        .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_values_are_fatal() {
        let not_hex = "zz".repeat(32);
        for (key, value) in [
            ("GLYCOCHECK_MIN_LATENCY_MS", "soon"),
            ("GLYCOCHECK_MIN_LATENCY_MS", "-5"),
            ("GLYCOCHECK_LOG_MODE", "syslog"),
            ("GLYCOCHECK_MODEL_SHA256", "abc123"),
            ("GLYCOCHECK_MODEL_SHA256", not_hex.as_str()),
        ] {
            let err = AppConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(err.is_fatal(), "{key}={value}");
        }
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
