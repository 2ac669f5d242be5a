//! One-shot risk assessment from a JSON document.
//!
//! Reads patient answers, runs the same pipeline as the terminal UI and
//! prints the prediction result as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! assess [--model <path>] [--sha256 <hex>] [<input.json>|-]
//! ```
//!
//! Input defaults to stdin. BMI may be replaced by `height_cm` and
//! `weight_kg`. Exit status is 0 on success, 2 for invalid input and 1 when
//! the model or configuration is unusable.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use glycocheck::adapters::sanitize::SanitizingMakeWriter;
use glycocheck::adapters::LinearModel;
use glycocheck::application::AssessmentService;
use glycocheck::config::parse_sha256;
use glycocheck::domain::PatientDocument;
use glycocheck::{AppConfig, GlycocheckError, PredictionResult};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    model: Option<PathBuf>,
    sha256: Option<String>,
    /// `None` reads stdin
    input: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Assess(Args),
    Help,
}

fn usage() -> String {
    "Usage: assess [--model <path>] [--sha256 <hex>] [<input.json>|-]".to_string()
}

fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = Args::default();
    let mut positional = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => {
                let v = args.next().ok_or_else(usage)?;
                parsed.model = Some(PathBuf::from(v));
            }
            "--sha256" => {
                let v = args.next().ok_or_else(usage)?;
                parsed.sha256 = Some(v);
            }
            "-h" | "--help" => return Ok(Command::Help),
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(format!("Unknown option '{flag}'\n{}", usage()));
            }
            _ if positional => return Err(usage()),
            "-" => positional = true,
            _ => {
                positional = true;
                parsed.input = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(Command::Assess(parsed))
}

fn read_document(input: Option<&PathBuf>) -> Result<PatientDocument, GlycocheckError> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn run(args: &Args) -> Result<PredictionResult, GlycocheckError> {
    let mut config = AppConfig::from_env()?;
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if let Some(hex) = &args.sha256 {
        config.model_sha256 = Some(parse_sha256(hex)?);
    }

    let model = LinearModel::load(&config.model_path, config.model_sha256.as_deref())?;
    let service = AssessmentService::new(Arc::new(model));

    let input = read_document(args.input.as_ref())?.into_input()?;
    service.assess(input)
}

/// 2 for problems with the submitted answers, 1 for everything else.
fn exit_code(err: &GlycocheckError) -> u8 {
    match err {
        GlycocheckError::Validation(_) | GlycocheckError::Serialization(_) => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    // stdout carries the JSON result; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_ansi(false)
        .with_writer(SanitizingMakeWriter::new(io::stderr))
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(Command::Assess(args)) => args,
        Ok(Command::Help) => {
            println!("{}", usage());
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(1);
        }
    };

    let result = match run(&args) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(exit_code(&e));
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}
