//! Glycocheck: diabetes risk assessment
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glycocheck::adapters::sanitize::SanitizingMakeWriter;
use glycocheck::tui::App;
use glycocheck::AppConfig;

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging.
    //
    // Writing logs to the terminal would corrupt the TUI (alternate screen), so
    // an interactive session logs to a file and a non-interactive one to stdout.
    let interactive = std::io::stdout().is_terminal();

    let (writer, _guard) = if config.log_mode.use_file(interactive) {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    tracing::info!("Starting Glycocheck...");

    // Refuse to start without a usable model.
    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            return Err(e.into());
        }
    };
    app.run()?;

    tracing::info!("Glycocheck shutdown complete.");
    Ok(())
}
