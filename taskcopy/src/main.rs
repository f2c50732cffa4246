//! `taskcopy`: copy resolved Maniphest tasks into another project.
//!
//! Prompts for a source project and a tag, lists the resolved tasks tagged
//! with both, and after confirmation re-creates them as open tasks in a
//! destination project. Configuration via CLI flags, environment variables
//! (a `.env` file in the working directory is read too), or config file
//! (`~/.config/taskcopy/config.toml`).
//!
//! ```bash
//! PHABRICATOR_URL=https://phab.example.com \
//!     PHABRICATOR_CONDUIT_API_TOKEN=api-xxxx cargo run --bin taskcopy
//! ```

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskcopy::app::{self, RunSettings};
use taskcopy::conduit::ConduitClient;
use taskcopy::config::{AppConfig, CliArgs};
use taskcopy::prompt::TerminalPrompter;
use taskcopy::transport::http::HttpTransport;

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so `.env` values reach clap's `env` attributes.
    dotenvy::dotenv().ok();
    let cli = CliArgs::parse();

    // Logs go to a file; the terminal belongs to the prompts.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let config = match AppConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let settings = match config.conduit_settings() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let transport = match HttpTransport::new(&settings.url, settings.timeout) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    tracing::info!(url = %settings.url, concurrency = config.concurrency, "taskcopy starting");

    let client = Arc::new(ConduitClient::new(transport, settings.token));
    let mut prompter = TerminalPrompter::new(config.max_visible_options);
    let mut stdout = io::stdout();

    match app::run(client, &mut prompter, RunSettings::from(&config), &mut stdout).await {
        Ok(summary) if summary.failed() == 0 => {
            tracing::info!("taskcopy exiting");
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            eprintln!(
                "{} of {} task(s) failed to copy",
                summary.failed(),
                summary.outcomes.len()
            );
            ExitCode::FAILURE
        }
        Err(e) => fail(&e),
    }
}

fn fail(error: &dyn std::error::Error) -> ExitCode {
    tracing::error!(%error, "taskcopy failed");
    eprintln!("Error: {error}");
    ExitCode::FAILURE
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskcopy.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
