//! sdkbridge binary entrypoint kept minimal. The runtime lives in `app`.

mod app;
mod args;
mod catalog;
mod config;
mod events;
mod parser;
mod runner;
mod session;

use clap::Parser;
use std::fmt;
use std::sync::OnceLock;

/// Timestamp formatter for log lines ("YYYY-MM-DD HH:MM:SS", UTC).
struct BridgeTimer;

impl tracing_subscriber::fmt::time::FormatTime for BridgeTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
        write!(w, "{ts}")
    }
}

/// Keeps the non-blocking log writer alive for the process lifetime.
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initialize tracing to `~/.config/sdkbridge/logs/sdkbridge.log`, falling
/// back to stderr when the file cannot be opened.
fn init_logging(level: &str) {
    let mut log_path = config::logs_dir();
    log_path.push("sdkbridge.log");
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()))
    };
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(BridgeTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_timer(BridgeTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = args::Args::parse();
    init_logging(&args::determine_log_level(&cli));
    tracing::info!("sdkbridge starting");

    if let Err(err) = app::run(cli).await {
        tracing::error!(error = ?err, "Application error");
        eprintln!("sdkbridge: {err}");
        std::process::exit(1);
    }
    tracing::info!("sdkbridge exited");
}
