//! Command-line argument parsing for the sdkbridge console front-end.

use clap::Parser;
use std::path::PathBuf;

/// sdkbridge - console front-end for the Android sdkmanager bridge
#[derive(Parser, Debug)]
#[command(name = "sdkbridge")]
#[command(version)]
#[command(about = "List, install, and remove Android SDK packages through sdkmanager", long_about = None)]
pub struct Args {
    /// Android SDK installation root (default: ANDROID_HOME, then settings.conf)
    #[arg(long)]
    pub sdk_root: Option<PathBuf>,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Install packages by id (e.g., sdkbridge -i platform-tools emulator)
    #[arg(short, long, num_args = 1..)]
    pub install: Vec<String>,

    /// Remove packages by id (e.g., sdkbridge -r emulator)
    #[arg(short = 'r', long, num_args = 1..)]
    pub remove: Vec<String>,

    /// Install every package with a pending update
    #[arg(short = 'u', long)]
    pub update: bool,

    /// Update all installed packages in place (single `sdkmanager --update` run)
    #[arg(long, conflicts_with = "update")]
    pub update_all: bool,

    /// Print the catalog as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// What: Determine the log level from arguments and environment.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides the log_level argument.
/// - `SDKBRIDGE_TRACE=1` enables TRACE level for parser debugging.
#[must_use]
pub fn determine_log_level(args: &Args) -> String {
    if args.verbose {
        "debug".to_string()
    } else if std::env::var("SDKBRIDGE_TRACE").ok().as_deref() == Some("1") {
        "trace".to_string()
    } else {
        args.log_level.clone()
    }
}
