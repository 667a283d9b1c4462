//! sdkbridge console runtime.
//!
//! This module is the crate's stand-in for a GUI: it builds a [`Session`],
//! issues exactly one operation per invocation based on the parsed CLI
//! arguments, and renders the notice stream to stdout as it arrives. It only
//! ever talks to the session controller and reads catalog snapshots; parsing
//! and process handling stay behind that boundary.

use tokio::sync::mpsc;

use crate::args::Args;
use crate::catalog::{Catalog, PackageRecord};
use crate::config::resolve_sdk_root;
use crate::events::Notice;
use crate::session::Session;

/// Result alias for runtime operations.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Render one catalog record as a table line.
fn record_line(rec: &PackageRecord) -> String {
    let mark = if rec.effective_installed() { "x" } else { " " };
    format!(
        "[{mark}] {:<40} {:<16} {:<24} {}",
        rec.id,
        rec.display_version(),
        rec.status_label(),
        rec.name
    )
}

/// Print the catalog snapshot as a table or JSON, plus the update summary.
fn print_catalog(catalog: &Catalog, updates: &[String], json: bool) -> Result<()> {
    let snapshot = catalog.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    println!("    {:<40} {:<16} {:<24} Name", "ID", "Version", "Status");
    for rec in &snapshot {
        println!("{}", record_line(rec));
    }
    if updates.is_empty() {
        println!("{} package(s), no updates pending", snapshot.len());
    } else {
        println!(
            "{} package(s), {} update(s) pending: {}",
            snapshot.len(),
            updates.len(),
            updates.join(" ")
        );
    }
    Ok(())
}

/// Consume notices until the operation's `Done`, echoing live output.
///
/// Progress notices rewrite a single status line; everything else gets its
/// own line. Returns the update set reported by `Done`.
async fn consume_until_done(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Result<Vec<String>> {
    while let Some(notice) = rx.recv().await {
        match notice {
            Notice::Progress(percent) => {
                print!("\r{percent:>3}%");
                let _ = std::io::Write::flush(&mut std::io::stdout());
            }
            Notice::Status(text) => println!("\r{text}"),
            Notice::Error(message) => eprintln!("\rerror: {message}"),
            Notice::PackageUpdated { .. } | Notice::CatalogCleared => {}
            Notice::Done { updates } => {
                println!();
                return Ok(updates);
            }
        }
    }
    Err("notice channel closed before Done".into())
}

/// Run one console invocation: dispatch the requested operation and render
/// the catalog once it completes.
///
/// Operation precedence when several flags are combined: install/remove are
/// applied together (removals first), `--update` installs the pending update
/// set, `--update-all` hands the whole update to the tool in one run, and a
/// bare invocation just refreshes the listing.
///
/// # Errors
/// - Propagates session rejections and output failures; a tool-level error
///   is reported through the notice stream instead and exits normally.
pub async fn run(args: Args) -> Result<()> {
    let sdk_root = resolve_sdk_root(args.sdk_root.clone());
    tracing::info!(sdk_root = ?sdk_root, "session starting");
    let (session, mut rx) = Session::new(sdk_root);

    if !args.install.is_empty() || !args.remove.is_empty() {
        session.apply_changes(args.install.clone(), args.remove.clone())?;
    } else if args.update {
        // Two phases: list first, then install whatever is pending.
        session.refresh()?;
        let pending = consume_until_done(&mut rx).await?;
        if pending.is_empty() {
            println!("No updates");
            return print_catalog(&session.catalog(), &pending, args.json);
        }
        println!("Installing {} update(s)", pending.len());
        session.install_updates(pending)?;
    } else if args.update_all {
        session.update_all()?;
    } else {
        session.refresh()?;
    }

    let updates = consume_until_done(&mut rx).await?;
    print_catalog(&session.catalog(), &updates, args.json)
}
