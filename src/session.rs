//! Session controller: one tool operation at a time, events folded into the
//! catalog, notices pushed to the front-end.
//!
//! A [`Session`] owns the catalog and a notice channel. Each operation
//! (`refresh`, `apply_changes`, `install_updates`) transitions Idle → Busy →
//! Idle and runs on its own worker thread, which owns its [`ToolRun`] and
//! [`EventParser`] for the duration of the run; nothing parser-related is
//! shared between operations. A second request while Busy is rejected
//! synchronously and never interleaves with the in-flight run.
//!
//! Error recovery is absolute at this boundary: whatever the external tool
//! does (missing binary, non-zero exit, garbage output), the worker forwards
//! an `Error` notice at most and always terminates with exactly one
//! [`Notice::Done`], so the consumer can never be left locked.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::catalog::Catalog;
use crate::events::{Notice, ParseEvent};
use crate::parser::EventParser;
use crate::runner::{ToolRun, resolve_tool};

/// Synchronous rejection reasons for session operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// An operation is already in flight; retry after its `Done`.
    Busy,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "an operation is already in flight"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Controller orchestrating runner, parser, and catalog per user action.
///
/// The front-end holds a `Session`, reads catalog snapshots through
/// [`Session::catalog`], and consumes the notice receiver returned by
/// [`Session::new`]. The SDK root is read once at construction; to point at
/// a different installation, build a new session.
pub struct Session {
    /// Shared package catalog; readable by the front-end at any time.
    catalog: Arc<Catalog>,
    /// SDK installation root, when configured; `None` means PATH lookup.
    sdk_root: Option<PathBuf>,
    /// Busy flag enforcing the single-operation constraint.
    busy: Arc<AtomicBool>,
    /// Upward notice channel into the front-end.
    notice_tx: mpsc::UnboundedSender<Notice>,
}

impl Session {
    /// Create a session for the given SDK root and return it together with
    /// the notice stream the front-end should consume.
    #[must_use]
    pub fn new(sdk_root: Option<PathBuf>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        (
            Self {
                catalog: Arc::new(Catalog::new()),
                sdk_root,
                busy: Arc::new(AtomicBool::new(false)),
                notice_tx,
            },
            notice_rx,
        )
    }

    /// Shared catalog handle for read-side queries and snapshots.
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Whether an operation is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Toggle the pending mark for `id` on behalf of the front-end.
    ///
    /// Ignored while an operation is in flight: the live parse owns catalog
    /// mutation during a run. Unknown ids are a no-op inside the catalog.
    pub fn toggle_mark(&self, id: &str) {
        if self.is_busy() {
            tracing::debug!(id = %id, "toggle ignored while busy");
            return;
        }
        self.catalog.toggle_mark(id);
    }

    /// Clear the catalog and relist everything via `--list`.
    ///
    /// # Errors
    /// - [`SessionError::Busy`] when another operation is in flight.
    pub fn refresh(&self) -> Result<(), SessionError> {
        self.start(Vec::new())
    }

    /// Apply pending changes: remove `removes`, install `installs`, relist.
    ///
    /// Removal runs before installation so a package being replaced is never
    /// uninstalled concurrently with its own install. When both sets are
    /// empty the operation reports "nothing to do" and completes immediately
    /// without touching the tool.
    ///
    /// # Errors
    /// - [`SessionError::Busy`] when another operation is in flight.
    pub fn apply_changes(
        &self,
        installs: Vec<String>,
        removes: Vec<String>,
    ) -> Result<(), SessionError> {
        if installs.is_empty() && removes.is_empty() {
            if self.is_busy() {
                return Err(SessionError::Busy);
            }
            let _ = self
                .notice_tx
                .send(Notice::Status("No changes need to be applied".to_string()));
            let _ = self.notice_tx.send(Notice::Done {
                updates: self.catalog.updates_pending(),
            });
            return Ok(());
        }
        let mut runs = Vec::new();
        if !removes.is_empty() {
            let mut args = vec!["--uninstall".to_string()];
            args.extend(removes);
            runs.push(args);
        }
        if !installs.is_empty() {
            runs.push(installs);
        }
        self.start(runs)
    }

    /// Install exactly the given package ids, then relist.
    ///
    /// # Errors
    /// - [`SessionError::Busy`] when another operation is in flight.
    pub fn install_updates(&self, ids: Vec<String>) -> Result<(), SessionError> {
        if ids.is_empty() {
            return self.refresh();
        }
        self.start(vec![ids])
    }

    /// Update every installed package in place via `--update`, then relist.
    ///
    /// Unlike [`Session::install_updates`] this hands the whole update to the
    /// tool in one run instead of naming ids.
    ///
    /// # Errors
    /// - [`SessionError::Busy`] when another operation is in flight.
    pub fn update_all(&self) -> Result<(), SessionError> {
        self.start(vec![vec!["--update".to_string()]])
    }

    /// Claim the busy flag and launch one worker for the given mutating runs
    /// followed by the final listing run.
    fn start(&self, mutating_runs: Vec<Vec<String>>) -> Result<(), SessionError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("operation rejected: session busy");
            return Err(SessionError::Busy);
        }
        let catalog = Arc::clone(&self.catalog);
        let busy = Arc::clone(&self.busy);
        let tx = self.notice_tx.clone();
        let sdk_root = self.sdk_root.clone();
        std::thread::spawn(move || {
            run_operation(&catalog, &tx, sdk_root.as_deref(), &mutating_runs);
            // Snapshot the update set before releasing the flag: once the
            // flag drops, a follow-up operation may clear the catalog.
            let updates = catalog.updates_pending();
            busy.store(false, Ordering::SeqCst);
            let _ = tx.send(Notice::Done { updates });
        });
        Ok(())
    }
}

/// Execute one session operation on the worker thread.
///
/// Runs each mutating invocation in order, then clears the catalog and runs
/// the final `--list`. The tool is resolved per run; a missing tool is a
/// spawn failure for that run and flows into the caller's single `Done` like
/// any other error.
fn run_operation(
    catalog: &Catalog,
    tx: &mpsc::UnboundedSender<Notice>,
    sdk_root: Option<&std::path::Path>,
    mutating_runs: &[Vec<String>],
) {
    for args in mutating_runs {
        run_tool_once(catalog, tx, sdk_root, args);
    }
    catalog.clear();
    let _ = tx.send(Notice::CatalogCleared);
    run_tool_once(catalog, tx, sdk_root, &["--list".to_string()]);
}

/// Resolve and spawn the tool once, folding its event stream into catalog
/// and notices.
///
/// Every event kind maps to at most one notice; the per-run `Completed`
/// terminates the fold without surfacing (the operation-level `Done` is the
/// only terminal notice the front-end sees).
fn run_tool_once(
    catalog: &Catalog,
    tx: &mpsc::UnboundedSender<Notice>,
    sdk_root: Option<&std::path::Path>,
    args: &[String],
) {
    let tool = match resolve_tool(sdk_root) {
        Ok(tool) => tool,
        Err(e) => {
            tracing::warn!(error = %e, "sdkmanager resolution failed");
            let _ = tx.send(Notice::Error(e.to_string()));
            return;
        }
    };
    for event in EventParser::new(ToolRun::spawn(&tool, args)) {
        match event {
            ParseEvent::PackageObserved {
                id,
                name,
                version,
                section,
            } => {
                catalog.apply_observed(&id, &name, &version, section);
                let _ = tx.send(Notice::PackageUpdated { id });
            }
            ParseEvent::Progress(percent) => {
                let _ = tx.send(Notice::Progress(percent));
            }
            ParseEvent::Status(text) => {
                let _ = tx.send(Notice::Status(text));
            }
            ParseEvent::Error(message) => {
                tracing::warn!(error = %message, "tool run failed");
                let _ = tx.send(Notice::Error(message));
            }
            ParseEvent::Completed => break,
        }
    }
}
