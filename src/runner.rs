//! `sdkmanager` process execution utilities.
//!
//! This module is a pure byte/line transport: it resolves the tool binary,
//! spawns it, and exposes its stdout as a line iterator. It never interprets
//! output content; that is the parser's job. Spawn failures, mid-stream I/O
//! errors, and non-zero exits all surface as `Err` items inside the line
//! sequence so downstream consumers see every run end the same way.

use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Result alias for runner operations.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Platform-specific binary name of the SDK manager tool.
///
/// The one legitimate OS branch in the crate: the tool ships as a `.bat`
/// wrapper on Windows and a plain script elsewhere.
#[must_use]
pub const fn tool_name() -> &'static str {
    if cfg!(windows) {
        "sdkmanager.bat"
    } else {
        "sdkmanager"
    }
}

/// What: Resolve the `sdkmanager` executable to invoke.
///
/// Inputs:
/// - `sdk_root`: SDK installation root, when configured.
///
/// Output:
/// - Full path to the tool, or an error when it cannot be located.
///
/// # Errors
/// - Returns `Err` when `sdk_root` is set but `<root>/tools/bin/<tool>` does not exist.
/// - Returns `Err` when no root is set and the tool is not on `PATH`.
///
/// Details:
/// - With a root, the tool lives at the fixed relative subpath `tools/bin`.
/// - Without one, falls back to a `PATH` lookup via `which`.
pub fn resolve_tool(sdk_root: Option<&Path>) -> Result<PathBuf> {
    match sdk_root {
        Some(root) => {
            let candidate = root.join("tools").join("bin").join(tool_name());
            if candidate.is_file() {
                Ok(candidate)
            } else {
                Err(format!("{} not found under {}", tool_name(), root.display()).into())
            }
        }
        None => {
            which::which(tool_name()).map_err(|e| format!("{} not on PATH: {e}", tool_name()).into())
        }
    }
}

/// Internal state of a [`ToolRun`] line stream.
enum RunState {
    /// Spawn failed; one `Err` item remains to be yielded.
    Failed(Option<std::io::Error>),
    /// Child is alive and stdout is being read line by line.
    Streaming {
        /// Spawned child process, waited on at EOF.
        child: Child,
        /// Buffered line reader over the child's stdout.
        lines: Lines<BufReader<ChildStdout>>,
    },
    /// Stream over; nothing left to yield.
    Finished,
}

/// A single invocation of the external tool, exposed as a line sequence.
///
/// Iterating yields each stdout line as it becomes available (undecodable or
/// unreadable data yields an `Err` item). After stdout closes the child is
/// reaped; a non-zero exit is reported as one final `Err` item. The iterator
/// then fuses. Output is never buffered whole: listings can be large and
/// progress must surface incrementally.
pub struct ToolRun {
    /// Current transport state.
    state: RunState,
}

impl ToolRun {
    /// What: Launch the tool with the given arguments and stream its stdout.
    ///
    /// Inputs:
    /// - `tool`: Resolved executable path (see [`resolve_tool`]).
    /// - `args`: Argument list passed verbatim.
    ///
    /// Output:
    /// - A `ToolRun` line sequence; spawn failure is reported as the
    ///   sequence's only item rather than as a constructor error, so every
    ///   run terminates through the same parser path.
    ///
    /// Details:
    /// - stdin is closed and stderr discarded; only stdout carries the
    ///   line grammar the parser understands.
    #[must_use]
    pub fn spawn(tool: &Path, args: &[String]) -> Self {
        tracing::info!(tool = %tool.display(), args = %args.join(" "), "spawning sdkmanager");
        let spawned = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => child.stdout.take().map_or_else(
                || {
                    let state = RunState::Failed(Some(std::io::Error::other(
                        "child stdout not captured",
                    )));
                    Self { state }
                },
                |stdout| Self {
                    state: RunState::Streaming {
                        child,
                        lines: BufReader::new(stdout).lines(),
                    },
                },
            ),
            Err(e) => {
                tracing::warn!(tool = %tool.display(), error = %e, "failed to spawn sdkmanager");
                Self {
                    state: RunState::Failed(Some(std::io::Error::new(
                        e.kind(),
                        format!("failed to spawn {}: {e}", tool.display()),
                    ))),
                }
            }
        }
    }

    /// Reap the child after EOF and convert a failed exit into an error item.
    fn finish(child: &mut Child) -> Option<std::io::Error> {
        match child.wait() {
            Ok(status) if status.success() => None,
            Ok(status) => Some(std::io::Error::other(format!(
                "{} exited with {status}",
                tool_name()
            ))),
            Err(e) => Some(e),
        }
    }
}

impl Iterator for ToolRun {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            RunState::Failed(err) => {
                let item = err.take().map(Err);
                self.state = RunState::Finished;
                item
            }
            RunState::Streaming { child, lines } => match lines.next() {
                Some(Ok(line)) => Some(Ok(line)),
                Some(Err(e)) => {
                    // Read failure ends the run; still reap the child.
                    let _ = child.kill();
                    let _ = child.wait();
                    self.state = RunState::Finished;
                    Some(Err(e))
                }
                None => {
                    let exit_err = Self::finish(child);
                    self.state = RunState::Finished;
                    exit_err.map(Err)
                }
            },
            RunState::Finished => None,
        }
    }
}
