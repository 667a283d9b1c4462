//! Streaming parser for `sdkmanager` output.
//!
//! This module turns the tool's line-oriented, human-readable stdout into a
//! lazy stream of typed [`ParseEvent`]s:
//! - [`classify`] decides what a single raw line is (progress marker, section
//!   header, table row, or chatter) relative to the current [`Phase`].
//! - [`EventParser`] wraps any line iterator, threads the phase across calls,
//!   and yields events pull-based: one input line produces zero, one, or two
//!   events before the next line is read.
//!
//! The phase is an explicit value passed between calls, never shared mutable
//! state: which table a row belongs to is only known from the most recent
//! header line, so classification is a stateful fold over the line sequence.
//!
//! Malformed lines are never fatal. A row with the wrong field count, or a
//! bracketed line that does not carry a readable percentage, degrades to
//! chatter; the stream keeps going. The tool's output format has drifted
//! across SDK releases and the parser is deliberately lenient about it.

use std::collections::VecDeque;

use crate::events::{ParseEvent, Section};

/// Parse phase: which package table the stream is currently inside.
///
/// Starts at [`Phase::None`] and switches when a header line containing
/// `Installed` or `Available` is seen. The phase persists until the next
/// header; it is not re-derivable from a single line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    /// No section header seen yet.
    #[default]
    None,
    /// Inside the installed-packages table.
    Installed,
    /// Inside the available-packages table.
    Available,
}

/// Classification of one raw output line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    /// A progress marker carrying both a percentage and a status phrase.
    Progress {
        /// Percent complete, clamped to 0..=100.
        percent: u8,
        /// Status phrase printed next to the percentage.
        status: String,
    },
    /// A section header; the caller must thread the new phase forward.
    SwitchPhase(Phase),
    /// A package table row, already split and trimmed.
    Row {
        /// Package identifier (first column).
        id: String,
        /// Version string (second column).
        version: String,
        /// Display name (last column).
        name: String,
    },
    /// Anything else: free text, dividers, malformed rows.
    Chatter(String),
}

/// Separator characters tolerated between a progress number and its phrase.
///
/// `sdkmanager` prints progress as e.g. `[ 42% ] Downloading platform-tools`;
/// the percent sign, closing bracket, and padding all sit between the digits
/// and the phrase.
const fn is_progress_filler(c: char) -> bool {
    c.is_ascii_whitespace() || c == '%' || c == ']'
}

/// Try to read `percent` and `status` out of a bracketed progress line.
///
/// Returns `None` when the line carries no digit run, no phrase, or anything
/// other than filler between the two; callers then treat the line as chatter.
/// Values above 100 are clamped to 100 rather than rejected, which matches
/// how the original front-end's progress bar capped them.
fn parse_progress(line: &str) -> Option<(u8, String)> {
    let digit_start = line.find(|c: char| c.is_ascii_digit())?;
    let after = &line[digit_start..];
    let digit_len = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    let digits = &after[..digit_len];
    let rest = &after[digit_len..];
    let phrase_start = rest.find(|c: char| !is_progress_filler(c))?;
    if !rest[..phrase_start].contains(|c: char| c.is_ascii_whitespace() || c == '%') {
        return None;
    }
    let phrase = &rest[phrase_start..];
    if !phrase.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let percent = digits.parse::<u64>().ok()?.min(100);
    #[allow(clippy::cast_possible_truncation)]
    Some((percent as u8, phrase.trim_end().to_string()))
}

/// Whether a `|`-carrying line is a table header or divider rather than data.
///
/// Headers contain the literal column title `Path`; dividers consist solely
/// of dashes, pipes, and whitespace.
fn is_table_furniture(line: &str) -> bool {
    if line.contains("Path") {
        return true;
    }
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c == '-' || c == '|' || c.is_ascii_whitespace())
}

/// Split a table row into trimmed fields and validate the expected count.
///
/// The available-packages table has 3 columns (id, version, description); the
/// installed table and anything outside a known section has 4 (id, version,
/// location, description). Any other count means the line is malformed and
/// classifies as chatter. The display name is taken from the last column in
/// both shapes; the installed table's location column is not carried.
fn parse_row(line: &str, phase: Phase) -> Option<Classified> {
    let expected = if phase == Phase::Available { 3 } else { 4 };
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() != expected || fields[0].is_empty() {
        return None;
    }
    Some(Classified::Row {
        id: fields[0].to_string(),
        version: fields[1].to_string(),
        name: fields[expected - 1].to_string(),
    })
}

/// Classify one raw output line relative to the current parse phase.
///
/// Rules, in priority order:
/// 1. A line containing `[` is tried as a progress marker; on failure it is
///    chatter (not re-tried against the remaining rules).
/// 2. A line containing `Installed` switches to the installed phase.
/// 3. A line containing `Available` switches to the available phase.
/// 4. A line containing `|` that is not a header or divider is split into a
///    table row; a wrong field count degrades to chatter.
/// 5. Everything else is chatter carrying the raw text.
///
/// The caller owns the phase: on [`Classified::SwitchPhase`] it must thread
/// the returned phase into subsequent calls.
#[must_use]
pub fn classify(line: &str, phase: Phase) -> Classified {
    if line.contains('[') {
        return match parse_progress(line) {
            Some((percent, status)) => Classified::Progress { percent, status },
            None => Classified::Chatter(line.to_string()),
        };
    }
    if line.contains("Installed") {
        return Classified::SwitchPhase(Phase::Installed);
    }
    if line.contains("Available") {
        return Classified::SwitchPhase(Phase::Available);
    }
    if line.contains('|') && !is_table_furniture(line) {
        if let Some(row) = parse_row(line, phase) {
            return row;
        }
    }
    Classified::Chatter(line.to_string())
}

/// Lazy event stream over a sequence of output lines.
///
/// Wraps any `Iterator<Item = io::Result<String>>` (the shape produced by
/// [`crate::runner::ToolRun`] and by `BufRead::lines`) and yields
/// [`ParseEvent`]s:
/// - a table row inside a known section yields `PackageObserved` tagged with
///   the current phase; rows seen before any header are dropped,
/// - a progress line yields `Progress` then `Status` for the same line,
/// - chatter yields `Status` only when non-empty and free of `|`, so
///   malformed rows and dividers are not re-surfaced as status text,
/// - an `Err` line (spawn failure, I/O error, non-zero exit) yields `Error`,
/// - exhaustion yields exactly one final `Completed`, after which the
///   iterator is fused.
///
/// The parser is not rewindable; a fresh run needs a fresh `EventParser`
/// over a fresh line sequence.
pub struct EventParser<I> {
    /// Underlying line source; dropped once the terminal event is emitted.
    lines: Option<I>,
    /// Current parse phase, threaded across classify calls.
    phase: Phase,
    /// Events decoded from the current line but not yet pulled.
    pending: VecDeque<ParseEvent>,
}

impl<I> EventParser<I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    /// Create a parser over `lines` starting outside any section.
    pub fn new(lines: I) -> Self {
        Self {
            lines: Some(lines),
            phase: Phase::None,
            pending: VecDeque::new(),
        }
    }

    /// Decode one line into zero or more pending events.
    fn feed(&mut self, line: &str) {
        match classify(line, self.phase) {
            Classified::Progress { percent, status } => {
                self.pending.push_back(ParseEvent::Progress(percent));
                self.pending.push_back(ParseEvent::Status(status));
            }
            Classified::SwitchPhase(next) => {
                self.phase = next;
            }
            Classified::Row { id, version, name } => {
                let section = match self.phase {
                    Phase::Installed => Some(Section::Installed),
                    Phase::Available => Some(Section::Available),
                    Phase::None => None,
                };
                if let Some(section) = section {
                    self.pending.push_back(ParseEvent::PackageObserved {
                        id,
                        name,
                        version,
                        section,
                    });
                } else {
                    tracing::debug!(id = %id, "table row before any section header; dropped");
                }
            }
            Classified::Chatter(text) => {
                if !text.trim().is_empty() && !text.contains('|') {
                    self.pending.push_back(ParseEvent::Status(text));
                }
            }
        }
    }
}

impl<I> Iterator for EventParser<I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    type Item = ParseEvent;

    fn next(&mut self) -> Option<ParseEvent> {
        loop {
            if let Some(ev) = self.pending.pop_front() {
                return Some(ev);
            }
            let lines = self.lines.as_mut()?;
            match lines.next() {
                Some(Ok(line)) => self.feed(&line),
                Some(Err(e)) => {
                    // Stream failure terminates the run: Error, then the one
                    // and only Completed.
                    self.lines = None;
                    self.pending.push_back(ParseEvent::Completed);
                    return Some(ParseEvent::Error(e.to_string()));
                }
                None => {
                    self.lines = None;
                    return Some(ParseEvent::Completed);
                }
            }
        }
    }
}
