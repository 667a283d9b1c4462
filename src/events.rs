//! Typed events produced by the output parser and notices forwarded to the
//! front-end.
//!
//! The external `sdkmanager` tool reports everything through unstructured
//! stdout text. The parser turns that text into [`ParseEvent`] values, and the
//! session controller folds those into the catalog while forwarding
//! [`Notice`] values to whichever front-end is listening. Front-end code only
//! ever sees `Notice`s on a channel; it never touches parser or process
//! internals.

/// Which package table a parsed row belongs to.
///
/// `sdkmanager --list` prints an "Installed packages" table followed by an
/// "Available Packages" table; the section is introduced by a header line and
/// applies to every row until the next header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Section {
    /// Row came from the installed-packages table.
    Installed,
    /// Row came from the available-packages table.
    Available,
}

/// One typed event decoded from the tool's output stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseEvent {
    /// A package row was observed in the current section.
    PackageObserved {
        /// Stable package identifier (first table column).
        id: String,
        /// Human-readable label (last table column).
        name: String,
        /// Version string for the observed section.
        version: String,
        /// Table the row belongs to.
        section: Section,
    },
    /// Download/extraction progress, clamped to 0..=100.
    Progress(u8),
    /// Free-text status line worth surfacing.
    Status(String),
    /// Process-level failure (spawn error, non-zero exit, I/O error).
    Error(String),
    /// Output stream ended. Emitted exactly once per run, always last.
    Completed,
}

/// Message pushed from an in-flight session operation to the front-end.
///
/// Delivery is asynchronous and ordered within one operation. Exactly one
/// [`Notice::Done`] terminates each operation's stream, error or not, so the
/// consumer can always unlock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Progress percentage for the current tool run.
    Progress(u8),
    /// Free-text status line.
    Status(String),
    /// The catalog entry for `id` changed (created or updated).
    PackageUpdated {
        /// Identifier of the changed record.
        id: String,
    },
    /// The catalog was emptied ahead of a fresh listing.
    CatalogCleared,
    /// Something went wrong; the operation still runs to its `Done`.
    Error(String),
    /// Terminal notice: the operation finished and the session is Idle again.
    Done {
        /// Ids with a pending update after the final listing.
        updates: Vec<String>,
    },
}
