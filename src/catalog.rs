//! In-memory package catalog reconciling parser events with user intent.
//!
//! The catalog is the source of truth for the front-end's package table. It
//! maps package ids to [`PackageRecord`]s and exposes:
//! - An idempotent upsert ([`Catalog::apply_observed`]) fed by the session
//!   worker as `PackageObserved` events arrive
//! - A user-driven mark toggle ([`Catalog::toggle_mark`]) cycling through
//!   pending install/remove intent
//! - Derived queries for pending updates and marked ids
//!
//! All shared state sits behind an `RwLock` so the session worker can mutate
//! while the front-end reads snapshots concurrently; a reader never observes
//! a half-applied record. No caller mutates record fields from outside the
//! catalog.

use std::collections::BTreeMap;
use std::sync::RwLock;

/// User-declared pending intent on a package record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Mark {
    /// No pending intent.
    #[default]
    Unmarked,
    /// Queued for installation on the next apply.
    MarkInstall,
    /// Queued for removal on the next apply.
    MarkRemove,
}

/// One installable unit as reconciled from listing runs.
///
/// A record is created on the first observation of its id and keeps both
/// version fields across sections: an installed-table row fills
/// `version_installed`, an available-table row fills `version_available`,
/// and neither overwrites the other.
#[derive(Clone, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PackageRecord {
    /// Stable identifier, unique within the catalog, never empty once known.
    pub id: String,
    /// Human-readable label; empty until first observed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Installed version; empty means not installed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_installed: String,
    /// Latest version known remotely; empty means no remote version known.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_available: String,
    /// Pending user intent, defaults to [`Mark::Unmarked`].
    #[serde(default)]
    pub mark: Mark,
}

impl PackageRecord {
    /// Whether the package is currently installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        !self.version_installed.is_empty()
    }

    /// Whether the installed version matches the known remote version.
    ///
    /// Holds trivially for packages that are not installed, regardless of
    /// any available version. An installed package whose remote version is
    /// unknown (empty `version_available`) is not latest.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        !self.is_installed() || self.version_installed == self.version_available
    }

    /// Effective install state after applying the pending mark.
    ///
    /// This is what the front-end's checkbox column shows: marked-for-install
    /// packages count as installed, marked-for-remove ones do not.
    #[must_use]
    pub fn effective_installed(&self) -> bool {
        self.mark == Mark::MarkInstall || (self.is_installed() && self.mark != Mark::MarkRemove)
    }

    /// Version string to display: installed when present, else available.
    #[must_use]
    pub fn display_version(&self) -> &str {
        if self.is_installed() {
            &self.version_installed
        } else {
            &self.version_available
        }
    }

    /// Human-readable install status for table display.
    #[must_use]
    pub fn status_label(&self) -> String {
        if self.is_installed() && self.is_latest() {
            "Installed".to_string()
        } else if self.is_installed() {
            format!("Version {} available", self.version_available)
        } else {
            "Not installed".to_string()
        }
    }
}

/// Thread-safe mapping from package id to record.
///
/// Records are kept ordered by id so that snapshots are deterministic across
/// runs. The lock is coarse-grained: every operation takes the whole map,
/// which is cheap at catalog sizes (a few hundred packages) and rules out
/// torn reads.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Id-ordered records behind a coarse reader/writer lock.
    records: RwLock<BTreeMap<String, PackageRecord>>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every record, ahead of a fresh listing run.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }

    /// Upsert a record from a `PackageObserved` event and return the previous
    /// record for the id, if any.
    ///
    /// Creates the record on first observation. Sets `name` and the version
    /// field matching `section`, preserving the other version field and any
    /// existing mark. Applying the same observation twice yields the same end
    /// state, and installed/available observations for one id commute.
    pub fn apply_observed(
        &self,
        id: &str,
        name: &str,
        version: &str,
        section: crate::events::Section,
    ) -> Option<PackageRecord> {
        let Ok(mut records) = self.records.write() else {
            return None;
        };
        let previous = records.get(id).cloned();
        let entry = records.entry(id.to_string()).or_insert_with(|| PackageRecord {
            id: id.to_string(),
            ..PackageRecord::default()
        });
        entry.name = name.to_string();
        match section {
            crate::events::Section::Installed => entry.version_installed = version.to_string(),
            crate::events::Section::Available => entry.version_available = version.to_string(),
        }
        previous
    }

    /// Cycle the pending mark for `id`.
    ///
    /// Unmarked records go to [`Mark::MarkRemove`] when installed and
    /// [`Mark::MarkInstall`] when not; any existing mark returns to
    /// [`Mark::Unmarked`]. Toggling an unknown id is a silent no-op so a
    /// stale front-end snapshot can never fault the store.
    pub fn toggle_mark(&self, id: &str) {
        if let Ok(mut records) = self.records.write() {
            if let Some(rec) = records.get_mut(id) {
                rec.mark = match rec.mark {
                    Mark::Unmarked if rec.is_installed() => Mark::MarkRemove,
                    Mark::Unmarked => Mark::MarkInstall,
                    Mark::MarkInstall | Mark::MarkRemove => Mark::Unmarked,
                };
            } else {
                tracing::debug!(id = %id, "toggle for unknown id ignored");
            }
        }
    }

    /// Ids of all records with a pending update (`!is_latest()`).
    #[must_use]
    pub fn updates_pending(&self) -> Vec<String> {
        self.records.read().map_or_else(
            |_| Vec::new(),
            |records| {
                records
                    .values()
                    .filter(|r| !r.is_latest())
                    .map(|r| r.id.clone())
                    .collect()
            },
        )
    }

    /// Ids of all records carrying the given mark.
    #[must_use]
    pub fn marked(&self, mark: Mark) -> Vec<String> {
        self.records.read().map_or_else(
            |_| Vec::new(),
            |records| {
                records
                    .values()
                    .filter(|r| r.mark == mark)
                    .map(|r| r.id.clone())
                    .collect()
            },
        )
    }

    /// Clone of the record for `id`, if present.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<PackageRecord> {
        self.records
            .read()
            .ok()
            .and_then(|records| records.get(id).cloned())
    }

    /// Id-ordered snapshot of every record.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PackageRecord> {
        self.records
            .read()
            .map_or_else(|_| Vec::new(), |records| records.values().cloned().collect())
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |records| records.len())
    }

    /// Whether the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
