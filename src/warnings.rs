//! Non-fatal per-entry error taxonomy and aggregation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Classification of a non-fatal per-entry error. Ordered so `BTreeMap<WarningKind, _>`
/// renders in a stable, readable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    PermissionDenied,
    BrokenSymlink,
    Vanished,
    NotRegularFile,
    IoError,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::PermissionDenied => "permission_denied",
            WarningKind::BrokenSymlink => "broken_symlink",
            WarningKind::Vanished => "vanished",
            WarningKind::NotRegularFile => "not_regular_file",
            WarningKind::IoError => "io_error",
        }
    }
}

/// A single non-fatal per-entry failure, carrying the path it was raised against.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub path: PathBuf,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Aggregates warnings by kind. Safe to share across worker threads.
#[derive(Default)]
pub struct WarningCollector {
    counts: Mutex<BTreeMap<WarningKind, u64>>,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. Logs at `warn!` level so `--verbose` runs show the offending path
    /// as it happens, in addition to the aggregate count in the final Report.
    pub fn record(&self, warning: Warning) {
        log::warn!("{}: {} ({})", warning.kind.as_str(), warning.path.display(), warning.message);
        let mut counts = self.counts.lock().expect("warning collector mutex poisoned");
        *counts.entry(warning.kind).or_insert(0) += 1;
    }

    pub fn into_counts(self) -> BTreeMap<WarningKind, u64> {
        self.counts.into_inner().expect("warning collector mutex poisoned")
    }

    pub fn total(&self) -> u64 {
        self.counts.lock().expect("warning collector mutex poisoned").values().sum()
    }
}
