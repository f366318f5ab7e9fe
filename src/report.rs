//! The immutable output of a run: duplicate file groups, duplicate folder groups, unique
//! files, run statistics, and aggregated warnings.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::warnings::WarningKind;

/// A single regular file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Whether a group's membership was determined from full content or from metadata alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Exact,
    MetadataOnly,
}

/// A set of two or more files with identical content (or, under `metadata_only`, identical
/// `(basename, size)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileGroup {
    pub digest: String,
    pub size: u64,
    pub members: Vec<PathBuf>,
}

impl FileGroup {
    pub fn wasted_bytes(&self) -> u64 {
        self.size.saturating_mul(self.members.len().saturating_sub(1) as u64)
    }
}

/// A set of two or more directories whose complete recursive contents are identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderGroup {
    pub digest: String,
    pub members: Vec<PathBuf>,
    pub file_count: u64,
    pub total_bytes: u64,
}

impl FolderGroup {
    pub fn wasted_bytes(&self) -> u64 {
        self.total_bytes.saturating_mul(self.members.len().saturating_sub(1) as u64)
    }
}

/// Run-level statistics. `workers_used` and `confidence` make the Report self-documenting
/// about the adaptive worker-sizing decision and the accuracy mode in effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub files_scanned: u64,
    pub bytes_scanned: u64,
    pub duplicate_files: u64,
    pub duplicate_bytes: u64,
    pub wasted_bytes: u64,
    pub workers_used: usize,
    pub confidence: Confidence,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

/// The complete, immutable result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub file_groups: Vec<FileGroup>,
    pub folder_groups: Vec<FolderGroup>,
    pub unique_files: Vec<FileEntry>,
    pub stats: Stats,
    pub warnings: BTreeMap<WarningKind, u64>,
}

impl Report {
    /// Sort groups for stable, reproducible output: by descending size, then ascending
    /// first-member path. Members within a group are sorted lexicographically.
    pub fn sort_for_output(&mut self) {
        for group in &mut self.file_groups {
            group.members.sort();
        }
        for group in &mut self.folder_groups {
            group.members.sort();
        }
        self.file_groups.sort_by(|a, b| {
            b.size.cmp(&a.size).then_with(|| a.members.first().cmp(&b.members.first()))
        });
        self.folder_groups.sort_by(|a, b| {
            b.total_bytes
                .cmp(&a.total_bytes)
                .then_with(|| a.members.first().cmp(&b.members.first()))
        });
        self.unique_files.sort_by(|a, b| a.path.cmp(&b.path));
    }
}
