//! Renders a `Report` as human-readable text or as stable-schema JSON. Rendering is
//! intentionally two free functions rather than a `Formatter` trait object hierarchy: the
//! two modes never need to be mixed or dispatched dynamically within a single run.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::report::Report;
use crate::utils::logger::Colors;

/// Format a byte count as a human-readable string, matching this codebase family's existing
/// byte-formatting convention.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let base = 1024.0_f64;
    let exp = (bytes_f.ln() / base.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f / base.powi(exp as i32);

    if exp == 0 {
        format!("{bytes} {}", UNITS[exp])
    } else {
        format!("{value:.2} {}", UNITS[exp])
    }
}

/// A single file entry as it appears in the public JSON schema, distinct from the internal
/// `FileEntry` (no `size_formatted` there).
#[derive(Serialize)]
struct JsonFileEntry {
    path: String,
    size: u64,
    size_formatted: String,
}

impl JsonFileEntry {
    fn new(path: &std::path::Path, size: u64) -> Self {
        Self { path: path.display().to_string(), size, size_formatted: format_bytes(size) }
    }
}

/// A single folder entry in the public JSON schema: just a path, since size lives on the
/// enclosing group (`total_bytes`).
#[derive(Serialize)]
struct JsonFolderEntry {
    path: String,
}

#[derive(Serialize)]
struct JsonDuplicateFileGroup {
    hash: String,
    size: u64,
    count: usize,
    files: Vec<JsonFileEntry>,
}

#[derive(Serialize)]
struct JsonDuplicateFolderGroup {
    hash: String,
    file_count: u64,
    total_bytes: u64,
    count: usize,
    folders: Vec<JsonFolderEntry>,
}

/// Render `report` as grouped, emoji-decorated text.
pub fn format_text(report: &Report) -> String {
    let mut out = String::new();

    if report.folder_groups.is_empty() && report.file_groups.is_empty() {
        out.push_str("✅ No duplicates found.\n\n");
    }

    if !report.folder_groups.is_empty() {
        out.push_str("📁 Duplicate folders\n");
        for group in &report.folder_groups {
            out.push_str(&format!(
                "  {} ({} files, {} bytes each)\n",
                Colors::colorize(Colors::DUPLICATE, &format!("group {}", &group.digest[..12.min(group.digest.len())])),
                group.file_count,
                group.total_bytes
            ));
            for member in &group.members {
                out.push_str(&format!("    - {}\n", member.display()));
            }
            out.push('\n');
        }
    }

    if !report.file_groups.is_empty() {
        out.push_str("📄 Duplicate files\n");
        for group in &report.file_groups {
            out.push_str(&format!(
                "  {} ({} bytes)\n",
                Colors::colorize(Colors::DUPLICATE, &format!("group {}", &group.digest[..12.min(group.digest.len())])),
                group.size
            ));
            for member in &group.members {
                out.push_str(&format!("    - {}\n", member.display()));
            }
            out.push('\n');
        }
    }

    out.push_str("📊 Summary\n");
    out.push_str(&format!("  Files scanned:     {}\n", report.stats.files_scanned));
    out.push_str(&format!("  Bytes scanned:     {}\n", format_bytes(report.stats.bytes_scanned)));
    out.push_str(&format!("  Duplicate files:   {}\n", report.stats.duplicate_files));
    out.push_str(&format!("  Duplicate folders: {}\n", report.folder_groups.len()));
    out.push_str(&format!("  Wasted bytes:      {}\n", format_bytes(report.stats.wasted_bytes)));
    out.push_str(&format!("  Workers used:      {}\n", report.stats.workers_used));
    out.push_str(&format!("  Confidence:        {:?}\n", report.stats.confidence));
    out.push_str(&format!("  Elapsed:           {:.2}s\n", report.stats.elapsed.as_secs_f64()));

    if !report.warnings.is_empty() {
        out.push_str("\n⚠️  Processing warnings summary\n");
        for (kind, count) in &report.warnings {
            out.push_str(&format!(
                "  {}: {}\n",
                Colors::colorize(Colors::WARNING, kind.as_str()),
                count
            ));
        }
    }

    out
}

/// Render `report` as a `serde_json::Value` matching the stable public schema:
/// `{ duplicate_files: [{hash,size,count,files:[{path,size,size_formatted}]}],
///    duplicate_folders: [{hash,file_count,total_bytes,count,folders:[{path}]}],
///    unique_files: [{path,size,size_formatted}], statistics, warnings }`.
/// This shape is a stable public interface and is deliberately distinct from the internal
/// `FileGroup`/`FolderGroup` types, which are free to change independently.
pub fn format_json(report: &Report) -> serde_json::Value {
    let duplicate_files: Vec<JsonDuplicateFileGroup> = report
        .file_groups
        .iter()
        .map(|g| JsonDuplicateFileGroup {
            hash: g.digest.clone(),
            size: g.size,
            count: g.members.len(),
            files: g.members.iter().map(|p| JsonFileEntry::new(p, g.size)).collect(),
        })
        .collect();

    let duplicate_folders: Vec<JsonDuplicateFolderGroup> = report
        .folder_groups
        .iter()
        .map(|g| JsonDuplicateFolderGroup {
            hash: g.digest.clone(),
            file_count: g.file_count,
            total_bytes: g.total_bytes,
            count: g.members.len(),
            folders: g.members.iter().map(|p| JsonFolderEntry { path: p.display().to_string() }).collect(),
        })
        .collect();

    let unique_files: Vec<JsonFileEntry> =
        report.unique_files.iter().map(|f| JsonFileEntry::new(&f.path, f.size)).collect();

    json!({
        "duplicate_files": duplicate_files,
        "duplicate_folders": duplicate_folders,
        "unique_files": unique_files,
        "statistics": report.stats,
        "warnings": report.warnings,
    })
}

pub fn to_json_string(report: &Report, pretty: bool) -> Result<String> {
    let value = format_json(report);
    if pretty {
        serde_json::to_string_pretty(&value).context("serialize report as pretty JSON")
    } else {
        serde_json::to_string(&value).context("serialize report as JSON")
    }
}

pub fn to_json_writer<W: Write>(report: &Report, writer: W) -> Result<()> {
    let value = format_json(report);
    serde_json::to_writer_pretty(writer, &value).context("write report as JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Confidence, FileEntry, Stats};
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn empty_report() -> Report {
        Report {
            file_groups: vec![],
            folder_groups: vec![],
            unique_files: vec![FileEntry { path: PathBuf::from("a.txt"), size: 3 }],
            stats: Stats {
                files_scanned: 1,
                bytes_scanned: 3,
                duplicate_files: 0,
                duplicate_bytes: 0,
                wasted_bytes: 0,
                workers_used: 4,
                confidence: Confidence::Exact,
                elapsed: Duration::from_millis(10),
            },
            warnings: BTreeMap::new(),
        }
    }

    #[test]
    fn json_schema_has_required_top_level_keys() {
        let report = empty_report();
        let value = format_json(&report);
        for key in ["duplicate_files", "duplicate_folders", "unique_files", "statistics", "warnings"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn json_schema_matches_public_contract() {
        use crate::report::{FileGroup, FolderGroup};

        let mut report = empty_report();
        report.file_groups = vec![FileGroup {
            digest: "abc123".to_string(),
            size: 1024,
            members: vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")],
        }];
        report.folder_groups = vec![FolderGroup {
            digest: "def456".to_string(),
            members: vec![PathBuf::from("x"), PathBuf::from("y")],
            file_count: 3,
            total_bytes: 4096,
        }];

        let value = format_json(&report);

        let file_group = &value["duplicate_files"][0];
        assert_eq!(file_group["hash"], "abc123");
        assert_eq!(file_group["size"], 1024);
        assert_eq!(file_group["count"], 2);
        assert_eq!(file_group["files"][0]["path"], "a.txt");
        assert_eq!(file_group["files"][0]["size"], 1024);
        assert_eq!(file_group["files"][0]["size_formatted"], "1.00 KB");

        let folder_group = &value["duplicate_folders"][0];
        assert_eq!(folder_group["hash"], "def456");
        assert_eq!(folder_group["file_count"], 3);
        assert_eq!(folder_group["total_bytes"], 4096);
        assert_eq!(folder_group["count"], 2);
        assert_eq!(folder_group["folders"][0]["path"], "x");

        let unique = &value["unique_files"][0];
        assert_eq!(unique["path"], "a.txt");
        assert_eq!(unique["size"], 3);
        assert!(unique["size_formatted"].is_string());
    }

    #[test]
    fn text_output_reports_no_duplicates() {
        let report = empty_report();
        let text = format_text(&report);
        assert!(text.contains("No duplicates found"));
    }
}
