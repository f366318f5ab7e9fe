//! Streaming directory walker.
//!
//! Two backends are available, selected by `Config::parallel_walk` (or derived by
//! `disk_detect` when unset): `walkdir` for serial, name-ordered enumeration, and `jwalk`
//! for parallel enumeration on fast local disks. Both funnel into the same `WalkOutcome`
//! so the pipeline is oblivious to which backend produced an entry.

use std::fs;
use std::path::{Path, PathBuf};

use crate::report::FileEntry;
use crate::warnings::{Warning, WarningKind};

/// One outcome of visiting a directory entry during the walk.
pub enum WalkOutcome {
    File(FileEntry),
    Dir(PathBuf),
    Warning(Warning),
    /// Silently skipped: special file (device/FIFO/socket) or an excluded path.
    Skipped,
}

/// OS junk files excluded from every walk regardless of user-supplied patterns.
fn is_os_hidden_file(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(".DS_Store" | ".AppleDouble" | ".LSOverride") => true,
        Some("Thumbs.db" | "ehthumbs.db" | "Desktop.ini" | "$RECYCLE.BIN") => true,
        Some(".directory") => true,
        Some(name) => name.starts_with("._"),
        None => false,
    }
}

/// Simple glob matching supporting `*` and `?`, applied against both the basename and the
/// full path so patterns like `*.tmp` and `build/*` both work.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
    let mut pattern_chars = pattern.chars().peekable();
    let mut text_chars = text.chars().peekable();

    while let Some(&p) = pattern_chars.peek() {
        match p {
            '*' => {
                pattern_chars.next();
                if pattern_chars.peek().is_none() {
                    return true;
                }
                while text_chars.peek().is_some() {
                    if glob_match(&pattern_chars.clone().collect::<String>(), &text_chars.clone().collect::<String>()) {
                        return true;
                    }
                    text_chars.next();
                }
                return false;
            }
            '?' => {
                pattern_chars.next();
                if text_chars.next().is_none() {
                    return false;
                }
            }
            _ => {
                pattern_chars.next();
                if text_chars.next() != Some(p) {
                    return false;
                }
            }
        }
    }
    text_chars.peek().is_none()
}

pub fn should_exclude(path: &Path, exclude_patterns: &[String]) -> bool {
    if is_os_hidden_file(path) {
        return true;
    }
    if exclude_patterns.is_empty() {
        return false;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| glob_match(pattern, name) || glob_match(pattern, &path_str))
}

/// Classify a single directory entry reached by either walk backend.
///
/// `follow_symlinks` controls file symlinks only; directory symlinks are never followed.
fn classify(path: &Path, follow_symlinks: bool, exclude_patterns: &[String]) -> WalkOutcome {
    if should_exclude(path, exclude_patterns) {
        return WalkOutcome::Skipped;
    }

    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return WalkOutcome::Warning(Warning::new(WarningKind::Vanished, path, "vanished before stat"));
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return WalkOutcome::Warning(Warning::new(WarningKind::PermissionDenied, path, e.to_string()));
        }
        Err(e) => {
            return WalkOutcome::Warning(Warning::new(WarningKind::IoError, path, e.to_string()));
        }
    };

    if meta.is_dir() {
        return WalkOutcome::Dir(path.to_path_buf());
    }

    if meta.file_type().is_symlink() {
        if !follow_symlinks {
            return WalkOutcome::Skipped;
        }
        return match fs::metadata(path) {
            Ok(target_meta) if target_meta.is_file() => {
                WalkOutcome::File(FileEntry { path: path.to_path_buf(), size: target_meta.len() })
            }
            Ok(_) => WalkOutcome::Skipped,
            Err(_) => WalkOutcome::Warning(Warning::new(WarningKind::BrokenSymlink, path, "symlink target missing")),
        };
    }

    if meta.is_file() {
        return WalkOutcome::File(FileEntry { path: path.to_path_buf(), size: meta.len() });
    }

    // Device, FIFO, socket, or similar special file.
    WalkOutcome::Skipped
}

/// Walk `root` using the serial `walkdir` backend. Directory entries are sorted by name at
/// each level so output is reproducible across runs.
pub fn walk_serial(root: &Path, follow_symlinks: bool, exclude_patterns: &[String]) -> impl Iterator<Item = WalkOutcome> + '_ {
    walkdir::WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(e) if e.path() == root => None,
            Ok(e) => Some(classify(e.path(), follow_symlinks, exclude_patterns)),
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                Some(WalkOutcome::Warning(warning_for_walkdir_error(&e, path)))
            }
        })
        .filter(|o| !matches!(o, WalkOutcome::Dir(p) if p == root))
}

fn warning_for_walkdir_error(e: &walkdir::Error, path: PathBuf) -> Warning {
    if let Some(io_err) = e.io_error() {
        if io_err.kind() == std::io::ErrorKind::PermissionDenied {
            return Warning::new(WarningKind::PermissionDenied, path, io_err.to_string());
        }
        if io_err.kind() == std::io::ErrorKind::NotFound {
            return Warning::new(WarningKind::Vanished, path, "vanished during walk");
        }
        return Warning::new(WarningKind::IoError, path, io_err.to_string());
    }
    Warning::new(WarningKind::IoError, path, e.to_string())
}

/// Walk `root` using the parallel `jwalk` backend. Faster on SSDs; entry order across runs
/// is deterministic per run but not guaranteed name-sorted.
pub fn walk_parallel(root: &Path, follow_symlinks: bool, exclude_patterns: &[String]) -> impl Iterator<Item = WalkOutcome> + '_ {
    jwalk::WalkDir::new(root)
        .sort(false)
        .skip_hidden(false)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(e) if e.path() == root => None,
            Ok(e) => Some(classify(&e.path(), follow_symlinks, exclude_patterns)),
            Err(e) => Some(Warning::new(WarningKind::IoError, root.to_path_buf(), e.to_string())).map(WalkOutcome::Warning),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_matches_suffix() {
        assert!(glob_match("*.tmp", "foo.tmp"));
        assert!(!glob_match("*.tmp", "foo.txt"));
    }

    #[test]
    fn glob_question_matches_single_char() {
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "abbc"));
    }

    #[test]
    fn hidden_os_files_excluded() {
        assert!(should_exclude(Path::new("/tmp/x/.DS_Store"), &[]));
        assert!(!should_exclude(Path::new("/tmp/x/readme.txt"), &[]));
    }

    #[test]
    fn walk_serial_finds_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"world").unwrap();

        let files: Vec<_> = walk_serial(dir.path(), false, &[])
            .filter_map(|o| match o {
                WalkOutcome::File(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn broken_symlink_is_a_warning() {
        #[cfg(unix)]
        {
            let dir = tempfile::tempdir().unwrap();
            let target = dir.path().join("missing");
            let link = dir.path().join("link");
            std::os::unix::fs::symlink(&target, &link).unwrap();

            let outcomes: Vec<_> = walk_serial(dir.path(), true, &[]).collect();
            let warnings: Vec<_> = outcomes
                .iter()
                .filter_map(|o| match o {
                    WalkOutcome::Warning(w) => Some(w.kind),
                    _ => None,
                })
                .collect();
            assert_eq!(warnings, vec![WarningKind::BrokenSymlink]);
        }
    }
}
