use std::fs;
use std::path::PathBuf;

use dupsweep::{Confidence, Config, NoopSink};

fn run(root: &std::path::Path, config: &Config) -> dupsweep::Report {
    dupsweep::run(root, config, &NoopSink).expect("pipeline run should succeed")
}

fn rel(paths: &[PathBuf]) -> Vec<String> {
    let mut v: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    v.sort();
    v
}

#[test]
fn identical_files_form_one_group() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same content").unwrap();
    fs::write(dir.path().join("b.txt"), b"same content").unwrap();

    let report = run(dir.path(), &Config::default());

    assert_eq!(report.file_groups.len(), 1);
    assert_eq!(rel(&report.file_groups[0].members), vec!["a.txt", "b.txt"]);
    assert!(report.unique_files.is_empty());
    assert_eq!(report.stats.confidence, Confidence::Exact);
}

#[test]
fn unique_file_is_not_grouped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), b"nothing else like me").unwrap();

    let report = run(dir.path(), &Config::default());

    assert!(report.file_groups.is_empty());
    assert_eq!(report.unique_files.len(), 1);
    assert_eq!(report.unique_files[0].path, PathBuf::from("only.txt"));
}

#[test]
fn same_size_different_content_are_not_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), [1u8; 64]).unwrap();
    fs::write(dir.path().join("b.bin"), [2u8; 64]).unwrap();

    let report = run(dir.path(), &Config::default());

    assert!(report.file_groups.is_empty());
    assert_eq!(report.unique_files.len(), 2);
}

#[test]
fn zero_byte_files_pool_into_a_single_group() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("empty1"), b"").unwrap();
    fs::write(dir.path().join("empty2"), b"").unwrap();
    fs::write(dir.path().join("empty3"), b"").unwrap();

    let report = run(dir.path(), &Config::default());

    assert_eq!(report.file_groups.len(), 1);
    assert_eq!(report.file_groups[0].members.len(), 3);
    assert_eq!(report.file_groups[0].size, 0);
}

#[test]
fn lone_zero_byte_file_is_unique() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("empty"), b"").unwrap();

    let report = run(dir.path(), &Config::default());

    assert!(report.file_groups.is_empty());
    assert_eq!(report.unique_files.len(), 1);
}

#[test]
fn files_within_partial_prefix_skip_full_digest_but_still_group() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"short").unwrap();
    fs::write(dir.path().join("b.txt"), b"short").unwrap();

    // partial_size_bytes larger than the file: stage 3 has nothing to do, and the
    // partial digest alone must be enough to form the group.
    let config = Config::default().with_partial_size_bytes(4096);
    let report = run(dir.path(), &config);

    assert_eq!(report.file_groups.len(), 1);
    assert_eq!(report.file_groups[0].members.len(), 2);
}

#[test]
fn duplicate_subtrees_roll_up_into_a_folder_group() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("backup/photos")).unwrap();
    fs::create_dir_all(dir.path().join("photos")).unwrap();
    fs::write(dir.path().join("photos/cat.jpg"), b"meow").unwrap();
    fs::write(dir.path().join("backup/photos/cat.jpg"), b"meow").unwrap();

    let report = run(dir.path(), &Config::default());

    assert_eq!(report.folder_groups.len(), 1);
    let members = rel(&report.folder_groups[0].members);
    assert_eq!(members, vec!["backup/photos", "photos"]);
    // The file-level duplicate is fully represented by the folder group now.
    assert!(report.file_groups.is_empty());
}

#[test]
fn ancestor_directory_suppresses_nested_duplicate_reporting() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("left/inner")).unwrap();
    fs::create_dir_all(dir.path().join("right/inner")).unwrap();
    fs::write(dir.path().join("left/a.txt"), b"one").unwrap();
    fs::write(dir.path().join("right/a.txt"), b"one").unwrap();
    fs::write(dir.path().join("left/inner/b.txt"), b"two").unwrap();
    fs::write(dir.path().join("right/inner/b.txt"), b"two").unwrap();

    let report = run(dir.path(), &Config::default());

    assert_eq!(report.folder_groups.len(), 1);
    let members = rel(&report.folder_groups[0].members);
    assert_eq!(members, vec!["left", "right"]);
}

#[test]
fn metadata_only_groups_by_basename_and_size_without_reading_content() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("x/report.csv"), b"").unwrap_or(()); // ensure parent exists below
    fs::create_dir_all(dir.path().join("x")).unwrap();
    fs::create_dir_all(dir.path().join("y")).unwrap();
    fs::write(dir.path().join("x/report.csv"), b"aaaa").unwrap();
    fs::write(dir.path().join("y/report.csv"), b"bbbb").unwrap();

    let config = Config::default().with_metadata_only(true);
    let report = run(dir.path(), &config);

    assert_eq!(report.stats.confidence, Confidence::MetadataOnly);
    assert_eq!(report.file_groups.len(), 1);
    assert_eq!(report.file_groups[0].members.len(), 2);
}

#[test]
fn idempotent_on_an_unchanged_tree() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"one").unwrap();
    fs::write(dir.path().join("b.txt"), b"one").unwrap();
    fs::write(dir.path().join("c.txt"), b"two").unwrap();

    let config = Config::default();
    let first = dupsweep::format::to_json_string(&run(dir.path(), &config), false).unwrap();
    let second = dupsweep::format::to_json_string(&run(dir.path(), &config), false).unwrap();

    assert_eq!(first, second);
}

#[test]
fn renaming_a_duplicate_preserves_its_group() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"duplicate content").unwrap();
    fs::write(dir.path().join("b.txt"), b"duplicate content").unwrap();

    let config = Config::default();
    let before = run(dir.path(), &config);
    assert_eq!(before.file_groups.len(), 1);

    fs::rename(dir.path().join("b.txt"), dir.path().join("renamed.txt")).unwrap();
    let after = run(dir.path(), &config);

    assert_eq!(after.file_groups.len(), 1);
    assert_eq!(after.file_groups[0].digest, before.file_groups[0].digest);
    assert_eq!(rel(&after.file_groups[0].members), vec!["a.txt", "renamed.txt"]);
}

#[cfg(unix)]
#[test]
fn broken_symlink_produces_exactly_one_warning() {
    use dupsweep::WarningKind;

    let dir = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();
    fs::write(dir.path().join("real.txt"), b"content").unwrap();

    let config = Config::default().with_follow_symlinks(true);
    let report = run(dir.path(), &config);

    assert_eq!(report.warnings.get(&WarningKind::BrokenSymlink).copied().unwrap_or(0), 1);
    assert_eq!(report.unique_files.len(), 1);
}
