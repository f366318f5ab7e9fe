//! Orchestrates the walk and the three-stage duplicate-detection pipeline: size filter,
//! partial digest, full digest, followed by the folder roll-up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};

use crate::config::Config;
use crate::digest::{self, Digest};
use crate::disk_detect;
use crate::pool::{CancelToken, WorkerPool};
use crate::progress::{Event, ProgressSink, Stage};
use crate::report::{Confidence, FileEntry, FileGroup, Report, Stats};
use crate::rollup::{self, DirectoryTree};
use crate::walker::{self, WalkOutcome};
use crate::warnings::{Warning, WarningCollector, WarningKind};

/// Run the duplicate-detection pipeline over `root` with no external cancellation handle.
pub fn run(root: &Path, config: &Config, sink: &dyn ProgressSink) -> Result<Report> {
    run_with_cancel(root, config, sink, CancelToken::new())
}

/// Run the pipeline, honoring `cancel` for cooperative cancellation (e.g. wired to SIGINT).
pub fn run_with_cancel(root: &Path, config: &Config, sink: &dyn ProgressSink, cancel: CancelToken) -> Result<Report> {
    let started = Instant::now();

    let root = root.canonicalize().with_context(|| format!("root not found: {}", root.display()))?;
    if !root.is_dir() {
        bail!("root is not a directory: {}", root.display());
    }

    sink.on_event(Event::Started { root: root.clone() });

    let (auto_workers, drive_type) = disk_detect::resolve_worker_count(&root);
    let workers = config.workers.unwrap_or(auto_workers);
    let parallel_walk = config.parallel_walk.unwrap_or_else(|| drive_type.prefers_parallel_walk());

    let warnings = Arc::new(WarningCollector::new());
    let mut tree = DirectoryTree::new();
    let mut files: Vec<FileEntry> = Vec::new();

    if parallel_walk {
        for outcome in walker::walk_parallel(&root, config.follow_symlinks, &config.exclude) {
            if cancel.is_cancelled() {
                bail!("cancelled by user");
            }
            dispatch_outcome(outcome, &root, sink, &warnings, config.strict, &mut files, &mut tree)?;
        }
    } else {
        for outcome in walker::walk_serial(&root, config.follow_symlinks, &config.exclude) {
            if cancel.is_cancelled() {
                bail!("cancelled by user");
            }
            dispatch_outcome(outcome, &root, sink, &warnings, config.strict, &mut files, &mut tree)?;
        }
    }

    let files_scanned = files.len() as u64;
    let bytes_scanned: u64 = files.iter().map(|f| f.size).sum();

    let (file_groups_abs, unique_abs) = if config.metadata_only {
        stage_metadata_only(&files)
    } else {
        run_digest_stages(&files, config, workers, &cancel, &warnings, sink)?
    };

    // Feed the per-file digest key (or metadata key) into the directory tree for rollup,
    // and convert every path to root-relative before anything leaves this function.
    let mut group_digest_by_path: HashMap<PathBuf, String> = HashMap::new();
    for group in &file_groups_abs {
        for member in &group.members {
            group_digest_by_path.insert(member.clone(), group.digest.clone());
        }
    }

    for file in &files {
        let rel = file.path.strip_prefix(&root).unwrap_or(&file.path).to_path_buf();
        let key = if config.metadata_only {
            let basename = file.path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            format!("meta:{basename}:{}", file.size)
        } else {
            group_digest_by_path
                .get(&file.path)
                .cloned()
                .unwrap_or_else(|| format!("unique:{}", file.path.display()))
        };
        tree.add_file(rel, file.size, key);
    }

    let file_groups_rel: Vec<FileGroup> = file_groups_abs
        .into_iter()
        .map(|mut g| {
            g.members = g.members.into_iter().map(|p| p.strip_prefix(&root).unwrap_or(&p).to_path_buf()).collect();
            g
        })
        .collect();
    let unique_rel: Vec<FileEntry> = unique_abs
        .into_iter()
        .map(|mut f| {
            f.path = f.path.strip_prefix(&root).unwrap_or(&f.path).to_path_buf();
            f
        })
        .collect();

    sink.on_event(Event::StageProgress { stage: Stage::Rollup, done: 0, total: 1 });
    let (folder_groups, file_groups) = rollup::roll_up(&tree, file_groups_rel);
    sink.on_event(Event::StageProgress { stage: Stage::Rollup, done: 1, total: 1 });

    let duplicate_files: u64 = file_groups.iter().map(|g| g.members.len() as u64).sum();
    let duplicate_bytes: u64 = file_groups.iter().map(|g| g.size * g.members.len() as u64).sum();
    let wasted_bytes: u64 = file_groups.iter().map(|g| g.wasted_bytes()).sum::<u64>()
        + folder_groups.iter().map(|g| g.wasted_bytes()).sum::<u64>();

    let stats = Stats {
        files_scanned,
        bytes_scanned,
        duplicate_files,
        duplicate_bytes,
        wasted_bytes,
        workers_used: workers,
        confidence: if config.metadata_only { Confidence::MetadataOnly } else { Confidence::Exact },
        elapsed: started.elapsed(),
    };

    let mut report = Report {
        file_groups,
        folder_groups,
        unique_files: unique_rel,
        stats: stats.clone(),
        warnings: Arc::try_unwrap(warnings).map(|w| w.into_counts()).unwrap_or_default(),
    };
    report.sort_for_output();

    sink.on_event(Event::Finished { stats });
    Ok(report)
}

fn dispatch_outcome(
    outcome: WalkOutcome,
    root: &Path,
    sink: &dyn ProgressSink,
    warnings: &Arc<WarningCollector>,
    strict: bool,
    files: &mut Vec<FileEntry>,
    tree: &mut DirectoryTree,
) -> Result<()> {
    match outcome {
        WalkOutcome::File(entry) => {
            sink.on_event(Event::FileDiscovered { path: entry.path.clone(), size: entry.size });
            files.push(entry);
        }
        WalkOutcome::Dir(path) => {
            let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            tree.add_dir(rel);
        }
        WalkOutcome::Warning(w) => {
            if strict {
                bail!("{}: {} ({})", w.kind.as_str(), w.path.display(), w.message);
            }
            warnings.record(w);
        }
        WalkOutcome::Skipped => {}
    }
    Ok(())
}

/// Stage 1 in metadata-only mode: group directly by `(basename, size)`, no content read.
fn stage_metadata_only(files: &[FileEntry]) -> (Vec<FileGroup>, Vec<FileEntry>) {
    let mut buckets: HashMap<(String, u64), Vec<FileEntry>> = HashMap::new();
    for file in files {
        let basename = file.path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        buckets.entry((basename, file.size)).or_default().push(file.clone());
    }

    let mut groups = Vec::new();
    let mut unique = Vec::new();
    for ((basename, size), members) in buckets {
        if members.len() >= 2 {
            groups.push(FileGroup {
                digest: format!("meta:{basename}:{size}"),
                size,
                members: members.into_iter().map(|f| f.path).collect(),
            });
        } else {
            unique.extend(members);
        }
    }
    (groups, unique)
}

/// Stages 1-3 for the exact (non-metadata-only) path.
fn run_digest_stages(
    files: &[FileEntry],
    config: &Config,
    workers: usize,
    cancel: &CancelToken,
    warnings: &Arc<WarningCollector>,
    sink: &dyn ProgressSink,
) -> Result<(Vec<FileGroup>, Vec<FileEntry>)> {
    let mut size_buckets: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    for file in files {
        size_buckets.entry(file.size).or_default().push(file.clone());
    }

    let mut groups: Vec<FileGroup> = Vec::new();
    let mut unique: Vec<FileEntry> = Vec::new();

    // Zero-byte files are trivially identical; pool them into one group.
    if let Some(zero_bucket) = size_buckets.remove(&0) {
        if zero_bucket.len() >= 2 {
            groups.push(FileGroup {
                digest: "empty".to_string(),
                size: 0,
                members: zero_bucket.into_iter().map(|f| f.path).collect(),
            });
        } else {
            unique.extend(zero_bucket);
        }
    }

    let total_stage1 = size_buckets.len() as u64;
    let mut done_stage1 = 0u64;

    let mut small_candidates: Vec<FileEntry> = Vec::new(); // size <= partial_size_bytes
    let mut large_candidates: Vec<FileEntry> = Vec::new(); // size > partial_size_bytes

    for (size, members) in size_buckets {
        done_stage1 += 1;
        sink.on_event(Event::StageProgress { stage: Stage::SizeFilter, done: done_stage1, total: total_stage1 });
        if members.len() < 2 {
            unique.extend(members);
            continue;
        }
        if size as usize <= config.partial_size_bytes {
            small_candidates.extend(members);
        } else {
            large_candidates.extend(members);
        }
    }

    // In memory-efficient mode, each size's candidates are pushed through the digest stages
    // in batches of `batch_size` rather than all at once, bounding peak memory for
    // pathological inputs where many files share the same size. Results from every batch
    // accumulate into the same partial-digest map below, so a later batch's files still join
    // a partition a prior batch already started (the "cursor" SPEC_FULL.md describes).
    let batch_size = if config.memory_efficient { config.batch_size } else { 0 };

    // Files no larger than the partial prefix: one read gives the final digest directly.
    let mut small_digested = Vec::new();
    for chunk in batches(small_candidates, batch_size) {
        let partial_size = config.partial_size_bytes;
        let digested = digest_parallel(chunk, workers, cancel, warnings, sink, Stage::PartialDigest, config.strict, move |entry| {
            digest::partial(&entry.path, partial_size)
        })?;
        small_digested.extend(digested);
    }
    group_by_digest(small_digested, &mut groups, &mut unique);

    // Larger files: partial digest first to cheaply reject non-duplicates.
    let mut partial_digested = Vec::new();
    for chunk in batches(large_candidates, batch_size) {
        let partial_size = config.partial_size_bytes;
        let digested = digest_parallel(chunk, workers, cancel, warnings, sink, Stage::PartialDigest, config.strict, move |entry| {
            digest::partial(&entry.path, partial_size)
        })?;
        partial_digested.extend(digested);
    }

    let mut partial_buckets: HashMap<(u64, Digest), Vec<FileEntry>> = HashMap::new();
    for (entry, d) in partial_digested {
        partial_buckets.entry((entry.size, d)).or_default().push(entry);
    }

    let mut full_candidates: Vec<FileEntry> = Vec::new();
    for (_, members) in partial_buckets {
        if members.len() >= 2 {
            full_candidates.extend(members);
        } else {
            unique.extend(members);
        }
    }

    let mut full_digested = Vec::new();
    for chunk in batches(full_candidates, batch_size) {
        let chunk_size = config.chunk_size_bytes;
        let digested = digest_parallel(chunk, workers, cancel, warnings, sink, Stage::FullDigest, config.strict, move |entry| {
            digest::full(&entry.path, entry.size, chunk_size)
        })?;
        full_digested.extend(digested);
    }
    group_by_digest(full_digested, &mut groups, &mut unique);

    Ok((groups, unique))
}

/// Split `entries` into chunks of `batch_size` for bounded-memory processing. `batch_size ==
/// 0` means no batching: everything in one chunk.
fn batches(entries: Vec<FileEntry>, batch_size: usize) -> Vec<Vec<FileEntry>> {
    if batch_size == 0 || entries.is_empty() {
        return vec![entries];
    }
    let mut iter = entries.into_iter();
    let mut out = Vec::new();
    loop {
        let chunk: Vec<FileEntry> = iter.by_ref().take(batch_size).collect();
        if chunk.is_empty() {
            break;
        }
        out.push(chunk);
    }
    out
}

/// Classify an I/O failure the same way `walker.rs` classifies its own `symlink_metadata`
/// errors, by walking the error chain for the underlying `io::Error`.
fn classify_io_error(err: &anyhow::Error) -> WarningKind {
    for cause in err.chain() {
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            return match io_err.kind() {
                std::io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
                std::io::ErrorKind::NotFound => WarningKind::Vanished,
                _ => WarningKind::IoError,
            };
        }
    }
    WarningKind::IoError
}

/// Outcome of a single digest job, reported back through the worker pool.
enum JobOutcome {
    Digested(Digest),
    Failed(WarningKind, String),
    /// Cancelled before real work started: dropped silently, same as an in-flight job that
    /// never got submitted.
    Cancelled,
}

fn group_by_digest(digested: Vec<(FileEntry, Digest)>, groups: &mut Vec<FileGroup>, unique: &mut Vec<FileEntry>) {
    let mut buckets: HashMap<(u64, Digest), Vec<FileEntry>> = HashMap::new();
    for (entry, d) in digested {
        buckets.entry((entry.size, d)).or_default().push(entry);
    }
    for ((size, digest), members) in buckets {
        if members.len() >= 2 {
            groups.push(FileGroup { digest: digest.to_hex(), size, members: members.into_iter().map(|f| f.path).collect() });
        } else {
            unique.extend(members);
        }
    }
}

/// Run `f` over every entry in `entries` across `workers` threads. A failing job is
/// classified by `io::ErrorKind` (matching `walker.rs`) and recorded as a warning; when
/// `strict` is set, the first such failure aborts the run instead, matching the walker's own
/// strict-mode behavior.
fn digest_parallel<F>(
    entries: Vec<FileEntry>,
    workers: usize,
    cancel: &CancelToken,
    warnings: &Arc<WarningCollector>,
    sink: &dyn ProgressSink,
    stage: Stage,
    strict: bool,
    f: F,
) -> Result<Vec<(FileEntry, Digest)>>
where
    F: Fn(&FileEntry) -> Result<Digest> + Send + Sync + 'static,
{
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let total = entries.len() as u64;
    let f = Arc::new(f);
    // Set once a strict-mode failure fires, so in-flight and not-yet-submitted jobs stop
    // doing real work without touching the caller's own `cancel` token (that one is
    // reserved for external cancellation, e.g. SIGINT, and must not be left set here).
    let local_abort = Arc::new(AtomicBool::new(false));
    let pool: WorkerPool<FileEntry, (FileEntry, JobOutcome)> = WorkerPool::new(workers, cancel.clone(), {
        let f = Arc::clone(&f);
        let cancel = cancel.clone();
        let local_abort = Arc::clone(&local_abort);
        move |entry: FileEntry| {
            if cancel.is_cancelled() || local_abort.load(Ordering::Relaxed) {
                return (entry, JobOutcome::Cancelled);
            }
            match f(&entry) {
                Ok(d) => (entry, JobOutcome::Digested(d)),
                Err(e) => {
                    let kind = classify_io_error(&e);
                    (entry, JobOutcome::Failed(kind, e.to_string()))
                }
            }
        }
    });

    let mut results = Vec::with_capacity(entries.len());
    let mut done = 0u64;
    let mut first_failure: Option<anyhow::Error> = None;
    std::thread::scope(|scope| {
        scope.spawn({
            let pool = &pool;
            move || {
                for entry in entries {
                    if pool.submit(entry).is_err() {
                        break;
                    }
                }
            }
        });

        for _ in 0..total {
            match pool.recv() {
                Some((entry, JobOutcome::Digested(d))) => results.push((entry, d)),
                Some((entry, JobOutcome::Failed(kind, message))) => {
                    if strict && first_failure.is_none() {
                        first_failure = Some(anyhow!("{}: {} ({message})", kind.as_str(), entry.path.display()));
                        local_abort.store(true, Ordering::Relaxed);
                    } else {
                        warnings.record(Warning::new(kind, entry.path, message));
                    }
                }
                Some((_, JobOutcome::Cancelled)) => {}
                None => break,
            }
            done += 1;
            sink.on_event(Event::StageProgress { stage, done, total });
        }
    });
    pool.shutdown();

    match first_failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}
