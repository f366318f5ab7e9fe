//! Content-addressed duplicate file and folder detector.
//!
//! Walks a directory tree in parallel, filters candidate files by size then by partial and
//! full content digest, and rolls up duplicate subtrees into folder-level groups. See
//! [`pipeline::run`] for the single library entry point.

pub mod cli;
pub mod config;
pub mod digest;
pub mod disk_detect;
pub mod format;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod report;
pub mod rollup;
pub mod utils;
pub mod walker;
pub mod warnings;

pub use config::Config;
pub use pipeline::{run, run_with_cancel};
pub use pool::CancelToken;
pub use progress::{Event, NoopSink, ProgressSink, Stage, TerminalSink, TestSink};
pub use report::{Confidence, FileEntry, FileGroup, FolderGroup, Report, Stats};
pub use warnings::{Warning, WarningCollector, WarningKind};
