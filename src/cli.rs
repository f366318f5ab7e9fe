//! Command-line argument parsing. All decision logic lives in [`crate::pipeline`]; this
//! layer only translates flags into a [`Config`] and picks a renderer and exit code.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "dupsweep", version, about = "Find duplicate files and folders by content")]
pub struct Cli {
    /// Directory to scan.
    pub root: PathBuf,

    /// Number of worker threads for digesting. Defaults to an adaptive guess based on CPU
    /// count and (best-effort) drive type.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Bytes read for the cheap partial-digest prefilter.
    #[arg(long)]
    pub partial_size_bytes: Option<usize>,

    /// Read chunk size for full-content digesting.
    #[arg(long)]
    pub chunk_size_bytes: Option<usize>,

    /// Process size buckets in batches of this many entries (0 = no batching).
    #[arg(long, default_value_t = 0)]
    pub batch_size: usize,

    /// Flush size buckets to bounded-memory batches as they fill, instead of holding every
    /// bucket until the walk finishes.
    #[arg(long)]
    pub memory_efficient: bool,

    /// Skip content reads entirely; group by (basename, size) only. Faster, approximate.
    #[arg(long)]
    pub metadata_only: bool,

    /// Follow symlinked regular files (directory symlinks are never followed).
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Glob pattern to exclude from the walk; may be passed multiple times.
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Abort the run on the first non-fatal error instead of recording a warning.
    #[arg(long)]
    pub strict: bool,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Suppress the terminal progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Enable debug-level logging for this crate.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Merge the on-disk `.dupsweep.toml` (if any) with the flags the user actually passed.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load_from_root(&self.root)?;
        if let Some(w) = self.workers {
            config.workers = Some(w);
        }
        if let Some(p) = self.partial_size_bytes {
            config.partial_size_bytes = p;
        }
        if let Some(c) = self.chunk_size_bytes {
            config.chunk_size_bytes = c;
        }
        if self.batch_size != 0 {
            config.batch_size = self.batch_size;
        }
        if self.memory_efficient {
            config.memory_efficient = true;
        }
        if self.metadata_only {
            config.metadata_only = true;
        }
        if self.follow_symlinks {
            config.follow_symlinks = true;
        }
        if !self.exclude.is_empty() {
            config.exclude.extend(self.exclude.iter().cloned());
        }
        if self.strict {
            config.strict = true;
        }
        Ok(config)
    }
}
