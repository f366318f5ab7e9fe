//! Pipeline configuration: options enumerated in full in the design notes, loadable from a
//! `.dupsweep.toml` sidecar file and overridden by explicit CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::config::{HashingConsts, PackagePaths};

/// Pipeline options. `Config::default()` matches the documented defaults; library callers
/// build one with the `with_*` methods, the CLI builds one via `load_with_cli_overrides`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workers: Option<usize>,
    pub partial_size_bytes: usize,
    pub chunk_size_bytes: usize,
    pub batch_size: usize,
    pub memory_efficient: bool,
    pub metadata_only: bool,
    pub follow_symlinks: bool,
    pub exclude: Vec<String>,
    pub strict: bool,
    pub parallel_walk: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: None,
            partial_size_bytes: HashingConsts::DEFAULT_PARTIAL_SIZE_BYTES,
            chunk_size_bytes: HashingConsts::DEFAULT_CHUNK_SIZE_BYTES,
            batch_size: 0,
            memory_efficient: false,
            metadata_only: false,
            follow_symlinks: false,
            exclude: Vec::new(),
            strict: false,
            parallel_walk: None,
        }
    }
}

impl Config {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_partial_size_bytes(mut self, n: usize) -> Self {
        self.partial_size_bytes = n;
        self
    }

    pub fn with_chunk_size_bytes(mut self, n: usize) -> Self {
        self.chunk_size_bytes = n;
        self
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_memory_efficient(mut self, v: bool) -> Self {
        self.memory_efficient = v;
        self
    }

    pub fn with_metadata_only(mut self, v: bool) -> Self {
        self.metadata_only = v;
        self
    }

    pub fn with_follow_symlinks(mut self, v: bool) -> Self {
        self.follow_symlinks = v;
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    pub fn with_strict(mut self, v: bool) -> Self {
        self.strict = v;
        self
    }

    /// Search upward from `root` for a `.dupsweep.toml` sidecar and merge it over the
    /// defaults. Returns `Ok(Config::default())` if none is found.
    pub fn load_from_root(root: &Path) -> Result<Self> {
        match find_config_file(root) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("read config file {}", path.display()))?;
                let config: Config = toml::from_str(&text)
                    .with_context(|| format!("parse config file {}", path.display()))?;
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }
}

fn find_config_file(root: &Path) -> Option<PathBuf> {
    let filename = PackagePaths::get().config_filename();
    let mut dir = Some(root);
    while let Some(d) = dir {
        let candidate = d.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}
