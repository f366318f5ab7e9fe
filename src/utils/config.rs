//! Application-wide tuning constants.

use std::sync::OnceLock;

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Sidecar config filename searched for above the scan root, e.g. `.dupsweep.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

/// Worker-count limits for drive-type-based tuning (§9 adaptive heuristic).
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits;

impl WorkerThreadLimits {
    /// Cap applied when the drive type cannot be determined.
    pub const UNKNOWN_MAX_THREADS: usize = 8;
    /// Worker count used for network mounts (conservative, avoid saturating a shared link).
    pub const NETWORK_THREADS: usize = 2;
    /// Worker count used for rotational disks (seeks dominate; more threads thrash).
    pub const HDD_THREADS: usize = 2;
}

/// Progress batching tuning, shared by the walker and worker pool progress emission.
pub struct ProgressConsts;

impl ProgressConsts {
    /// Batch size for progress events during a directory walk (reduces sink call overhead).
    pub const WALK_UPDATE_BATCH_SIZE: usize = 100;
    /// Target number of progress updates emitted per stage (~100 total regardless of size).
    pub const ADAPTIVE_PROGRESS_TARGET_UPDATES: usize = 100;
    /// Minimum chunk size for adaptive progress batching (avoid too-frequent updates).
    pub const ADAPTIVE_CHUNK_MIN: usize = 10;
}

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which digesting uses memory-mapped I/O (bytes).
    pub const HASH_MMAP_THRESHOLD: u64 = 64 * 1024 * 1024;
    /// Default partial-digest prefix length (bytes).
    pub const DEFAULT_PARTIAL_SIZE_BYTES: usize = 4096;
    /// Default full-digest read chunk size (bytes).
    pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 65536;
}

/// Channel capacity (in-flight entries) tuned by drive type for the walker-to-pipeline channel.
pub struct StreamingChannelCap;

impl StreamingChannelCap {
    pub const DEFAULT_SSD: usize = 4096;
    pub const DEFAULT_HDD: usize = 512;
    pub const DEFAULT_NETWORK: usize = 256;
    pub const DEFAULT_UNKNOWN: usize = 1024;
}
