//! Cross-platform drive-type detection, feeding the adaptive worker-count heuristic.

use std::path::Path;

use crate::utils::config::WorkerThreadLimits;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

pub mod network;

/// Drive type for performance tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveType {
    SSD,
    HDD,
    Network,
    Unknown,
}

impl DriveType {
    /// Worker count for this drive type given `cpu_count`, per the adaptive heuristic:
    /// `cpu_count * 2` for SSD, `2` for HDD, `min(cpu_count, 8)` for Unknown, a conservative
    /// floor for Network. The implementation may differ from this exact formula in the
    /// future, but the chosen count is always recorded in `Stats::workers_used`.
    pub fn worker_count(&self, cpu_count: usize) -> usize {
        match self {
            DriveType::SSD => cpu_count.saturating_mul(2).max(1),
            DriveType::HDD => WorkerThreadLimits::HDD_THREADS,
            DriveType::Unknown => cpu_count.min(WorkerThreadLimits::UNKNOWN_MAX_THREADS).max(1),
            DriveType::Network => WorkerThreadLimits::NETWORK_THREADS,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, DriveType::Network)
    }

    pub fn prefers_parallel_walk(&self) -> bool {
        matches!(self, DriveType::SSD | DriveType::Unknown)
    }
}

/// Detect drive type for the given path.
pub fn drive_type_for_path(path: &Path) -> DriveType {
    #[cfg(target_os = "macos")]
    {
        macos::detect(path)
    }
    #[cfg(target_os = "linux")]
    {
        linux::detect(path)
    }
    #[cfg(target_os = "windows")]
    {
        windows::detect(path)
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        log::debug!("unsupported platform for drive detection: {}", path.display());
        DriveType::Unknown
    }
}

/// Resolve the worker count to use for `path` when the caller did not pin one explicitly,
/// honoring both the drive-type heuristic and the process's file-descriptor headroom.
pub fn resolve_worker_count(path: &Path) -> (usize, DriveType) {
    let drive_type = drive_type_for_path(path);
    let cpu_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
    let mut workers = drive_type.worker_count(cpu_count);
    if let Some(fd_cap) = crate::utils::fd_limit::max_workers_by_fd_limit() {
        workers = workers.min(fd_cap);
    }
    (workers.max(1), drive_type)
}
