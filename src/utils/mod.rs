pub mod config;
pub mod fd_limit;
pub mod logger;

pub use config::{HashingConsts, PackagePaths, ProgressConsts, StreamingChannelCap, WorkerThreadLimits};
pub use fd_limit::{FDS_PER_WORKER, max_open_fds, max_workers_by_fd_limit};
pub use logger::{Colors, setup_logging};
