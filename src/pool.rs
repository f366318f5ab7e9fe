//! A bounded worker pool with cooperative cancellation.
//!
//! Jobs are submitted to a channel of capacity `workers`, so a submit call blocks once
//! `workers` jobs are in flight. Results arrive on a separate channel in arbitrary order;
//! callers must not rely on cross-job ordering.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded};

/// Shared cancellation flag, checked by workers at job boundaries. Wired to SIGINT at the
/// CLI layer via `ctrlc`; library callers can set it directly.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A fixed-size pool of worker threads executing `J -> R` jobs submitted via `submit`.
/// Results are collected with `recv` (or by iterating `results()`).
pub struct WorkerPool<J, R>
where
    J: Send + 'static,
    R: Send + 'static,
{
    job_tx: Sender<J>,
    result_rx: Receiver<R>,
    handles: Vec<JoinHandle<()>>,
}

impl<J, R> WorkerPool<J, R>
where
    J: Send + 'static,
    R: Send + 'static,
{
    /// Spawn `workers` threads, each running `process` over jobs pulled from the shared
    /// channel until it is closed or `cancel` is set.
    pub fn new<F>(workers: usize, cancel: CancelToken, process: F) -> Self
    where
        F: Fn(J) -> R + Send + Sync + 'static,
    {
        let workers = workers.max(1);
        let (job_tx, job_rx) = bounded::<J>(workers);
        let (result_tx, result_rx) = bounded::<R>(workers * 2);
        let process = Arc::new(process);

        // Cancellation is honored by the job closure itself (it may short-circuit and
        // return immediately once `cancel` is set), not by this loop: every dequeued job
        // must still produce exactly one result, or a caller blocked on `recv()` waiting
        // for the remaining in-flight count would hang forever.
        let _ = &cancel;
        let handles = (0..workers)
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let process = Arc::clone(&process);
                std::thread::spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        let result = process(job);
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();

        Self { job_tx, result_rx, handles }
    }

    /// Block until there is room in the queue, then enqueue `job`. Returns an error if all
    /// workers have exited (e.g. after cancellation drained the pool).
    pub fn submit(&self, job: J) -> Result<(), crossbeam_channel::SendError<J>> {
        self.job_tx.send(job)
    }

    /// Receive the next available result, blocking until one arrives or the pool is drained.
    pub fn recv(&self) -> Option<R> {
        self.result_rx.recv().ok()
    }

    /// Close the job channel (no more submissions), then join all workers. Must be called
    /// before dropping the pool to guarantee every file handle opened by a job is released.
    pub fn shutdown(self) {
        drop(self.job_tx);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_all_jobs() {
        let cancel = CancelToken::new();
        let pool: WorkerPool<u32, u32> = WorkerPool::new(4, cancel, |x| x * 2);
        for i in 0..20u32 {
            pool.submit(i).unwrap();
        }
        let mut results = Vec::new();
        for _ in 0..20 {
            results.push(pool.recv().unwrap());
        }
        results.sort();
        pool.shutdown();
        assert_eq!(results, (0..20u32).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn cancellation_stops_new_work() {
        let cancel = CancelToken::new();
        let pool: WorkerPool<u32, u32> = WorkerPool::new(2, cancel.clone(), |x| x);
        cancel.cancel();
        // Workers may still drain a job or two already pulled, but the pool must still
        // shut down cleanly without hanging.
        pool.shutdown();
    }
}
