//! Bounded worker pool for explicitly asynchronous processors.
//!
//! Jobs run off-thread, check a cooperative stop token, and hand results
//! back via the [`Dispatcher`](super::dispatcher::Dispatcher). The core
//! evaluation walk never suspends; pool completions simply participate in
//! the next pass.

use std::cmp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{error, info};

use crate::error::EngineError;

/// Cooperative cancellation flag checked by long-running jobs.
#[derive(Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

type Job = Box<dyn FnOnce(&StopToken) + Send>;

pub struct PoolConfig {
    pub workers: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers: None }
    }
}

impl PoolConfig {
    fn worker_count(&self) -> usize {
        if let Some(count) = self.workers {
            return cmp::max(1, count);
        }
        thread::available_parallelism()
            .map(|v| v.get())
            .unwrap_or(1)
    }
}

pub struct WorkerPool {
    job_tx: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    stop: StopToken,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Self {
        let worker_count = config.worker_count();
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let stop = StopToken::new();

        info!("worker pool starting {} worker(s)", worker_count);
        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let job_rx = Arc::clone(&job_rx);
            let stop = stop.clone();
            workers.push(thread::spawn(move || loop {
                let job = {
                    let receiver = job_rx.lock().expect("worker pool queue poisoned");
                    receiver.recv()
                };
                match job {
                    Ok(job) => job(&stop),
                    Err(_) => break,
                }
            }));
        }

        Self {
            job_tx: Some(job_tx),
            workers,
            stop,
        }
    }

    /// Submit a job. The closure receives the pool-wide stop token and must
    /// check it periodically; there is no forcible termination.
    pub fn submit(
        &self,
        job: impl FnOnce(&StopToken) + Send + 'static,
    ) -> Result<(), EngineError> {
        let sender = self
            .job_tx
            .as_ref()
            .ok_or_else(|| EngineError::Pool("pool already shut down".to_string()))?;
        sender
            .send(Box::new(job))
            .map_err(|_| EngineError::Pool("all workers exited".to_string()))
    }

    /// Request cooperative cancellation of running jobs.
    pub fn stop_all(&self) {
        self.stop.stop();
    }

    fn shutdown(&mut self) {
        if let Some(sender) = self.job_tx.take() {
            drop(sender);
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker pool thread panicked during shutdown");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn jobs_run_and_pool_joins_on_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(PoolConfig { workers: Some(2) });
            for _ in 0..8 {
                let counter = Arc::clone(&counter);
                pool.submit(move |_stop| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn stop_token_is_observed() {
        let observed = Arc::new(AtomicBool::new(false));
        let pool = WorkerPool::new(PoolConfig { workers: Some(1) });
        pool.stop_all();
        let observed2 = Arc::clone(&observed);
        pool.submit(move |stop| {
            observed2.store(stop.is_stopped(), Ordering::SeqCst);
        })
        .unwrap();
        drop(pool);
        assert!(observed.load(Ordering::SeqCst));
    }
}
