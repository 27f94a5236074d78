//! Module `pool` implements the task-pool collaborator that runs
//! background rebuilds without blocking the foreground request path.
//!
//! The design treats the pool purely as an interface -- "posts opaque
//! work items; interface only" -- so [`BackgroundPool`] is kept narrow.
//! [`ThreadPool`] is the crate's concrete implementation, grounded on
//! the gen-server `Thread`/`Pool` pattern in `crate::util::thread`
//! (itself adapted from the teacher's `util::thread` module).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::util::thread::Pool as ThreadGenPool;

/// An opaque unit of background work: build a replacement subtree and
/// hand it back to its parent node.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Interface a caller needs from a background task pool.
///
/// Grounded on §6's "External pool interface (collaborator)".
pub trait BackgroundPool: Send + Sync {
    /// Post `job` for asynchronous execution; does not block.
    fn submit(&self, job: Job);

    /// Approximate number of jobs submitted but not yet completed, used
    /// by the index façade's back-pressure rule.
    fn queued_depth(&self) -> usize;

    /// Post `job` and block the caller until it completes.
    fn submit_and_wait(&self, job: Job) {
        let (tx, rx) = std::sync::mpsc::channel();
        self.submit(Box::new(move || {
            job();
            let _ = tx.send(());
        }));
        let _ = rx.recv();
    }
}

/// Runs rebuild jobs on a fixed-size thread pool.
///
/// `depth` is an approximate in-flight job counter: incremented on
/// submit, decremented when a job's closure returns, since the
/// underlying `mpsc` channel does not expose its own backlog length.
pub struct ThreadPool {
    pool: ThreadGenPool<Job>,
    depth: Arc<AtomicUsize>,
}

impl ThreadPool {
    pub fn new(num_workers: usize) -> ThreadPool {
        let depth = Arc::new(AtomicUsize::new(0));
        let mut pool: ThreadGenPool<Job> = ThreadGenPool::new("adaptix-rebuild");
        pool.set_pool_size(num_workers.max(1));
        pool.spawn(|rx| {
            move || {
                for job in rx.iter() {
                    job();
                }
            }
        });
        ThreadPool { pool, depth }
    }

    /// Drain and join every worker, per the design's shutdown primitive
    /// requirement -- required before tearing down a tree with
    /// in-flight rebuilds.
    pub fn close_wait(self) -> Result<()> {
        self.pool.close_wait()?;
        Ok(())
    }
}

impl BackgroundPool for ThreadPool {
    fn submit(&self, job: Job) {
        let depth = Arc::clone(&self.depth);
        let wrapped: Job = Box::new(move || {
            job();
            depth.fetch_sub(1, Ordering::AcqRel);
        });
        self.depth.fetch_add(1, Ordering::AcqRel);
        // A post failure means every worker thread has already exited;
        // treat it the same as the job never having been submitted.
        let _ = self.pool.post(wrapped);
    }

    fn queued_depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }
}

/// Runs every job inline on the submitting thread. Used when the index
/// is constructed without a pool (`Index::new(0, None)` per §6).
pub struct InlinePool;

impl BackgroundPool for InlinePool {
    fn submit(&self, job: Job) {
        job();
    }

    fn queued_depth(&self) -> usize {
        0
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
