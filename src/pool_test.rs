use super::*;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;

#[test]
fn test_inline_pool_runs_synchronously() {
    let pool = InlinePool;
    let seen = Arc::new(AtomicI64::new(0));
    let seen2 = Arc::clone(&seen);
    pool.submit(Box::new(move || {
        seen2.store(42, Ordering::Release);
    }));
    assert_eq!(seen.load(Ordering::Acquire), 42);
    assert_eq!(pool.queued_depth(), 0);
}

#[test]
fn test_thread_pool_runs_jobs_and_tracks_depth() {
    let pool = ThreadPool::new(2);
    let seen = Arc::new(AtomicI64::new(0));
    for _ in 0..50 {
        let seen = Arc::clone(&seen);
        pool.submit(Box::new(move || {
            seen.fetch_add(1, Ordering::AcqRel);
        }));
    }
    pool.close_wait().unwrap();
    assert_eq!(seen.load(Ordering::Acquire), 50);
}

#[test]
fn test_submit_and_wait_blocks_until_done() {
    let pool = ThreadPool::new(1);
    let seen = Arc::new(AtomicI64::new(0));
    let seen2 = Arc::clone(&seen);
    pool.submit_and_wait(Box::new(move || {
        seen2.store(7, Ordering::Release);
    }));
    assert_eq!(seen.load(Ordering::Acquire), 7);
    pool.close_wait().unwrap();
}
