//! Module `thread` implements a single-purpose gen-server thread pool:
//! every worker holds its own `main_loop`, receives opaque work items on
//! a channel, and runs them fire-and-forget. Inspired by the Erlang
//! gen-server model, trimmed to the one shape `crate::pool::ThreadPool`
//! actually needs -- post a job, never wait on a per-job reply (waiting
//! on completion, when a caller needs it, is layered on top by wrapping
//! the job itself in a one-shot channel, see `BackgroundPool::submit_and_wait`).

use std::{
    mem,
    sync::{mpsc, Arc, Mutex},
    thread,
};

use crate::error::Result;

/// Thread type, providing gen-server pattern to do multi-threading.
///
/// NOTE: When a thread value is dropped, it is made sure that there are no dangling
/// thread routines. To achieve this following requirements need to be satisfied:
///
/// * The thread's main loop should handle _disconnect_ signal on its [Rx] channel.
/// * Call `join()` on the [Thread] instance.
pub struct Thread<Q, T = ()> {
    name: String,
    inner: Option<Inner<Q, T>>,
}

struct Inner<Q, T> {
    handle: thread::JoinHandle<T>,
    tx: Option<Arc<Mutex<Tx<Q>>>>,
}

impl<Q, T> Inner<Q, T> {
    fn join(mut self) -> Result<T> {
        mem::drop(self.tx.take());

        match self.handle.join() {
            Ok(val) => Ok(val),
            Err(err) => err_at!(ThreadFail, msg: "fail {:?}", err),
        }
    }
}

impl<Q, T> Drop for Thread<Q, T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.join().ok();
        }
    }
}

impl<Q, T> Thread<Q, T> {
    /// Create a new Thread instance, using asynchronous channel with infinite buffer.
    /// `main_loop` shall be called with the rx side of the channel and shall return
    /// a function that can be spawned using thread::spawn.
    pub fn new<F, N>(name: &str, main_loop: F) -> Thread<Q, T>
    where
        F: 'static + FnOnce(Rx<Q>) -> N + Send,
        N: 'static + Send + FnOnce() -> T,
        T: 'static + Send,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(main_loop(rx));

        let tx = Some(Arc::new(Mutex::new(Tx::N(tx))));

        Thread {
            name: name.to_string(),
            inner: Some(Inner { handle, tx }),
        }
    }

    /// Create a new Thread instance, using synchronous channel with finite buffer.
    pub fn new_sync<F, N>(name: &str, chan_size: usize, main_loop: F) -> Thread<Q, T>
    where
        F: 'static + FnOnce(Rx<Q>) -> N + Send,
        N: 'static + Send + FnOnce() -> T,
        T: 'static + Send,
    {
        let (tx, rx) = mpsc::sync_channel(chan_size);
        let handle = thread::spawn(main_loop(rx));

        let tx = Some(Arc::new(Mutex::new(Tx::S(tx))));

        Thread {
            name: name.to_string(),
            inner: Some(Inner { handle, tx }),
        }
    }

    /// Recommended way to exit/shutdown the thread. Note that all [Tx] clones of this
    /// thread must also be dropped for this call to return.
    ///
    /// Even otherwise, when Thread value goes out of scope its drop implementation
    /// shall call this method to exit the thread, except that any errors are ignored.
    pub fn join(mut self) -> Result<T> {
        self.inner.take().unwrap().join()
    }

    /// Return name of this thread.
    pub fn to_name(&self) -> String {
        self.name.to_string()
    }

    /// Return a clone of tx channel.
    pub fn to_tx(&self) -> Tx<Q> {
        match self.inner.as_ref() {
            Some(inner) => inner.tx.as_ref().unwrap().lock().unwrap().clone(),
            None => unreachable!(),
        }
    }
}

/// IPC type, posting `Q` to a thread's main loop. Fire-and-forget only --
/// `adaptix` never needs a per-job reply channel, since
/// `BackgroundPool::submit_and_wait` layers waiting on top by wrapping the
/// job itself.
pub enum Tx<Q> {
    N(mpsc::Sender<Q>),
    S(mpsc::SyncSender<Q>),
}

impl<Q> Clone for Tx<Q> {
    fn clone(&self) -> Self {
        match self {
            Tx::N(tx) => Tx::N(tx.clone()),
            Tx::S(tx) => Tx::S(tx.clone()),
        }
    }
}

impl<Q> Tx<Q> {
    /// Post a message to thread and don't wait for response.
    pub fn post(&self, msg: Q) -> Result<()> {
        match self {
            Tx::N(tx) => err_at!(IPCFail, tx.send(msg))?,
            Tx::S(tx) => err_at!(IPCFail, tx.send(msg))?,
        };
        Ok(())
    }
}

/// IPC type, that shall be passed to the thread's main loop.
///
/// Refer to [Thread::new] for details.
pub type Rx<Q> = mpsc::Receiver<Q>;

/// A pool of threads running the same `main_loop`. Load balancing across
/// the threads is handled in random fashion.
pub struct Pool<Q, T = ()> {
    name: String,
    threads: Vec<Thread<Q, T>>,
    pool_size: usize,
    chan_size: Option<usize>,
}

impl<Q, T> Pool<Q, T> {
    /// Create a new pool, number of threads in this pool shall default to number of cores.
    pub fn new(name: &str) -> Pool<Q, T> {
        Pool {
            name: name.to_string(),
            threads: Vec::default(),
            pool_size: num_cpus::get(),
            chan_size: None,
        }
    }

    /// Create a new pool, number of threads in this pool shall default to number of cores.
    /// Each threads shall be created with size-bounded input channel.
    pub fn new_sync(name: &str, chan_size: usize) -> Pool<Q, T> {
        Pool {
            name: name.to_string(),
            threads: Vec::default(),
            pool_size: num_cpus::get(),
            chan_size: Some(chan_size),
        }
    }

    pub fn set_pool_size(&mut self, pool_size: usize) -> &mut Self {
        self.pool_size = pool_size;
        self
    }

    /// Spawn all the threads configured for this pool.
    pub fn spawn<F, N>(&mut self, main_loop: F)
    where
        F: 'static + FnOnce(Rx<Q>) -> N + Send + Clone,
        N: 'static + Send + FnOnce() -> T,
        T: 'static + Send,
    {
        for i in 0..self.pool_size {
            let (name, main_loop) = (format!("{}-{}", self.name, i), main_loop.clone());
            let thread = match self.chan_size {
                Some(chan_size) => Thread::new_sync(&name, chan_size, main_loop),
                None => Thread::new(&name, main_loop),
            };
            self.threads.push(thread)
        }
    }

    /// Shutdown all threads, wait for them to exit and cleanup this pool.
    pub fn close_wait(self) -> Result<Vec<T>> {
        let mut results = vec![];
        for th in self.threads.into_iter() {
            results.push(th.join()?)
        }
        Ok(results)
    }
}

impl<Q, T> Pool<Q, T> {
    /// Return the name of the pool.
    pub fn to_name(&self) -> String {
        self.name.to_string()
    }

    /// Post a message to a randomly chosen worker and don't wait for it
    /// to be handled.
    pub fn post(&self, msg: Q) -> Result<()> {
        let n: usize = rand::random::<usize>() % self.threads.len();
        let th: &Thread<Q, T> = &self.threads[n];

        th.to_tx().post(msg)
    }
}
