//! The serial worker: one dedicated thread per connection that executes
//! submitted callbacks in admission order.
//!
//! Each worker carries a process-unique identity token, published in a
//! thread-local on its own thread. A caller that is already running on the
//! worker (a nested call from inside another submitted callback) is detected
//! by a plain token equality check and executes in place; every other caller
//! blocks until the worker has run its callback. There is no cancellation and
//! no deadline: a submitted callback always runs to completion.

use std::cell::Cell;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Monotonic source of worker identity tokens. Zero is reserved for "not a
/// worker thread".
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Identity token of the worker owning the current thread, if any.
    static ACTIVE_TOKEN: Cell<u64> = const { Cell::new(0) };
}

pub(crate) struct SerialWorker {
    token: u64,
    sender: Option<Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl SerialWorker {
    /// Spawn the worker thread and assign it a fresh identity token.
    pub(crate) fn spawn() -> io::Result<Self> {
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel::<Job>();

        let thread = thread::Builder::new()
            .name(format!("serialite-worker-{token}"))
            .spawn(move || {
                ACTIVE_TOKEN.set(token);
                // Jobs run strictly in admission order until the sender side
                // hangs up.
                while let Ok(job) = receiver.recv() {
                    job();
                }
            })?;

        Ok(Self {
            token,
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// True when the calling thread is this worker's own thread.
    pub(crate) fn is_current(&self) -> bool {
        ACTIVE_TOKEN.get() == self.token
    }

    /// Run `job` on the worker and return its result, blocking the caller
    /// until it completes. A caller already on the worker runs `job` in place
    /// so nesting behaves like straight-line code instead of deadlocking on
    /// the queue.
    ///
    /// A panic inside `job` is caught on the worker, carried back, and
    /// resumed on the calling thread; the worker itself survives it. A value
    /// and a panic are mutually exclusive outcomes.
    pub(crate) fn run<T, F>(&self, job: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        if self.is_current() {
            return job();
        }

        let (done_tx, done_rx) = mpsc::channel();
        let wrapped: Box<dyn FnOnce() + Send + '_> = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job));
            let _ = done_tx.send(outcome);
        });
        // SAFETY: the recv() below blocks until the worker has finished with
        // the job (or dropped it while shutting down), so every borrow the
        // job captures outlives its execution on the worker thread.
        let wrapped: Job = unsafe { std::mem::transmute(wrapped) };

        let sender = self
            .sender
            .as_ref()
            .expect("worker queue disconnected before drop");
        if sender.send(wrapped).is_err() {
            panic!("connection worker thread terminated unexpectedly");
        }

        match done_rx.recv() {
            Ok(Ok(value)) => value,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => panic!("connection worker thread terminated unexpectedly"),
        }
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        // Disconnect the queue so the worker loop exits, then wait for the
        // thread to drain.
        drop(self.sender.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
