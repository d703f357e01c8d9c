#![forbid(unsafe_code)]

//! Designated-thread marshalling with a blocking, synchronous contract.
//!
//! [`MainThread::start`] spawns one named OS thread that does nothing but
//! run submitted tasks. [`MainThreadHandle::run_sync`] executes a closure on
//! that thread and blocks the caller until it has finished — the guarantee
//! callers rely on is "when this returns, the work has completed on the
//! designated thread".
//!
//! # Deadlock hazards
//!
//! Synchronous cross-thread dispatch is only safe if no code path reachable
//! from the designated thread blocks waiting on the submitting thread. Two
//! structural defenses:
//!
//! - **Same-thread fast path**: a `run_sync` issued from the designated
//!   thread itself (typically a handler re-entering the marshaller) runs the
//!   task inline instead of enqueueing it, so the thread never waits on its
//!   own queue. The check is a side-effect-free `ThreadId` comparison.
//! - **Timeout variant**: [`MainThreadHandle::run_sync_timeout`] bounds the
//!   wait as a safety margin. A timed-out task is abandoned by the caller
//!   but may still run later; when it does, that is logged.
//!
//! # Panic transparency
//!
//! A panic inside a marshalled task is caught on the designated thread,
//! carried back over the completion channel, and resumed on the caller. The
//! designated thread itself survives.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use thiserror::Error;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Why a marshalled task's completion was not observed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarshalError {
    /// The designated thread has shut down or died.
    #[error("designated thread is no longer running")]
    Disconnected,
    /// The wait bound elapsed before the task completed. The task was not
    /// cancelled and may still run.
    #[error("timed out waiting for the designated thread")]
    Timeout,
}

enum MainMsg {
    Run {
        task: Task,
        done: mpsc::SyncSender<thread::Result<()>>,
    },
    Shutdown,
}

/// Owner of the designated thread. Dropping it shuts the thread down and
/// joins it.
pub struct MainThread {
    shared: MainThreadHandle,
    join: Option<JoinHandle<()>>,
}

impl MainThread {
    /// Spawn the designated thread.
    #[must_use]
    pub fn start() -> Self {
        let (tx, rx) = mpsc::channel::<MainMsg>();
        let join = thread::Builder::new()
            .name("beacon-main".into())
            .spawn(move || main_loop(rx))
            .expect("failed to spawn designated thread");
        let shared = MainThreadHandle {
            sender: tx,
            thread_id: join.thread().id(),
        };
        Self {
            shared,
            join: Some(join),
        }
    }

    /// A cheap, cloneable submission handle.
    #[must_use]
    pub fn handle(&self) -> MainThreadHandle {
        self.shared.clone()
    }

    /// Stop accepting tasks, drain what was already queued, and join.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.shared.sender.send(MainMsg::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for MainThread {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

/// Submits tasks to the designated thread. `Clone` and `Send`; every clone
/// refers to the same thread.
#[derive(Clone)]
pub struct MainThreadHandle {
    sender: mpsc::Sender<MainMsg>,
    thread_id: ThreadId,
}

impl MainThreadHandle {
    /// Id of the designated thread.
    #[must_use]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Whether the current thread is the designated thread.
    #[must_use]
    pub fn is_designated_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Run `task` on the designated thread, blocking until it completes.
    ///
    /// Called from the designated thread itself, the task runs inline (see
    /// module docs). A panic inside the task resurfaces on the caller.
    pub fn run_sync(&self, task: impl FnOnce() + Send + 'static) -> Result<(), MarshalError> {
        if self.is_designated_thread() {
            task();
            return Ok(());
        }
        let done_rx = self.submit(Box::new(task))?;
        match done_rx.recv() {
            Ok(outcome) => resolve(outcome),
            Err(_) => Err(MarshalError::Disconnected),
        }
    }

    /// Like [`run_sync`](Self::run_sync), but give up waiting after
    /// `timeout`.
    ///
    /// On timeout the task is *not* cancelled; it may still execute later,
    /// and its completion (or panic) will then go unobserved apart from a
    /// log line.
    pub fn run_sync_timeout(
        &self,
        task: impl FnOnce() + Send + 'static,
        timeout: Duration,
    ) -> Result<(), MarshalError> {
        if self.is_designated_thread() {
            task();
            return Ok(());
        }
        let done_rx = self.submit(Box::new(task))?;
        match done_rx.recv_timeout(timeout) {
            Ok(outcome) => resolve(outcome),
            Err(RecvTimeoutError::Timeout) => Err(MarshalError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(MarshalError::Disconnected),
        }
    }

    fn submit(&self, task: Task) -> Result<mpsc::Receiver<thread::Result<()>>, MarshalError> {
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        self.sender
            .send(MainMsg::Run {
                task,
                done: done_tx,
            })
            .map_err(|_| MarshalError::Disconnected)?;
        Ok(done_rx)
    }
}

impl std::fmt::Debug for MainThreadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainThreadHandle")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

fn resolve(outcome: thread::Result<()>) -> Result<(), MarshalError> {
    match outcome {
        Ok(()) => Ok(()),
        // Re-raise on the caller: the panic belongs to the submitting
        // code path, not to the designated thread.
        Err(cause) => panic::resume_unwind(cause),
    }
}

fn main_loop(rx: mpsc::Receiver<MainMsg>) {
    while let Ok(msg) = rx.recv() {
        match msg {
            MainMsg::Run { task, done } => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(task));
                let panicked = outcome.is_err();
                if done.send(outcome).is_err() {
                    tracing::warn!(panicked, "marshalled task finished after its caller gave up");
                }
            }
            MainMsg::Shutdown => return,
        }
    }
}
