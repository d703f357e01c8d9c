#![forbid(unsafe_code)]

//! Thread-safe registry of weak observer handles.
//!
//! # Design
//!
//! The registry owns a mutex-guarded set of [`WeakObserverHandle`]s keyed by
//! observer identity. All mutations (register, unregister, snapshot capture)
//! are mutually exclusive under that single lock. Observer code is **never**
//! invoked while the lock is held: notification consumers take a
//! [`snapshot`](ObserverRegistry::snapshot) and iterate it after the lock is
//! released, so a handler may re-enter `register`/`unregister` without
//! deadlocking.
//!
//! # Invariants
//!
//! 1. At most one live handle per observer identity; repeated registration
//!    is a no-op.
//! 2. Unregistering an absent identity is a no-op.
//! 3. Stale handles (dead targets) are pruned opportunistically during
//!    snapshot capture; pruning is best-effort and not required for
//!    correctness of other operations.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::handle::WeakObserverHandle;
use crate::observer::Observer;

/// A lock-guarded set of weak observer handles.
///
/// One registry per subject; there is no process-wide instance. The registry
/// never owns observers — dropping the last strong reference to an observer
/// elsewhere invalidates its handle without an explicit unregister call.
#[derive(Default)]
pub struct ObserverRegistry {
    set: Mutex<HashSet<WeakObserverHandle>>,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer, deduplicating by identity.
    ///
    /// If a live handle for the same observer already exists this is a
    /// no-op. A stale handle under the same key is replaced.
    pub fn register(&self, observer: &Arc<dyn Observer>) {
        let handle = WeakObserverHandle::new(observer);
        let mut set = self.lock();
        match set.get(&handle) {
            Some(existing) if existing.is_live() => {
                tracing::debug!(id = ?handle.identity(), "observer already registered");
            }
            _ => {
                tracing::debug!(id = ?handle.identity(), "observer registered");
                set.replace(handle);
            }
        }
    }

    /// Remove the handle matching the observer's identity, if present.
    pub fn unregister(&self, observer: &Arc<dyn Observer>) {
        let handle = WeakObserverHandle::new(observer);
        if self.lock().remove(&handle) {
            tracing::debug!(id = ?handle.identity(), "observer unregistered");
        }
    }

    /// Point-in-time copy of the live handles.
    ///
    /// Captured under the lock, consumed without it. Stale handles are
    /// pruned from the set as a side effect. Observers registered after the
    /// snapshot is taken are not included; observers unregistered afterwards
    /// may still appear.
    #[must_use]
    pub fn snapshot(&self) -> Vec<WeakObserverHandle> {
        let mut set = self.lock();
        set.retain(WeakObserverHandle::is_live);
        set.iter().cloned().collect()
    }

    /// Number of live handles currently registered.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.lock().iter().filter(|h| h.is_live()).count()
    }

    // The set holds plain bookkeeping data, so a poisoned lock is still
    // usable; recover the guard instead of spreading the panic.
    fn lock(&self) -> MutexGuard<'_, HashSet<WeakObserverHandle>> {
        self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("handles", &self.lock().len())
            .finish()
    }
}
