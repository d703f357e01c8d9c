#![forbid(unsafe_code)]

//! Snapshot-driven notification dispatch.
//!
//! The dispatcher walks a registry snapshot and attempts exactly one
//! delivery per handle. Stale handles and observers that fail the
//! capability query are skipped silently; neither is an error. What happens
//! when a handler itself fails is an explicit policy choice, see
//! [`DeliveryPolicy`].

use std::panic::{self, AssertUnwindSafe};

use beacon_core::{ActionId, Notice, WeakObserverHandle};

/// What to do when an invoked handler panics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Let the panic unwind through the notify call. Remaining handles in
    /// the snapshot are not attempted. This is the default: a panicking
    /// handler is a bug the notifier should see.
    #[default]
    Propagate,
    /// Run each handler under `catch_unwind`; a panic is logged and
    /// delivery continues with the rest of the snapshot. Suited to
    /// long-lived subjects whose observers are not all trusted equally.
    Isolate,
}

/// Invokes a named action on every live, capable handle in a snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dispatcher {
    policy: DeliveryPolicy,
}

impl Dispatcher {
    #[must_use]
    pub fn new(policy: DeliveryPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Attempt one delivery per handle in `snapshot`.
    ///
    /// The snapshot must have been captured by the caller; the dispatcher
    /// never touches the registry lock, so handlers are free to
    /// register/unregister re-entrantly. No ordering across handles is
    /// guaranteed.
    pub fn dispatch(&self, snapshot: &[WeakObserverHandle], action: &ActionId, notice: &Notice) {
        for handle in snapshot {
            let Some(observer) = handle.upgrade() else {
                tracing::trace!(id = ?handle.identity(), action = %action, "skipping stale handle");
                continue;
            };
            if !observer.can_handle(action) {
                tracing::trace!(id = ?handle.identity(), action = %action, "capability mismatch");
                continue;
            }
            match self.policy {
                DeliveryPolicy::Propagate => observer.on_notify(action, notice),
                DeliveryPolicy::Isolate => {
                    let outcome =
                        panic::catch_unwind(AssertUnwindSafe(|| observer.on_notify(action, notice)));
                    if outcome.is_err() {
                        tracing::warn!(
                            id = ?handle.identity(),
                            action = %action,
                            "observer panicked during delivery; continuing"
                        );
                    }
                }
            }
        }
    }
}
