#![forbid(unsafe_code)]

//! The observable subject: registry + dispatcher behind one handle.
//!
//! A [`Subject`] is what a model owns to let other components watch it.
//! Cloning a `Subject` creates a new handle to the **same** shared state —
//! both handles see the same observer set, the way shared-state handles
//! work elsewhere in this workspace.

use std::fmt;
use std::sync::Arc;

use beacon_core::{ActionId, Notice, Observer, ObserverRegistry, Payload, SubjectId};

use crate::dispatcher::{DeliveryPolicy, Dispatcher};
use crate::main_thread::{MainThreadHandle, MarshalError};

struct SubjectInner {
    id: SubjectId,
    label: String,
    registry: ObserverRegistry,
    dispatcher: Dispatcher,
}

/// A notifying subject. The external API surface of the core:
/// register/unregister for observers, notify/notify_on for the owner.
#[derive(Clone)]
pub struct Subject {
    inner: Arc<SubjectInner>,
}

impl Subject {
    /// New subject with the default delivery policy
    /// ([`DeliveryPolicy::Propagate`]).
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_policy(label, DeliveryPolicy::default())
    }

    #[must_use]
    pub fn with_policy(label: impl Into<String>, policy: DeliveryPolicy) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                id: SubjectId::next(),
                label: label.into(),
                registry: ObserverRegistry::new(),
                dispatcher: Dispatcher::new(policy),
            }),
        }
    }

    /// Identity delivered to observers as `Notice::sender`.
    #[must_use]
    pub fn id(&self) -> SubjectId {
        self.inner.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Start observing. Registering the same observer again is a no-op.
    pub fn register(&self, observer: &Arc<dyn Observer>) {
        self.inner.registry.register(observer);
    }

    /// Stop observing. Unregistering an unknown observer is a no-op.
    pub fn unregister(&self, observer: &Arc<dyn Observer>) {
        self.inner.registry.unregister(observer);
    }

    /// Number of live observers currently registered.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.registry.live_len()
    }

    /// Notify on the calling thread.
    ///
    /// Takes a snapshot of the live observers, releases the registry lock,
    /// then attempts one delivery per snapshotted handle. Observers
    /// registered after this call begins are not notified.
    pub fn notify(&self, action: impl Into<ActionId>, payload: Option<Payload>) {
        self.inner.deliver(&action.into(), payload);
    }

    /// Notify on the designated thread, blocking until delivery completes.
    ///
    /// When the caller *is* the designated thread, delivery happens inline.
    /// After `Ok(())` every triggered invocation has finished executing on
    /// the designated thread.
    pub fn notify_on(
        &self,
        main: &MainThreadHandle,
        action: impl Into<ActionId>,
        payload: Option<Payload>,
    ) -> Result<(), MarshalError> {
        let action = action.into();
        let inner = Arc::clone(&self.inner);
        main.run_sync(move || inner.deliver(&action, payload))
    }
}

impl SubjectInner {
    fn deliver(&self, action: &ActionId, payload: Option<Payload>) {
        let snapshot = self.registry.snapshot();
        tracing::debug!(
            subject = %self.label,
            action = %action,
            observers = snapshot.len(),
            "notifying"
        );
        let notice = Notice::new(self.id, payload);
        self.dispatcher.dispatch(&snapshot, action, &notice);
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("policy", &self.inner.dispatcher.policy())
            .finish()
    }
}
