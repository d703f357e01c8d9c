#![forbid(unsafe_code)]

//! Non-owning observer handles with explicit identity.
//!
//! A [`WeakObserverHandle`] is the registry's record of one observer: a
//! `Weak` reference plus an [`ObserverId`] captured at registration time.
//! Equality and hashing are defined strictly over the identity key — two
//! handles are equal iff they reference the same observer allocation. A
//! handle never extends its target's lifetime; liveness is checked via the
//! strong count without upgrading.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::observer::Observer;

/// Identity key of an observer: the address of its `Arc` allocation.
///
/// Stable for the handle's lifetime. The handle's `Weak` keeps the
/// allocation mapped, so two handles can only share a key when they
/// reference the same observer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

impl ObserverId {
    #[must_use]
    pub fn of(observer: &Arc<dyn Observer>) -> Self {
        Self(Arc::as_ptr(observer).cast::<()>() as usize)
    }
}

impl fmt::Debug for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObserverId({:#x})", self.0)
    }
}

/// A non-owning reference to a registered observer.
pub struct WeakObserverHandle {
    target: Weak<dyn Observer>,
    id: ObserverId,
}

impl WeakObserverHandle {
    #[must_use]
    pub fn new(observer: &Arc<dyn Observer>) -> Self {
        Self {
            target: Arc::downgrade(observer),
            id: ObserverId::of(observer),
        }
    }

    /// The identity key captured at creation.
    #[must_use]
    pub fn identity(&self) -> ObserverId {
        self.id
    }

    /// Whether the referenced observer still exists.
    ///
    /// Checked via the strong count, so the call never extends the
    /// observer's lifetime.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Upgrade to a strong reference for the duration of a dispatch.
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<dyn Observer>> {
        self.target.upgrade()
    }
}

impl Clone for WeakObserverHandle {
    fn clone(&self) -> Self {
        Self {
            target: Weak::clone(&self.target),
            id: self.id,
        }
    }
}

impl PartialEq for WeakObserverHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WeakObserverHandle {}

impl Hash for WeakObserverHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for WeakObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObserverHandle")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}
