#![forbid(unsafe_code)]

//! Action names, payloads, and the notice delivered to observers.
//!
//! An [`ActionId`] is an opaque name from an open-ended action set; subjects
//! and observers agree on names out of band. The payload travels as a shared,
//! type-erased value ([`Payload`]) so a single notification can cross thread
//! boundaries without copying, and each receiver downcasts to the concrete
//! type it expects.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Name of an action carried by a notification.
///
/// Cheap to clone; usually built from a string literal:
///
/// ```
/// use beacon_core::ActionId;
/// let a = ActionId::from("model-did-load");
/// assert_eq!(a.as_str(), "model-did-load");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ActionId(Cow<'static, str>);

impl ActionId {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ActionId {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ActionId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionId({:?})", self.0)
    }
}

/// Type-erased notification payload, shared across threads.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a [`Payload`].
#[must_use]
pub fn payload<T: Any + Send + Sync>(value: T) -> Payload {
    Arc::new(value)
}

/// Process-unique identity of a notifying subject.
///
/// Observers receive the sender's id rather than a reference to the sender,
/// which keeps the observer trait object-safe and free of lifetime ties to
/// the subject.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubjectId(u64);

impl SubjectId {
    /// Allocate the next unused id.
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// What an observer receives alongside the action name: the sender's
/// identity and an optional payload.
pub struct Notice {
    sender: SubjectId,
    payload: Option<Payload>,
}

impl Notice {
    #[must_use]
    pub fn new(sender: SubjectId, payload: Option<Payload>) -> Self {
        Self { sender, payload }
    }

    #[must_use]
    pub fn sender(&self) -> SubjectId {
        self.sender
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Downcast the payload to a concrete type.
    ///
    /// Returns `None` when there is no payload or it holds a different type.
    #[must_use]
    pub fn payload_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notice")
            .field("sender", &self.sender)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}
