#![forbid(unsafe_code)]

//! Core vocabulary and registry for Beacon's observer notifications.
//!
//! This crate holds the pieces that have no threading policy of their own:
//!
//! - [`Observer`]: the capability contract (`can_handle` / `on_notify`)
//!   implemented by every notification target.
//! - [`ActionId`], [`Payload`], [`Notice`]: what a notification carries.
//! - [`WeakObserverHandle`] / [`ObserverId`]: a non-owning reference to an
//!   observer plus the identity key its equality and hashing are defined
//!   over.
//! - [`ObserverRegistry`]: the mutex-guarded handle set with
//!   register/unregister/snapshot.
//!
//! Delivery itself (dispatch policy, main-thread marshalling, the `Subject`
//! composition) lives in `beacon-runtime`.
//!
//! # Invariants
//!
//! 1. At most one live handle per observer identity, no matter how many
//!    times or from how many threads the observer is registered.
//! 2. Handles never own their targets; a destroyed observer is skipped and
//!    eventually pruned without an explicit unregister.
//! 3. Snapshots are consumed outside the registry lock, so observer code may
//!    re-enter the registry freely.

pub mod action;
pub mod handle;
pub mod observer;
pub mod registry;

pub use action::{ActionId, Notice, Payload, SubjectId, payload};
pub use handle::{ObserverId, WeakObserverHandle};
pub use observer::Observer;
pub use registry::ObserverRegistry;
