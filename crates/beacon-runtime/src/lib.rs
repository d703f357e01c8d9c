#![forbid(unsafe_code)]

//! Delivery side of Beacon: dispatch policy, main-thread marshalling, and
//! the [`Subject`] composition.
//!
//! # Architecture
//!
//! Notification flows caller → [`MainThreadHandle`] (optional) →
//! [`Dispatcher`] → registry snapshot → observer invocations. The registry
//! lock is released before any observer code runs, and the designated
//! thread short-circuits submissions to itself, so the two classic deadlock
//! shapes (callout-under-lock, self-marshalling) are prevented by
//! construction rather than recovered at runtime.
//!
//! # Failure Modes
//!
//! - A handler panic is either propagated to the notifier or contained per
//!   handler, chosen via [`DeliveryPolicy`].
//! - Cross-thread marshalling fails with [`MarshalError`] when the
//!   designated thread is gone, or when an opt-in wait bound elapses.

pub mod dispatcher;
pub mod main_thread;
pub mod subject;

pub use dispatcher::{DeliveryPolicy, Dispatcher};
pub use main_thread::{MainThread, MainThreadHandle, MarshalError};
pub use subject::Subject;
