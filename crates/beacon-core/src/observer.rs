#![forbid(unsafe_code)]

//! The capability contract every observer implements.

use crate::action::{ActionId, Notice};

/// An entity that can be notified of a subject's state changes.
///
/// The registry never owns observers; it holds weak handles to them. An
/// observer advertises which actions it understands via
/// [`can_handle`](Observer::can_handle) and receives matching notifications
/// through [`on_notify`](Observer::on_notify). Observers that fail the
/// capability query for an action are skipped silently — that is not an
/// error.
///
/// Implementations must be `Send + Sync`: notifications may be delivered
/// from any thread, including a designated main thread the observer did not
/// register from.
pub trait Observer: Send + Sync {
    /// Capability query: can this observer handle `action`?
    ///
    /// Must be side-effect-free. The default accepts every action.
    fn can_handle(&self, action: &ActionId) -> bool {
        let _ = action;
        true
    }

    /// Handle `action`. `notice` carries the sender's identity and the
    /// optional payload.
    fn on_notify(&self, action: &ActionId, notice: &Notice);
}
