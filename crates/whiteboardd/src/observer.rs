//! Notifications raised for collaborators outside the routing core.

use std::sync::Arc;

const OBSERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::broker");

/// Receives participant lifecycle notifications from the dispatcher.
///
/// Calls are made synchronously on the dispatcher thread, so implementations
/// must return promptly.
pub trait BrokerObserver: Send + Sync {
    /// A SIB finished registering.
    fn sib_registered(&self, id: &str, name: &str);

    /// A participant identity disconnected or unregistered.
    fn node_disconnected(&self, id: &str);
}

impl<T> BrokerObserver for Arc<T>
where
    T: BrokerObserver + ?Sized,
{
    fn sib_registered(&self, id: &str, name: &str) {
        (**self).sib_registered(id, name);
    }

    fn node_disconnected(&self, id: &str) {
        (**self).node_disconnected(id);
    }
}

/// Default observer that records notifications with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingBrokerObserver;

impl TracingBrokerObserver {
    /// Builds a new observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BrokerObserver for TracingBrokerObserver {
    fn sib_registered(&self, id: &str, name: &str) {
        tracing::info!(
            target: OBSERVER_TARGET,
            event = "sib_registered",
            sib = id,
            name,
            "SIB registered"
        );
    }

    fn node_disconnected(&self, id: &str) {
        tracing::info!(
            target: OBSERVER_TARGET,
            event = "node_disconnected",
            participant = id,
            "participant disconnected"
        );
    }
}
