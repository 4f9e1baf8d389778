//! Lifecycle milestones of the daemon, surfaced to a pluggable reporter.

use std::sync::Arc;

use whiteboard_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// A stage the daemon passed through, in launch order.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    /// Configuration loading is about to begin.
    BootstrapStarting,
    /// Configuration and telemetry are in place.
    BootstrapSucceeded(&'a Config),
    /// Bootstrap stopped at the given error.
    BootstrapFailed(&'a BootstrapError),
    /// The listener accepts participants and the dispatcher runs.
    BrokerReady(&'a SocketEndpoint),
    /// The dispatcher drained after handling this many events.
    BrokerStopped {
        /// Events consumed from the queue over the daemon's life.
        handled_events: usize,
    },
}

/// Receives lifecycle events as they happen.
pub trait HealthReporter: Send + Sync {
    /// Records one lifecycle event.
    fn report(&self, event: LifecycleEvent<'_>);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn report(&self, event: LifecycleEvent<'_>) {
        (**self).report(event);
    }
}

/// Default reporter that writes each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn report(&self, event: LifecycleEvent<'_>) {
        match event {
            LifecycleEvent::BootstrapStarting => tracing::info!(
                target: HEALTH_TARGET,
                event = "bootstrap_starting",
                "starting daemon bootstrap"
            ),
            LifecycleEvent::BootstrapSucceeded(config) => tracing::info!(
                target: HEALTH_TARGET,
                event = "bootstrap_succeeded",
                socket = %config.daemon_socket(),
                log_filter = %config.log_filter(),
                log_format = ?config.log_format(),
                reply_timeout_ms = config.reply_timeout_ms,
                "daemon bootstrap completed"
            ),
            LifecycleEvent::BootstrapFailed(error) => tracing::error!(
                target: HEALTH_TARGET,
                event = "bootstrap_failed",
                error = %error,
                "daemon bootstrap failed"
            ),
            LifecycleEvent::BrokerReady(endpoint) => tracing::info!(
                target: HEALTH_TARGET,
                event = "broker_ready",
                socket = %endpoint,
                "broker accepting participants"
            ),
            LifecycleEvent::BrokerStopped { handled_events } => tracing::info!(
                target: HEALTH_TARGET,
                event = "broker_stopped",
                handled_events,
                "broker stopped"
            ),
        }
    }
}
