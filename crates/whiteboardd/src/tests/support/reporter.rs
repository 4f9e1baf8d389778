//! Reporter double that keeps an owned copy of every lifecycle event.

use std::sync::Mutex;

use crate::health::{HealthReporter, LifecycleEvent};

/// Owned mirror of [`LifecycleEvent`] for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    BrokerReady(String),
    BrokerStopped,
}

impl From<LifecycleEvent<'_>> for HealthEvent {
    fn from(event: LifecycleEvent<'_>) -> Self {
        match event {
            LifecycleEvent::BootstrapStarting => Self::BootstrapStarting,
            LifecycleEvent::BootstrapSucceeded(_) => Self::BootstrapSucceeded,
            LifecycleEvent::BootstrapFailed(error) => Self::BootstrapFailed(error.to_string()),
            LifecycleEvent::BrokerReady(endpoint) => Self::BrokerReady(endpoint.to_string()),
            LifecycleEvent::BrokerStopped { .. } => Self::BrokerStopped,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events.lock().expect("reporter mutex").clone()
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn report(&self, event: LifecycleEvent<'_>) {
        self.events
            .lock()
            .expect("reporter mutex")
            .push(HealthEvent::from(event));
    }
}
