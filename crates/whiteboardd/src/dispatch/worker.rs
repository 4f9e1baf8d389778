//! Dedicated thread that owns the broker and drains the event queue.

use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info};

use crate::transport::BrokerEvent;

use super::DISPATCH_TARGET;
use super::broker::Broker;

/// Failures starting or stopping the dispatcher thread.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The thread could not be spawned.
    #[error("failed to spawn dispatcher thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
    /// The thread panicked.
    #[error("dispatcher thread panicked")]
    Panicked,
}

/// Handle to the running dispatcher.
#[derive(Debug)]
pub(crate) struct DispatchWorker {
    thread: JoinHandle<usize>,
}

impl DispatchWorker {
    /// Moves `broker` onto its own thread and processes `events` until a
    /// shutdown event arrives or every sender is gone.
    pub(crate) fn spawn(
        mut broker: Broker,
        events: Receiver<BrokerEvent>,
    ) -> Result<Self, WorkerError> {
        let thread = thread::Builder::new()
            .name("whiteboard-dispatch".into())
            .spawn(move || {
                let mut handled = 0_usize;
                for event in events {
                    if !broker.handle_event(event) {
                        break;
                    }
                    handled += 1;
                }
                debug!(target: DISPATCH_TARGET, handled, "dispatcher drained");
                handled
            })
            .map_err(|source| WorkerError::Spawn { source })?;
        info!(target: DISPATCH_TARGET, "dispatcher started");
        Ok(Self { thread })
    }

    /// Waits for the dispatcher to finish and reports how many events it
    /// handled.
    pub(crate) fn join(self) -> Result<usize, WorkerError> {
        self.thread.join().map_err(|_| WorkerError::Panicked)
    }
}
