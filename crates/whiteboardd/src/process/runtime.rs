//! The running broker: listener, connection hub, and dispatcher thread.

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};

use tracing::{info, warn};

use crate::dispatch::{Broker, BrokerSettings, DispatchWorker};
use crate::observer::BrokerObserver;
use crate::transport::{BrokerEvent, ConnectionHub, ListenerHandle, SocketListener};

use super::PROCESS_TARGET;
use super::errors::LaunchError;

/// Owns the threads that serve participants until [`BrokerRuntime::stop`].
pub(crate) struct BrokerRuntime {
    hub: Arc<ConnectionHub>,
    events: Sender<BrokerEvent>,
    listener: ListenerHandle,
    worker: DispatchWorker,
}

impl BrokerRuntime {
    /// Starts the dispatcher, then begins accepting on `listener`.
    pub(crate) fn start(
        listener: SocketListener,
        settings: BrokerSettings,
        observer: Arc<dyn BrokerObserver>,
    ) -> Result<Self, LaunchError> {
        let (events, queue) = mpsc::channel();
        let hub = Arc::new(ConnectionHub::new(events.clone()));
        let broker = Broker::new(hub.clone(), observer, settings);
        let worker = DispatchWorker::spawn(broker, queue)?;
        let listener = match listener.start(hub.clone()) {
            Ok(listener) => listener,
            Err(error) => {
                if let Err(stop) = stop_worker(&events, worker) {
                    warn!(target: PROCESS_TARGET, error = %stop, "dispatcher did not stop cleanly");
                }
                return Err(error.into());
            }
        };
        info!(target: PROCESS_TARGET, "broker runtime started");
        Ok(Self {
            hub,
            events,
            listener,
            worker,
        })
    }

    /// Stops accepting, closes every connection, and waits for the
    /// dispatcher. Returns the number of events it handled.
    pub(crate) fn stop(self) -> Result<usize, LaunchError> {
        let Self {
            hub,
            events,
            listener,
            worker,
        } = self;
        listener.shutdown();
        let accept = listener.join();
        hub.close_all();
        let handled = stop_worker(&events, worker);
        accept?;
        let handled = handled?;
        info!(target: PROCESS_TARGET, handled, "broker runtime stopped");
        Ok(handled)
    }
}

fn stop_worker(events: &Sender<BrokerEvent>, worker: DispatchWorker) -> Result<usize, LaunchError> {
    if events.send(BrokerEvent::Shutdown).is_err() {
        warn!(target: PROCESS_TARGET, "dispatcher already gone");
    }
    Ok(worker.join()?)
}
