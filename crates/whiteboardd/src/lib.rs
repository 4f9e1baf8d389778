//! WhiteBoard broker daemon.
//!
//! Nodes, SIBs, control, and discovery participants connect to the daemon
//! over a Unix or TCP socket and exchange JSON-lines [`protocol::Message`]s.
//! The daemon keeps three registries (participant channels, in-flight
//! exchanges keyed by access id, and SIB membership) and routes every
//! message through a single dispatcher thread, so each protocol exchange is
//! applied to the registries as a whole.
//!
//! Start-up follows a fixed sequence: configuration is loaded through
//! [`whiteboard_config`], a lock file guards against a second instance, the
//! process optionally detaches, telemetry is installed, and the listener
//! starts feeding the dispatcher. [`HealthReporter`] observes each stage.

mod bootstrap;
mod dispatch;
mod health;
mod observer;
mod process;
pub mod protocol;
pub mod registry;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{
    Broker, BrokerSettings, DispatchError, FAILURE_RESPONSE, FAILURE_STATUS, SUCCESS_STATUS,
    WorkerError,
};
pub use health::{HealthReporter, LifecycleEvent, StructuredHealthReporter};
pub use observer::{BrokerObserver, TracingBrokerObserver};
pub use process::{ArtefactStep, LaunchError, LaunchMode, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use transport::{BrokerEvent, ChannelId, Transport, TransportError};

#[cfg(test)]
mod tests;
