//! Launch sequence: lock, detach, bootstrap, serve, wait, stop.

use std::env;
use std::sync::Arc;

use tracing::info;

use whiteboard_config::RuntimePaths;

use crate::bootstrap::{ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, LifecycleEvent, StructuredHealthReporter};
use crate::observer::{BrokerObserver, TracingBrokerObserver};
use crate::transport::SocketListener;

use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::LaunchError;
use super::guard::{HealthState, ProcessGuard};
use super::runtime::BrokerRuntime;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{FOREGROUND_ENV_VAR, PROCESS_TARGET};

/// Launch mode for the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fork into the background and detach from the controlling terminal.
    Background,
    /// Remain attached to the terminal; used for debugging and tests.
    Foreground,
}

impl LaunchMode {
    fn detect() -> Self {
        if env::var_os(FOREGROUND_ENV_VAR).is_some() {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// Process-level collaborators needed to control daemon lifecycle.
pub(crate) struct ProcessControl<D, S> {
    pub(crate) mode: LaunchMode,
    pub(crate) daemonizer: D,
    pub(crate) shutdown: S,
}

/// Services the broker is built from.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) observer: Arc<dyn BrokerObserver>,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, D, S> {
    pub(crate) process: ProcessControl<D, S>,
    pub(crate) services: ServiceDeps<L>,
}

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns the first failure of the launch sequence; shutdown after a
/// termination signal is not an error.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        process: ProcessControl {
            mode: LaunchMode::detect(),
            daemonizer: SystemDaemonizer,
            shutdown: SystemShutdownSignal,
        },
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            observer: Arc::new(TracingBrokerObserver::new()),
        },
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, D, S>(plan: LaunchPlan<L, D, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    D: Daemonizer,
    S: ShutdownSignal,
{
    let LaunchPlan { process, services } = plan;
    let ProcessControl {
        mode,
        daemonizer,
        shutdown,
    } = process;
    let ServiceDeps {
        loader,
        reporter,
        observer,
    } = services;

    info!(target: PROCESS_TARGET, ?mode, "starting whiteboard daemon");
    let config = loader.load()?;
    config.daemon_socket().prepare_filesystem()?;
    let mut guard = ProcessGuard::acquire(RuntimePaths::from_config(&config)?)?;
    if mode == LaunchMode::Background {
        daemonizer.daemonize(guard.paths())?;
    }
    guard.write_pid(std::process::id())?;
    guard.write_health(HealthState::Starting)?;

    let listener = SocketListener::bind(config.daemon_socket())?;
    let daemon = bootstrap_with(&StaticConfigLoader::new(config), reporter)?;
    let runtime = BrokerRuntime::start(listener, daemon.broker_settings(), observer)?;
    guard.write_health(HealthState::Ready)?;
    daemon
        .reporter()
        .report(LifecycleEvent::BrokerReady(daemon.config().daemon_socket()));

    let waited = shutdown.wait();
    let stopping = guard.write_health(HealthState::Stopping);
    let handled = runtime.stop()?;
    daemon.reporter().report(LifecycleEvent::BrokerStopped {
        handled_events: handled,
    });
    stopping?;
    let cause = waited?;
    info!(target: PROCESS_TARGET, ?cause, "shutdown sequence completed");
    Ok(())
}
