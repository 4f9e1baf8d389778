//! Detaches the daemon from its controlling terminal.

use std::ffi::OsStr;

use daemonize_me::Daemon;
use thiserror::Error;
use tracing::info;

use whiteboard_config::RuntimePaths;

use super::PROCESS_TARGET;

/// File mode creation mask applied in the detached process.
const DAEMON_UMASK: u16 = 0o077;

/// Abstraction over daemonisation strategies.
pub trait Daemonizer: Send + Sync {
    /// Forks into the background; only the child returns.
    fn daemonize(&self, paths: &RuntimePaths) -> Result<(), DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// System-level daemonisation failed.
    #[error("{0}")]
    System(#[from] daemonize_me::DaemonError),
}

/// Daemoniser backed by `daemonize-me`; the child works from the runtime
/// directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDaemonizer;

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self, paths: &RuntimePaths) -> Result<(), DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            runtime = %paths.runtime_dir().display(),
            "detaching broker into the background"
        );
        Daemon::new()
            .work_dir(paths.runtime_dir())
            .umask(DAEMON_UMASK)
            .name(OsStr::new(env!("CARGO_PKG_NAME")))
            .start()?;
        info!(target: PROCESS_TARGET, pid = std::process::id(), "running detached");
        Ok(())
    }
}
