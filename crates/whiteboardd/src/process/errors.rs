//! Everything that can stop the daemon from starting or shutting down cleanly.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTimeError;

use nix::errno::Errno;
use strum::Display;
use thiserror::Error;

use ortho_config::OrthoError;

use whiteboard_config::{RuntimePathsError, SocketPreparationError};

use crate::bootstrap::BootstrapError;
use crate::dispatch::WorkerError;
use crate::transport::ListenerError;

use super::daemonizer::DaemonizeError;
use super::shutdown::ShutdownError;

/// Filesystem step on one of the runtime artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ArtefactStep {
    /// Creating the lock file.
    #[strum(serialize = "create lock file")]
    CreateLock,
    /// Replacing the pid file.
    #[strum(serialize = "write pid file")]
    WritePid,
    /// Replacing the health snapshot.
    #[strum(serialize = "write health snapshot")]
    WriteHealth,
    /// Clearing files left by a dead daemon.
    #[strum(serialize = "remove stale file")]
    RemoveStale,
}

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[from]
        source: Arc<OrthoError>,
    },
    /// The socket directory could not be prepared.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Underlying filesystem error.
        #[from]
        source: SocketPreparationError,
    },
    /// The runtime directory could not be resolved or created.
    #[error("failed to resolve runtime directory: {source}")]
    RuntimeDirectory {
        /// Underlying resolution error.
        #[from]
        source: RuntimePathsError,
    },
    /// A lock, pid, or health file operation failed.
    #[error("failed to {step} '{path}': {source}")]
    Artefact {
        /// Operation that failed.
        step: ArtefactStep,
        /// File involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A live daemon already holds the lock.
    #[error("daemon already running with pid {pid}")]
    AlreadyRunning {
        /// PID recorded by the running daemon.
        pid: u32,
    },
    /// Probing the recorded pid failed for a reason other than absence.
    #[error("failed to check existing process {pid}: {source}")]
    CheckProcess {
        /// PID that failed to probe.
        pid: u32,
        /// Underlying OS error.
        source: Errno,
    },
    /// Health was published before the pid.
    #[error("pid must be written before updating health state")]
    MissingPid,
    /// The health snapshot could not be encoded.
    #[error("failed to encode health snapshot: {source}")]
    HealthEncode {
        /// Underlying serialisation error.
        #[from]
        source: serde_json::Error,
    },
    /// The system clock is before the Unix epoch.
    #[error("failed to read system time: {source}")]
    Clock {
        /// Underlying system time error.
        #[from]
        source: SystemTimeError,
    },
    /// Detaching from the terminal failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[from]
        source: DaemonizeError,
    },
    /// Waiting for the termination signal failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[from]
        source: ShutdownError,
    },
    /// Telemetry or configuration bootstrap failed.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[from]
        source: BootstrapError,
    },
    /// The socket listener could not bind or start.
    #[error("daemon socket listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[from]
        source: ListenerError,
    },
    /// The dispatcher thread could not be started or stopped.
    #[error("dispatcher failed: {source}")]
    Dispatcher {
        /// Underlying worker error.
        #[from]
        source: WorkerError,
    },
}

impl LaunchError {
    pub(super) fn artefact(step: ArtefactStep, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Artefact {
            step,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artefact_errors_name_the_step_and_file() {
        let error = LaunchError::artefact(
            ArtefactStep::WritePid,
            "/run/whiteboard/whiteboardd.pid",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        let message = error.to_string();
        assert!(message.starts_with("failed to write pid file '/run/whiteboard/whiteboardd.pid'"));
    }
}
