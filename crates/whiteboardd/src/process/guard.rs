//! Single-instance lock plus the pid and health files advertised beside
//! the socket.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde::Serialize;
use tracing::{info, warn};

use whiteboard_config::RuntimePaths;

use super::PROCESS_TARGET;
use super::errors::{ArtefactStep, LaunchError};
use super::files::atomic_write;

/// Holds the lock file for as long as the daemon runs; dropping it removes
/// every runtime artefact.
#[derive(Debug)]
pub(super) struct ProcessGuard {
    paths: RuntimePaths,
    _lock: File,
    pid: Option<u32>,
}

impl ProcessGuard {
    /// Takes the lock, reclaiming it from a daemon that is no longer alive.
    pub(super) fn acquire(paths: RuntimePaths) -> Result<Self, LaunchError> {
        let lock = match create_lock(paths.lock_path()) {
            Ok(lock) => lock,
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                reclaim_stale(&paths)?;
                create_lock(paths.lock_path()).map_err(|source| lock_error(&paths, source))?
            }
            Err(source) => return Err(lock_error(&paths, source)),
        };
        info!(
            target: PROCESS_TARGET,
            file = %paths.lock_path().display(),
            "acquired daemon lock"
        );
        Ok(Self {
            paths,
            _lock: lock,
            pid: None,
        })
    }

    pub(super) fn paths(&self) -> &RuntimePaths {
        &self.paths
    }

    pub(super) fn write_pid(&mut self, pid: u32) -> Result<(), LaunchError> {
        let path = self.paths.pid_path();
        atomic_write(path, format!("{pid}\n").as_bytes())
            .map_err(|source| LaunchError::artefact(ArtefactStep::WritePid, path, source))?;
        self.pid = Some(pid);
        info!(target: PROCESS_TARGET, pid, file = %path.display(), "pid file written");
        Ok(())
    }

    pub(super) fn write_health(&self, state: HealthState) -> Result<(), LaunchError> {
        let pid = self.pid.ok_or(LaunchError::MissingPid)?;
        let snapshot = HealthSnapshot::now(state, pid)?;
        let mut body = serde_json::to_vec(&snapshot)?;
        body.push(b'\n');
        let path = self.paths.health_path();
        atomic_write(path, &body)
            .map_err(|source| LaunchError::artefact(ArtefactStep::WriteHealth, path, source))?;
        info!(
            target: PROCESS_TARGET,
            status = state.as_str(),
            file = %path.display(),
            "health snapshot updated"
        );
        Ok(())
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        for path in [
            self.paths.health_path(),
            self.paths.pid_path(),
            self.paths.lock_path(),
        ] {
            if let Err(error) = remove_if_present(path) {
                warn!(
                    target: PROCESS_TARGET,
                    file = %path.display(),
                    error = %error,
                    "failed to remove runtime file"
                );
            }
        }
    }
}

/// Lifecycle stage recorded in the health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HealthState {
    Starting,
    Ready,
    Stopping,
}

impl HealthState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopping => "stopping",
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthSnapshot {
    status: &'static str,
    pid: u32,
    timestamp: u64,
}

impl HealthSnapshot {
    fn now(state: HealthState, pid: u32) -> Result<Self, LaunchError> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Ok(Self {
            status: state.as_str(),
            pid,
            timestamp,
        })
    }
}

fn create_lock(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn lock_error(paths: &RuntimePaths, source: io::Error) -> LaunchError {
    LaunchError::artefact(ArtefactStep::CreateLock, paths.lock_path(), source)
}

/// Clears a lock left behind by a daemon that exited without cleaning up.
/// A lock without a readable pid is treated as abandoned.
fn reclaim_stale(paths: &RuntimePaths) -> Result<(), LaunchError> {
    if let Some(pid) = recorded_pid(paths.pid_path()) {
        if process_alive(pid)? {
            info!(target: PROCESS_TARGET, pid, "refusing to start: existing daemon alive");
            return Err(LaunchError::AlreadyRunning { pid });
        }
        warn!(target: PROCESS_TARGET, pid, "previous daemon gone; removing stale files");
    }
    for path in [paths.lock_path(), paths.pid_path(), paths.health_path()] {
        remove_if_present(path)
            .map_err(|source| LaunchError::artefact(ArtefactStep::RemoveStale, path, source))?;
    }
    Ok(())
}

fn recorded_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path)
        .ok()?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|pid| *pid != 0)
}

fn process_alive(pid: u32) -> Result<bool, LaunchError> {
    let Ok(raw) = i32::try_from(pid) else {
        return Ok(false);
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(LaunchError::CheckProcess { pid, source }),
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}
