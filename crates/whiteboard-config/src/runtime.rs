//! Derives the daemon's runtime artefact paths.
//!
//! The runtime directory sits beside the broker socket and houses the lock,
//! pid, and health snapshot files written while the daemon runs.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Config, SocketEndpoint};

#[cfg(unix)]
use dirs::runtime_dir;

const LOCK_FILE: &str = "whiteboardd.lock";
const PID_FILE: &str = "whiteboardd.pid";
const HEALTH_FILE: &str = "whiteboardd.health";

/// Canonical paths for runtime artefacts written by the daemon.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    runtime_dir: PathBuf,
    lock_path: PathBuf,
    pid_path: PathBuf,
    health_path: PathBuf,
}

impl RuntimePaths {
    /// Derives runtime paths from the configuration, creating the directory.
    ///
    /// # Errors
    ///
    /// Fails when the socket path has no parent or the directory cannot be
    /// created.
    pub fn from_config(config: &Config) -> Result<Self, RuntimePathsError> {
        let runtime_dir = runtime_directory(config)?;
        fs::create_dir_all(&runtime_dir).map_err(|source| RuntimePathsError::RuntimeDirectory {
            path: runtime_dir.clone(),
            source,
        })?;
        Ok(Self {
            lock_path: runtime_dir.join(LOCK_FILE),
            pid_path: runtime_dir.join(PID_FILE),
            health_path: runtime_dir.join(HEALTH_FILE),
            runtime_dir,
        })
    }

    /// Directory holding runtime artefacts.
    #[must_use]
    pub fn runtime_dir(&self) -> &Path {
        self.runtime_dir.as_path()
    }

    /// Path to the lock file guarding singleton startup.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        self.lock_path.as_path()
    }

    /// Path to the PID file.
    #[must_use]
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Path to the health snapshot.
    #[must_use]
    pub fn health_path(&self) -> &Path {
        self.health_path.as_path()
    }
}

fn runtime_directory(config: &Config) -> Result<PathBuf, RuntimePathsError> {
    match config.daemon_socket() {
        SocketEndpoint::Unix { path } => path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map(|parent| parent.as_std_path().to_path_buf())
            .ok_or_else(|| RuntimePathsError::MissingSocketParent {
                path: path.to_string(),
            }),
        SocketEndpoint::Tcp { .. } => Ok(default_runtime_directory()),
    }
}

fn default_runtime_directory() -> PathBuf {
    #[cfg(unix)]
    {
        if let Some(mut dir) = runtime_dir() {
            dir.push("whiteboard");
            return dir;
        }
        let mut dir = env::temp_dir();
        dir.push("whiteboard");
        dir.push(crate::defaults::user_namespace());
        dir
    }

    #[cfg(not(unix))]
    {
        let mut dir = env::temp_dir();
        dir.push("whiteboard");
        dir
    }
}

/// Errors raised while deriving daemon runtime paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// The socket path lacked a parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingSocketParent {
        /// Configured socket path.
        path: String,
    },
    /// Creating the runtime directory failed.
    #[error("failed to prepare runtime directory '{path}': {source}")]
    RuntimeDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn places_artefacts_beside_unix_socket() {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = Utf8PathBuf::from_path_buf(dir.path().join("whiteboardd.sock"))
            .expect("utf8 temp path");
        let config = Config {
            daemon_socket: SocketEndpoint::unix(socket),
            ..Config::default()
        };
        let paths = RuntimePaths::from_config(&config).expect("paths should derive");
        assert_eq!(paths.runtime_dir(), dir.path());
        assert!(paths.lock_path().ends_with(LOCK_FILE));
        assert!(paths.pid_path().ends_with(PID_FILE));
        assert!(paths.health_path().ends_with(HEALTH_FILE));
    }

    #[test]
    fn derives_paths_for_tcp_socket() {
        let config = Config {
            daemon_socket: SocketEndpoint::tcp("127.0.0.1", 9000),
            ..Config::default()
        };
        let paths = RuntimePaths::from_config(&config).expect("paths should derive for tcp");
        let tail = paths
            .runtime_dir()
            .file_name()
            .and_then(|name| name.to_str())
            .expect("runtime dir should have trailing component");
        assert!(
            tail == "whiteboard" || tail.starts_with("uid-"),
            "unexpected runtime tail: {tail}"
        );
    }

    #[test]
    fn rejects_unix_socket_without_parent() {
        let config = Config {
            daemon_socket: SocketEndpoint::unix("whiteboardd.sock"),
            ..Config::default()
        };
        let error = RuntimePaths::from_config(&config)
            .expect_err("paths should fail for sockets without parents");
        assert!(matches!(
            error,
            RuntimePathsError::MissingSocketParent { .. }
        ));
    }
}
