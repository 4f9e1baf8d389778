//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use whiteboard_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that places the broker socket in a private temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    socket_dir: Arc<TempDir>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary socket directory");
        Self {
            socket_dir: Arc::new(dir),
        }
    }

    /// Directory holding the socket and the runtime files.
    #[must_use]
    pub fn runtime_dir(&self) -> PathBuf {
        self.socket_dir.path().to_path_buf()
    }

    fn socket_path(&self) -> String {
        self.socket_dir
            .path()
            .join("whiteboardd.sock")
            .to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            daemon_socket: SocketEndpoint::unix(self.socket_path()),
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an unsupported socket scheme on the CLI.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("whiteboardd"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ])
    }
}
