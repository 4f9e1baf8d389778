//! Shared configuration for the WhiteBoard broker daemon.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `WHITEBOARD_*` environment variables,
//! then command-line flags. The daemon consumes the resolved [`Config`] to
//! choose its socket endpoint, logging behaviour, and the reply budget for
//! nested request forwarding.

mod defaults;
mod logging;
mod runtime;
mod socket;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_REPLY_TIMEOUT_MS, DEFAULT_TCP_PORT, default_log_filter,
    default_log_filter_string, default_log_format, default_reply_timeout_ms,
    default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use runtime::{RuntimePaths, RuntimePathsError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WHITEBOARD")]
pub struct Config {
    /// Endpoint the broker listens on for participant connections.
    #[serde(default = "default_socket_endpoint")]
    pub daemon_socket: SocketEndpoint,
    /// `tracing` filter expression applied to daemon logs.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for daemon logs.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Upper bound, in milliseconds, on waiting for a SIB to answer a
    /// forwarded insert, update, or remove request.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl Config {
    /// Socket endpoint the daemon binds.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Reply budget for forwarded mutation requests.
    #[must_use]
    pub const fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}
