//! Lifecycle of the daemon process itself: single-instance locking,
//! daemonisation, runtime artefacts, and orderly shutdown.

pub(crate) mod daemonizer;
mod errors;
mod files;
mod guard;
pub(crate) mod launch;
pub(crate) mod runtime;
pub(crate) mod shutdown;

pub use errors::{ArtefactStep, LaunchError};
pub use launch::{LaunchMode, run_daemon};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const FOREGROUND_ENV_VAR: &str = "WHITEBOARD_FOREGROUND";
