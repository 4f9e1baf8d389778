//! Test doubles shared by the unit and behaviour suites.

mod client;
mod config_loader;
mod reporter;
mod transport;

pub use client::Participant;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use transport::{RecordingTransport, ScriptedReply, is_return_with};
