//! Behaviour and integration suites for the broker daemon.

mod process_behaviour;
pub(crate) mod support;
