//! Protocol state machine driving the routing registries.
//!
//! Every inbound message is classified by interface tag, kind, and member
//! through a lookup table ([`router`]) and handed to one handler. Handlers
//! run to completion on the dispatcher thread, including blocking
//! round-trips to SIBs, so two exchanges never interleave their registry
//! mutations.
//!
//! Handler families:
//!
//! - `register`: participant registration, unregistration, disconnect
//!   cleanup.
//! - `session`: join, join completion with rollback, leave.
//! - `mutate`: insert, update, remove forwarded as blocking calls.
//! - `subscription`: subscribe and query plus their asynchronous returns,
//!   indications, and unsubscribe.
//! - `discovery`: SIB listing, insertion and removal announcements.
//! - `relay`: store-and-forward traffic (descriptions, refresh, custom
//!   commands, log fan-out, daemon address).

mod broker;
mod discovery;
mod errors;
mod mutate;
mod register;
mod relay;
mod router;
mod session;
mod subscription;
mod worker;

pub use broker::{Broker, BrokerSettings, FAILURE_RESPONSE, FAILURE_STATUS, SUCCESS_STATUS};
pub use errors::DispatchError;
pub(crate) use worker::DispatchWorker;
pub use worker::WorkerError;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
