//! Socket transport carrying broker messages between participants.
//!
//! The listener accepts Unix or TCP connections; [`ConnectionHub`] gives each
//! one a [`ChannelId`], runs a reader thread that decodes JSONL frames into
//! [`BrokerEvent`]s, and implements [`Transport`] so the dispatcher can write
//! back, including blocking round-trips whose replies bypass the event queue.

mod codec;
mod errors;
mod handler;
mod hub;
mod listener;

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::protocol::Message;

pub use self::errors::TransportError;
pub(crate) use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::hub::ConnectionHub;
pub(crate) use self::listener::{ListenerHandle, SocketListener};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Opaque handle naming one participant connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Wraps a raw connection number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Connection lifecycle and traffic delivered to the dispatcher.
#[derive(Debug)]
pub enum BrokerEvent {
    /// A participant connected.
    Connected(ChannelId),
    /// A frame arrived that is not a reply someone is waiting for.
    Message {
        /// Channel the frame arrived on.
        channel: ChannelId,
        /// Decoded frame.
        message: Message,
    },
    /// A participant's connection closed.
    Disconnected(ChannelId),
    /// The daemon is stopping; the dispatcher should exit.
    Shutdown,
}

/// Outbound operations the dispatcher needs from the transport.
pub trait Transport: Send + Sync {
    /// Writes `message` to `channel`.
    ///
    /// # Errors
    ///
    /// Fails when the channel is gone or the write fails.
    fn send(&self, channel: ChannelId, message: Message) -> Result<(), TransportError>;

    /// Writes a call to `channel` and waits up to `timeout` for its reply.
    ///
    /// `Ok(None)` means no reply arrived in time.
    ///
    /// # Errors
    ///
    /// Fails when the call itself cannot be written.
    fn call(
        &self,
        channel: ChannelId,
        message: Message,
        timeout: Duration,
    ) -> Result<Option<Message>, TransportError>;

    /// Sends a copy of `message` to each channel; returns how many succeeded.
    fn broadcast(&self, channels: &[ChannelId], message: &Message) -> usize {
        channels
            .iter()
            .filter(|channel| match self.send(**channel, message.clone()) {
                Ok(()) => true,
                Err(error) => {
                    warn!(
                        target: TRANSPORT_TARGET,
                        channel = %channel,
                        member = %message.member,
                        error = %error,
                        "broadcast delivery failed"
                    );
                    false
                }
            })
            .count()
    }
}
