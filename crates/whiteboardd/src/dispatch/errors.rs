//! Failures of a single protocol exchange.
//!
//! None of these stop the dispatcher. Handlers convert them into the failure
//! reply their member defines and the router logs them.

use thiserror::Error;

use crate::protocol::ProtocolError;
use crate::registry::AccessId;
use crate::transport::TransportError;

/// Errors surfaced while handling one inbound message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload did not match the member's field layout.
    #[error("malformed payload: {0}")]
    Protocol(#[from] ProtocolError),

    /// No SIB with this identity is registered.
    #[error("unknown SIB '{sib}'")]
    UnknownSource { sib: String },

    /// No channel is registered under this identity.
    #[error("no channel registered for '{identity}'")]
    UnresolvedChannel { identity: String },

    /// The Node is not a member of the SIB it addressed.
    #[error("node '{node}' is not joined to '{sib}'")]
    NotJoined { node: String, sib: String },

    /// The Node is not a member of any SIB.
    #[error("node '{node}' is not joined to any SIB")]
    NoMembership { node: String },

    /// The Node already belongs to a SIB.
    #[error("node '{node}' is already joined to '{sib}'")]
    AlreadyJoined { node: String, sib: String },

    /// No exchange is live under this access id.
    #[error("access id {access_id} has no live exchange")]
    UnknownAccessId { access_id: AccessId },

    /// A forwarded call received no reply in time.
    #[error("'{identity}' did not answer {member}")]
    NoReply { identity: String, member: String },

    /// A forwarded call was answered with an error.
    #[error("'{identity}' rejected {member}")]
    Rejected { identity: String, member: String },

    /// A relayed reply carried no destination.
    #[error("reply to {member} names no destination")]
    MissingDestination { member: String },

    /// Writing to a channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DispatchError {
    pub(crate) fn unknown_source(sib: &str) -> Self {
        Self::UnknownSource {
            sib: sib.to_owned(),
        }
    }

    pub(crate) fn unresolved(identity: &str) -> Self {
        Self::UnresolvedChannel {
            identity: identity.to_owned(),
        }
    }

    pub(crate) fn not_joined(node: &str, sib: &str) -> Self {
        Self::NotJoined {
            node: node.to_owned(),
            sib: sib.to_owned(),
        }
    }

    pub(crate) fn no_membership(node: &str) -> Self {
        Self::NoMembership {
            node: node.to_owned(),
        }
    }

    pub(crate) fn already_joined(node: &str, sib: &str) -> Self {
        Self::AlreadyJoined {
            node: node.to_owned(),
            sib: sib.to_owned(),
        }
    }

    pub(crate) fn no_reply(identity: &str, member: &str) -> Self {
        Self::NoReply {
            identity: identity.to_owned(),
            member: member.to_owned(),
        }
    }

    pub(crate) fn rejected(identity: &str, member: &str) -> Self {
        Self::Rejected {
            identity: identity.to_owned(),
            member: member.to_owned(),
        }
    }

    /// Short label for structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "protocol_violation",
            Self::UnknownSource { .. }
            | Self::UnresolvedChannel { .. }
            | Self::NotJoined { .. }
            | Self::NoMembership { .. }
            | Self::UnknownAccessId { .. }
            | Self::MissingDestination { .. } => "referential_miss",
            Self::AlreadyJoined { .. } => "invariant_violation",
            Self::NoReply { .. } | Self::Rejected { .. } | Self::Transport(_) => {
                "transport_failure"
            }
        }
    }
}
