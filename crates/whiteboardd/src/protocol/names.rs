//! Interface tags and member names understood by the broker.

use strum::{Display, EnumString};

/// Address-space tag carried by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum Interface {
    /// Requests from Nodes and notifications addressed to them.
    #[strum(serialize = "org.whiteboard.node")]
    Node,
    /// Traffic exchanged with SIB access processes.
    #[strum(serialize = "org.whiteboard.sib_access")]
    SibAccess,
    /// Discovery queries and SIB announcements.
    #[strum(serialize = "org.whiteboard.discovery")]
    Discovery,
    /// Participant registration.
    #[strum(serialize = "org.whiteboard.register")]
    Register,
    /// Daemon-level control requests.
    #[strum(serialize = "org.whiteboard")]
    General,
    /// Relabel target for messages delivered to control participants.
    #[strum(serialize = "org.whiteboard.control")]
    Control,
    /// Log records fanned out to Nodes.
    #[strum(serialize = "org.whiteboard.log")]
    Log,
}

impl Interface {
    /// Wire tag for this interface.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Node => "org.whiteboard.node",
            Self::SibAccess => "org.whiteboard.sib_access",
            Self::Discovery => "org.whiteboard.discovery",
            Self::Register => "org.whiteboard.register",
            Self::General => "org.whiteboard",
            Self::Control => "org.whiteboard.control",
            Self::Log => "org.whiteboard.log",
        }
    }
}

/// Member names.
pub mod member {
    /// Node registration.
    pub const REGISTER_NODE: &str = "register_node";
    /// Control participant registration.
    pub const REGISTER_CONTROL: &str = "register_control";
    /// SIB registration.
    pub const REGISTER_SIB: &str = "register_sib";
    /// Discovery participant registration.
    pub const REGISTER_DISCOVERY: &str = "register_discovery";
    /// Explicit unregistration signal.
    pub const UNREGISTER_NODE: &str = "unregister_node";

    /// Request to attach a Node to a SIB.
    pub const JOIN: &str = "join";
    /// SIB verdict on a forwarded join.
    pub const JOIN_COMPLETE: &str = "join_complete";
    /// Request to detach a Node from its SIB.
    pub const LEAVE: &str = "leave";
    /// Triple insertion.
    pub const INSERT: &str = "insert";
    /// Combined insertion and removal.
    pub const UPDATE: &str = "update";
    /// Triple removal.
    pub const REMOVE: &str = "remove";
    /// Standing query whose results keep arriving.
    pub const SUBSCRIBE: &str = "subscribe";
    /// One-shot query.
    pub const QUERY: &str = "query";
    /// Request to end a subscription.
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    /// Confirmation that a subscription ended.
    pub const UNSUBSCRIBE_COMPLETE: &str = "unsubscribe_complete";
    /// New results for a live subscription.
    pub const SUBSCRIPTION_IND: &str = "subscription_ind";
    /// Notice that a SIB went away.
    pub const SIB_REMOVED: &str = "sib_removed";
    /// Description request relayed to a named participant.
    pub const GET_DESCRIPTION: &str = "get_description";
    /// Refresh request broadcast to control participants.
    pub const REFRESH_NODE: &str = "refresh_node";

    /// Discovery query for every known SIB.
    pub const GET_SIBS: &str = "get_sibs";
    /// Per-SIB answer to [`GET_SIBS`].
    pub const SIB: &str = "sib";
    /// Terminator after the last [`SIB`] answer.
    pub const ALL_FOR_NOW: &str = "all_for_now";
    /// Announcement that a SIB registered.
    pub const SIB_INSERTED: &str = "sib_inserted";

    /// Daemon address lookup.
    pub const DISCOVERY: &str = "discovery";
    /// Opaque command relayed to a control participant.
    pub const CUSTOM_COMMAND: &str = "custom_command";

    /// Error reply for calls with no route.
    pub const UNKNOWN_METHOD: &str = "unknown_method";
    /// Error reply for relayed calls whose target is unreachable.
    pub const REQUEST_FAILED: &str = "request_failed";
}
