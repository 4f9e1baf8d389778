//! Lookup table from (interface, kind, member) to handler.

use std::collections::HashMap;

use crate::protocol::{Interface, MessageKind, member};

use super::broker::{Broker, Inbound};
use super::errors::DispatchError;
use super::{discovery, mutate, register, relay, session, subscription};

pub(super) type Handler = fn(&mut Broker, &Inbound) -> Result<(), DispatchError>;

/// Routes keyed by interface and kind, then by member name. Interfaces with
/// a catch-all handler accept every member and kind.
#[derive(Default)]
pub(super) struct RouteTable {
    routes: HashMap<(Interface, MessageKind), HashMap<&'static str, Handler>>,
    catch_all: HashMap<Interface, Handler>,
}

impl RouteTable {
    /// Every route the broker serves.
    pub(super) fn standard() -> Self {
        use Interface::{Discovery, General, Log, Node, Register, SibAccess};
        use MessageKind::{Call, Return, Signal};

        let mut table = Self::default();

        table.add(Register, Call, member::REGISTER_NODE, register::register_node);
        table.add(Register, Call, member::REGISTER_CONTROL, register::register_control);
        table.add(Register, Call, member::REGISTER_DISCOVERY, register::register_discovery);
        table.add(Register, Call, member::REGISTER_SIB, register::register_sib);
        table.add(Register, Signal, member::UNREGISTER_NODE, register::unregister);

        table.add(Node, Call, member::JOIN, session::join);
        table.add(Node, Call, member::LEAVE, session::leave);
        table.add(SibAccess, Signal, member::JOIN_COMPLETE, session::join_complete);

        table.add(Node, Call, member::INSERT, mutate::mutate);
        table.add(Node, Call, member::UPDATE, mutate::mutate);
        table.add(Node, Call, member::REMOVE, mutate::mutate);

        table.add(Node, Call, member::SUBSCRIBE, subscription::open);
        table.add(Node, Call, member::QUERY, subscription::open);
        table.add(Node, Signal, member::UNSUBSCRIBE, subscription::unsubscribe);
        table.add(Node, Call, member::UNSUBSCRIBE, subscription::unsubscribe);
        table.add(SibAccess, Return, member::SUBSCRIBE, subscription::subscribe_return);
        table.add(SibAccess, Return, member::QUERY, subscription::query_return);
        table.add(SibAccess, Signal, member::SUBSCRIPTION_IND, subscription::indication);
        table.add(
            SibAccess,
            Signal,
            member::UNSUBSCRIBE_COMPLETE,
            subscription::unsubscribe_complete,
        );

        table.add(Discovery, Call, member::GET_SIBS, discovery::get_sibs);
        table.add(SibAccess, Signal, member::SIB_REMOVED, discovery::sib_removed);

        table.add(Node, Call, member::GET_DESCRIPTION, relay::get_description);
        table.add(Node, Return, member::GET_DESCRIPTION, relay::forward_to_destination);
        table.add(Node, Call, member::REFRESH_NODE, relay::refresh_node);
        table.add(General, Call, member::DISCOVERY, relay::daemon_address);
        table.add(General, Call, member::CUSTOM_COMMAND, relay::custom_command);
        table.add(General, Return, member::CUSTOM_COMMAND, relay::forward_to_destination);

        table.catch_all.insert(Log, relay::log);
        table
    }

    fn add(
        &mut self,
        interface: Interface,
        kind: MessageKind,
        member: &'static str,
        handler: Handler,
    ) {
        self.routes
            .entry((interface, kind))
            .or_default()
            .insert(member, handler);
    }

    /// Handler for a message, if one is registered.
    pub(super) fn lookup(
        &self,
        interface: Interface,
        kind: MessageKind,
        member: &str,
    ) -> Option<Handler> {
        self.routes
            .get(&(interface, kind))
            .and_then(|members| members.get(member))
            .copied()
            .or_else(|| self.catch_all.get(&interface).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Interface::Register, MessageKind::Call, member::REGISTER_SIB)]
    #[case(Interface::Node, MessageKind::Call, member::JOIN)]
    #[case(Interface::Node, MessageKind::Signal, member::UNSUBSCRIBE)]
    #[case(Interface::Node, MessageKind::Call, member::UNSUBSCRIBE)]
    #[case(Interface::SibAccess, MessageKind::Return, member::QUERY)]
    #[case(Interface::Discovery, MessageKind::Call, member::GET_SIBS)]
    #[case(Interface::General, MessageKind::Return, member::CUSTOM_COMMAND)]
    #[case(Interface::Log, MessageKind::Signal, "anything")]
    fn standard_routes_resolve(
        #[case] interface: Interface,
        #[case] kind: MessageKind,
        #[case] member: &str,
    ) {
        assert!(RouteTable::standard().lookup(interface, kind, member).is_some());
    }

    #[rstest]
    #[case(Interface::Node, MessageKind::Signal, member::JOIN)]
    #[case(Interface::SibAccess, MessageKind::Call, member::INSERT)]
    #[case(Interface::Register, MessageKind::Call, "register_everything")]
    #[case(Interface::Control, MessageKind::Call, member::CUSTOM_COMMAND)]
    fn unmatched_combinations_have_no_route(
        #[case] interface: Interface,
        #[case] kind: MessageKind,
        #[case] member: &str,
    ) {
        assert!(RouteTable::standard().lookup(interface, kind, member).is_none());
    }
}
