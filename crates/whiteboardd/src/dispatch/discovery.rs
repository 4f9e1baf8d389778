//! SIB listing and removal announcements.

use tracing::{info, warn};

use crate::protocol::{Interface, Message, Value, member};
use crate::registry::ChannelCategory;

use super::DISPATCH_TARGET;
use super::broker::{Broker, Inbound};
use super::errors::DispatchError;

/// Answers with one `sib` signal per known SIB, then `all_for_now`. A
/// request carrying a payload only gets `all_for_now`.
pub(super) fn get_sibs(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    if let Err(error) = inbound.message.reader().finish() {
        broker.log_failure(inbound, &DispatchError::from(error));
        return broker.send(inbound.channel, all_for_now());
    }
    let listing: Vec<Message> = broker
        .sources
        .list_all()
        .iter()
        .map(|source| {
            Message::signal(Interface::Discovery, member::SIB, vec![
                Value::from(source.id()),
                Value::from(source.name()),
            ])
        })
        .collect();
    for message in listing {
        broker.send(inbound.channel, message)?;
    }
    broker.send(inbound.channel, all_for_now())
}

fn all_for_now() -> Message {
    Message::signal(Interface::Discovery, member::ALL_FOR_NOW, Vec::new())
}

/// `(id)`. Unlinks every joined Node, drops the SIB, and relays the notice
/// to Discovery participants.
pub(super) fn sib_removed(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let mut fields = inbound.message.reader();
    let id = fields.string()?;
    fields.finish()?;

    match broker.sources.remove_source(id) {
        Some(removed) => info!(
            target: DISPATCH_TARGET,
            sib = id,
            released = removed.joined_nodes().count(),
            "SIB removed"
        ),
        None => warn!(target: DISPATCH_TARGET, sib = id, "removal notice for unknown SIB"),
    }
    let notice = inbound.message.clone().relabelled(Interface::Discovery);
    broker.broadcast(ChannelCategory::Discovery, &notice);
    Ok(())
}
