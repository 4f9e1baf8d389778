//! Store-and-forward traffic that touches no registry state.

use tracing::debug;

use crate::protocol::{Interface, Value};
use crate::registry::ChannelCategory;

use super::DISPATCH_TARGET;
use super::broker::{Broker, Inbound};
use super::errors::DispatchError;

/// `(target, ...)`. Relays the call to the named participant; the answer
/// comes back through [`forward_to_destination`].
pub(super) fn get_description(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    relay_call(broker, inbound, Interface::Node)
}

/// `(target, method, ...)`. Relays an opaque command to a control participant.
pub(super) fn custom_command(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    relay_call(broker, inbound, Interface::Control)
}

fn relay_call(
    broker: &Broker,
    inbound: &Inbound,
    interface: Interface,
) -> Result<(), DispatchError> {
    let target = inbound
        .message
        .reader()
        .string()
        .map_err(DispatchError::from)
        .and_then(|target| broker.resolve(target));
    match target {
        Ok(channel) => broker.send(channel, inbound.message.clone().relabelled(interface)),
        Err(error) => {
            broker.log_failure(inbound, &error);
            broker.reply_error(inbound, &error)
        }
    }
}

/// Returns for relayed calls go to the participant named as destination.
pub(super) fn forward_to_destination(
    broker: &mut Broker,
    inbound: &Inbound,
) -> Result<(), DispatchError> {
    let destination =
        inbound
            .message
            .destination
            .as_deref()
            .ok_or_else(|| DispatchError::MissingDestination {
                member: inbound.message.member.clone(),
            })?;
    let channel = broker.resolve(destination)?;
    broker.send(channel, inbound.message.clone())
}

/// Broadcasts a refresh request to every control participant.
pub(super) fn refresh_node(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let request = inbound.message.clone().relabelled(Interface::Control);
    let delivered = broker.broadcast(ChannelCategory::Control, &request);
    debug!(target: DISPATCH_TARGET, delivered, "refresh relayed");
    Ok(())
}

/// Answers with the address the daemon listens on.
pub(super) fn daemon_address(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let address = broker.settings().address.clone();
    broker.reply(inbound, vec![Value::String(address)])
}

/// Log records reach every Node unchanged.
pub(super) fn log(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    broker.broadcast(ChannelCategory::Node, &inbound.message);
    Ok(())
}
