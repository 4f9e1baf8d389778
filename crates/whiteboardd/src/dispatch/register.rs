//! Participant registration and unregistration.

use tracing::{debug, info};

use crate::registry::ChannelCategory;

use super::broker::{Broker, Inbound};
use super::errors::DispatchError;
use super::{DISPATCH_TARGET, SUCCESS_STATUS};

pub(super) fn register_node(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let outcome = admit_participant(broker, inbound, ChannelCategory::Node);
    broker.reply_status(inbound, outcome)
}

pub(super) fn register_control(
    broker: &mut Broker,
    inbound: &Inbound,
) -> Result<(), DispatchError> {
    let outcome = admit_participant(broker, inbound, ChannelCategory::Control);
    broker.reply_status(inbound, outcome)
}

pub(super) fn register_discovery(
    broker: &mut Broker,
    inbound: &Inbound,
) -> Result<(), DispatchError> {
    let outcome = admit_participant(broker, inbound, ChannelCategory::Discovery);
    broker.reply_status(inbound, outcome)
}

pub(super) fn register_sib(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let outcome = admit_sib(broker, inbound);
    broker.reply_status(inbound, outcome)
}

/// `(id)`
fn admit_participant(
    broker: &mut Broker,
    inbound: &Inbound,
    category: ChannelCategory,
) -> Result<i32, DispatchError> {
    let mut fields = inbound.message.reader();
    let id = fields.string()?;
    fields.finish()?;
    broker.admit(inbound.channel, id, category);
    Ok(SUCCESS_STATUS)
}

/// `(id, name, mimetypes, local)`. A duplicate id keeps the existing
/// directory entry and still registers the channel, but is neither
/// announced nor reported to the observer.
fn admit_sib(broker: &mut Broker, inbound: &Inbound) -> Result<i32, DispatchError> {
    let mut fields = inbound.message.reader();
    let id = fields.string()?;
    let name = fields.string()?;
    let mimetypes = fields.string()?;
    let local = fields.boolean()?;
    fields.finish()?;
    broker.admit(inbound.channel, id, ChannelCategory::Sib);
    debug!(target: DISPATCH_TARGET, sib = id, mimetypes, local, "SIB capabilities");
    if broker.add_source(id, name) {
        broker.sib_registered(id, name);
    }
    Ok(SUCCESS_STATUS)
}

/// `(id)`. Releases the participant's join state and drops its identity.
pub(super) fn unregister(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let mut fields = inbound.message.reader();
    let id = fields.string()?;
    fields.finish()?;
    broker.node_disconnected(id);
    if broker.channels.unregister(id) {
        info!(target: DISPATCH_TARGET, identity = id, "participant unregistered");
    } else {
        debug!(target: DISPATCH_TARGET, identity = id, "unregister for unknown identity");
    }
    Ok(())
}
