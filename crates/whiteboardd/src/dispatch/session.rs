//! Join, join completion, and leave.
//!
//! A join is tentative until the SIB answers with `join_complete`: the Node
//! is recorded as a member as soon as the request is forwarded, and a failed
//! completion rolls that membership back. A leave takes effect immediately.

use tracing::{debug, info};

use crate::protocol::{Interface, Message, Value, member};
use crate::registry::AccessId;

use super::broker::{Broker, Inbound};
use super::errors::DispatchError;
use super::{DISPATCH_TARGET, SUCCESS_STATUS};

/// `(node, sib, msgnum)`; replies with the access id or the failure status.
pub(super) fn join(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let outcome = begin_join(broker, inbound).map(AccessId::get);
    broker.reply_status(inbound, outcome)
}

fn begin_join(broker: &mut Broker, inbound: &Inbound) -> Result<AccessId, DispatchError> {
    let mut fields = inbound.message.reader();
    let node = fields.string()?;
    let sib = fields.string()?;
    let msgnum = fields.int32()?;
    fields.finish()?;

    if broker.sources.find(sib).is_none() {
        return Err(DispatchError::unknown_source(sib));
    }
    if let Some(current) = broker.sources.sib_for_joined_node(node) {
        return Err(DispatchError::already_joined(node, current));
    }
    if broker.sources.is_node_joined(sib, node) {
        return Err(DispatchError::already_joined(node, sib));
    }
    let sib_channel = broker.resolve(sib)?;

    let access_id = broker.access_ids.next_id();
    broker
        .correlations
        .associate(access_id, inbound.channel, sib_channel);
    let request = Message::signal(Interface::SibAccess, member::JOIN, vec![
        Value::Int32(access_id.get()),
        Value::from(node),
        Value::from(sib),
        Value::Int32(msgnum),
    ]);
    if let Err(error) = broker.send(sib_channel, request) {
        broker.correlations.invalidate(access_id);
        return Err(error);
    }
    broker.sources.join(sib, node);
    broker.correlations.put_join_context(access_id, sib, node);
    debug!(
        target: DISPATCH_TARGET,
        node,
        sib,
        access_id = %access_id,
        "join requested"
    );
    Ok(access_id)
}

/// `(access_id, status)` from the SIB. Relays the completion to the
/// requester, ends the exchange, and rolls back a failed join once.
pub(super) fn join_complete(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let mut fields = inbound.message.reader();
    let access_id = AccessId::new(fields.int32()?);
    let status = fields.int32()?;
    fields.finish()?;

    let requester = broker.correlations.resolve_node_channel(access_id);
    broker.correlations.invalidate(access_id);
    let context = broker.correlations.take_join_context(access_id);

    if status != SUCCESS_STATUS
        && let Some(context) = &context
    {
        broker.sources.leave(&context.sib, &context.node);
        info!(
            target: DISPATCH_TARGET,
            node = %context.node,
            sib = %context.sib,
            status,
            "join refused; membership rolled back"
        );
    }

    let requester = requester.ok_or(DispatchError::UnknownAccessId { access_id })?;
    broker.send(
        requester,
        inbound.message.clone().relabelled(Interface::Node),
    )
}

/// `(node, msgnum)`; replies with the success or failure status.
pub(super) fn leave(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let outcome = release(broker, inbound);
    broker.reply_status(inbound, outcome)
}

fn release(broker: &mut Broker, inbound: &Inbound) -> Result<i32, DispatchError> {
    let mut fields = inbound.message.reader();
    let node = fields.string()?;
    let msgnum = fields.int32()?;
    fields.finish()?;

    let sib = broker
        .sources
        .sib_for_joined_node(node)
        .map(str::to_owned)
        .ok_or_else(|| DispatchError::no_membership(node))?;
    let sib_channel = broker.require_membership(node, &sib)?;
    broker.send(
        sib_channel,
        Message::signal(Interface::SibAccess, member::LEAVE, vec![
            Value::from(node),
            Value::from(sib.as_str()),
            Value::Int32(msgnum),
        ]),
    )?;
    broker.sources.leave(&sib, node);
    debug!(target: DISPATCH_TARGET, node, sib = %sib, "node left");
    Ok(SUCCESS_STATUS)
}
