//! Subscribe and query exchanges.
//!
//! Both hand the requester an access id straight away and forward the
//! request without waiting. Results come back later as SIB returns and are
//! relayed to the requester as signals. A query's id ends with its result;
//! a subscription's id lives until `unsubscribe_complete`.

use tracing::debug;

use crate::protocol::{Interface, Message, MessageKind, Value, member};
use crate::registry::AccessId;
use crate::transport::ChannelId;

use super::broker::{Broker, Inbound};
use super::errors::DispatchError;
use super::{DISPATCH_TARGET, FAILURE_STATUS, SUCCESS_STATUS};

/// `(node, sib, msgnum, type, request)` for both subscribe and query.
pub(super) fn open(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let outcome = open_exchange(broker, inbound).map(AccessId::get);
    broker.reply_status(inbound, outcome)
}

fn open_exchange(broker: &mut Broker, inbound: &Inbound) -> Result<AccessId, DispatchError> {
    let operation = inbound.message.member.as_str();
    let mut fields = inbound.message.reader();
    let node = fields.string()?;
    let sib = fields.string()?;
    let msgnum = fields.int32()?;
    let kind = fields.int32()?;
    let request = fields.string()?;
    fields.finish()?;

    let sib_channel = broker.require_membership(node, sib)?;
    let access_id = broker.access_ids.next_id();
    broker
        .correlations
        .associate(access_id, inbound.channel, sib_channel);
    let forwarded = Message::call(Interface::SibAccess, operation, vec![
        Value::Int32(access_id.get()),
        Value::from(node),
        Value::from(sib),
        Value::Int32(msgnum),
        Value::Int32(kind),
        Value::from(request),
    ]);
    if let Err(error) = broker.send(sib_channel, forwarded) {
        broker.correlations.invalidate(access_id);
        return Err(error);
    }
    debug!(
        target: DISPATCH_TARGET,
        node,
        sib,
        operation,
        access_id = %access_id,
        "exchange opened"
    );
    Ok(access_id)
}

/// `(access_id, status, subscription_id, results)`; the subscription stays live.
pub(super) fn subscribe_return(
    broker: &mut Broker,
    inbound: &Inbound,
) -> Result<(), DispatchError> {
    let mut fields = inbound.message.reader();
    let access_id = AccessId::new(fields.int32()?);
    fields.int32()?;
    fields.string()?;
    fields.string()?;
    fields.finish()?;

    let requester = requester_of(broker, access_id)?;
    broker.send(requester, result_signal(inbound, member::SUBSCRIBE))
}

/// `(access_id, status, results)`; the query ends here.
pub(super) fn query_return(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let mut fields = inbound.message.reader();
    let access_id = AccessId::new(fields.int32()?);
    fields.int32()?;
    fields.string()?;
    fields.finish()?;

    let requester = requester_of(broker, access_id)?;
    broker.correlations.invalidate(access_id);
    broker.send(requester, result_signal(inbound, member::QUERY))
}

/// `(access_id, ...)` pushed by the SIB for a live subscription.
pub(super) fn indication(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let access_id = AccessId::new(inbound.message.reader().int32()?);
    let requester = requester_of(broker, access_id)?;
    broker.send(
        requester,
        inbound.message.clone().relabelled(Interface::Node),
    )
}

/// `(access_id, ...)` from the SIB once a subscription is torn down.
pub(super) fn unsubscribe_complete(
    broker: &mut Broker,
    inbound: &Inbound,
) -> Result<(), DispatchError> {
    let access_id = AccessId::new(inbound.message.reader().int32()?);
    let requester = requester_of(broker, access_id)?;
    broker.correlations.invalidate(access_id);
    broker.send(
        requester,
        inbound.message.clone().relabelled(Interface::Node),
    )
}

/// `(access_id, node, sib, msgnum, subscription_id)`. The SIB channel is
/// looked up by identity, not taken from the exchange. When the request
/// cannot be forwarded the requester gets a locally built
/// `unsubscribe_complete` carrying the failure status. Calls additionally
/// receive a status return, including when the payload is malformed.
pub(super) fn unsubscribe(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let outcome = forward_unsubscribe(broker, inbound);
    if inbound.message.kind == MessageKind::Call {
        return broker.reply_status(inbound, outcome);
    }
    broker.settle(inbound, outcome);
    Ok(())
}

struct Unsubscribe<'a> {
    access_id: i32,
    node: &'a str,
    sib: &'a str,
    msgnum: i32,
    subscription: &'a str,
}

impl<'a> Unsubscribe<'a> {
    fn decode(message: &'a Message) -> Result<Self, DispatchError> {
        let mut fields = message.reader();
        let request = Self {
            access_id: fields.int32()?,
            node: fields.string()?,
            sib: fields.string()?,
            msgnum: fields.int32()?,
            subscription: fields.string()?,
        };
        fields.finish()?;
        Ok(request)
    }

    fn signal(&self, interface: Interface, name: &str, fourth: i32) -> Message {
        Message::signal(interface, name, vec![
            Value::Int32(self.access_id),
            Value::from(self.node),
            Value::from(self.sib),
            Value::Int32(fourth),
            Value::from(self.subscription),
        ])
    }
}

fn forward_unsubscribe(broker: &Broker, inbound: &Inbound) -> Result<i32, DispatchError> {
    let request = Unsubscribe::decode(&inbound.message)?;
    let forwarded = broker
        .require_membership(request.node, request.sib)
        .and_then(|sib_channel| {
            broker.send(
                sib_channel,
                request.signal(Interface::SibAccess, member::UNSUBSCRIBE, request.msgnum),
            )
        });
    if let Err(error) = forwarded {
        let local = request.signal(Interface::Node, member::UNSUBSCRIBE_COMPLETE, FAILURE_STATUS);
        broker.send(inbound.channel, local)?;
        return Err(error);
    }
    Ok(SUCCESS_STATUS)
}

fn requester_of(broker: &Broker, access_id: AccessId) -> Result<ChannelId, DispatchError> {
    broker
        .correlations
        .resolve_node_channel(access_id)
        .ok_or(DispatchError::UnknownAccessId { access_id })
}

fn result_signal(inbound: &Inbound, operation: &str) -> Message {
    Message::signal(Interface::Node, operation, inbound.message.fields.clone())
}
