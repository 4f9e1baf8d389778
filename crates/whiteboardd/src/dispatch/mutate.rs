//! Insert, update, and remove: blocking round-trips to the SIB.

use tracing::debug;

use crate::protocol::{Interface, Message, MessageKind, Value, member};

use super::broker::{Broker, Inbound};
use super::errors::DispatchError;
use super::{DISPATCH_TARGET, FAILURE_RESPONSE, FAILURE_STATUS};

/// `(node, sib, msgnum, encoding, request)` for insert and remove,
/// `(node, sib, msgnum, encoding, insert_request, remove_request)` for
/// update. Replies `(status, response)` as answered by the SIB.
pub(super) fn mutate(broker: &mut Broker, inbound: &Inbound) -> Result<(), DispatchError> {
    let (status, response) = match forward(broker, inbound) {
        Ok(answer) => answer,
        Err(error) => {
            broker.log_failure(inbound, &error);
            (FAILURE_STATUS, FAILURE_RESPONSE.to_owned())
        }
    };
    broker.reply(inbound, vec![Value::Int32(status), Value::String(response)])
}

fn forward(broker: &Broker, inbound: &Inbound) -> Result<(i32, String), DispatchError> {
    let operation = inbound.message.member.as_str();
    let mut fields = inbound.message.reader();
    let node = fields.string()?;
    let sib = fields.string()?;
    fields.int32()?;
    fields.int32()?;
    fields.string()?;
    if operation == member::UPDATE {
        fields.string()?;
    }
    fields.finish()?;

    let sib_channel = broker.require_membership(node, sib)?;
    let request = Message::call(
        Interface::SibAccess,
        operation,
        inbound.message.fields.clone(),
    );
    let reply = broker
        .call(sib_channel, request)?
        .ok_or_else(|| DispatchError::no_reply(sib, operation))?;
    if reply.kind == MessageKind::Error {
        return Err(DispatchError::rejected(sib, operation));
    }

    let mut answer = reply.reader();
    let status = answer.int32()?;
    let response = answer.string()?.to_owned();
    answer.finish()?;
    debug!(target: DISPATCH_TARGET, node, sib, operation, status, "mutation answered");
    Ok((status, response))
}
