//! In-memory [`Transport`] that records deliveries and answers calls from a
//! script.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::protocol::{Message, MessageKind, Value, member};
use crate::transport::{ChannelId, Transport, TransportError};

/// A message written to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: ChannelId,
    pub message: Message,
}

/// How the next blocking call is answered.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A return carrying these fields.
    Return(Vec<Value>),
    /// An error reply.
    Error,
    /// No reply before the timeout.
    Silent,
}

/// Records every send and call; unscripted calls time out.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Delivery>>,
    calls: Mutex<Vec<Delivery>>,
    replies: Mutex<VecDeque<ScriptedReply>>,
    closed: Mutex<HashSet<ChannelId>>,
}

impl RecordingTransport {
    /// Queues the answer for the next call.
    pub fn script(&self, reply: ScriptedReply) {
        self.replies.lock().expect("replies mutex").push_back(reply);
    }

    /// Makes every later write to `channel` fail.
    pub fn close(&self, channel: ChannelId) {
        self.closed.lock().expect("closed mutex").insert(channel);
    }

    /// Messages sent with [`Transport::send`], oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<Delivery> {
        self.sent.lock().expect("sent mutex").clone()
    }

    /// Messages sent to `channel`.
    #[must_use]
    pub fn sent_to(&self, channel: ChannelId) -> Vec<Message> {
        self.sent()
            .into_iter()
            .filter(|delivery| delivery.channel == channel)
            .map(|delivery| delivery.message)
            .collect()
    }

    /// Most recent message sent to `channel`.
    #[must_use]
    pub fn last_to(&self, channel: ChannelId) -> Option<Message> {
        self.sent_to(channel).pop()
    }

    /// Blocking calls issued, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Delivery> {
        self.calls.lock().expect("calls mutex").clone()
    }

    /// Forgets every recorded delivery.
    pub fn clear(&self) {
        self.sent.lock().expect("sent mutex").clear();
        self.calls.lock().expect("calls mutex").clear();
    }

    fn ensure_open(&self, channel: ChannelId) -> Result<(), TransportError> {
        if self.closed.lock().expect("closed mutex").contains(&channel) {
            return Err(TransportError::UnknownChannel { channel });
        }
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn send(&self, channel: ChannelId, message: Message) -> Result<(), TransportError> {
        self.ensure_open(channel)?;
        self.sent
            .lock()
            .expect("sent mutex")
            .push(Delivery { channel, message });
        Ok(())
    }

    fn call(
        &self,
        channel: ChannelId,
        message: Message,
        _timeout: Duration,
    ) -> Result<Option<Message>, TransportError> {
        self.ensure_open(channel)?;
        self.calls.lock().expect("calls mutex").push(Delivery {
            channel,
            message: message.clone(),
        });
        let scripted = self
            .replies
            .lock()
            .expect("replies mutex")
            .pop_front()
            .unwrap_or(ScriptedReply::Silent);
        Ok(match scripted {
            ScriptedReply::Return(fields) => Some(Message::method_return(&message, fields)),
            ScriptedReply::Error => Some(Message::error_reply(
                &message,
                member::REQUEST_FAILED,
                "scripted failure",
            )),
            ScriptedReply::Silent => None,
        })
    }
}

/// Whether `message` is a return whose fields equal `fields`.
#[must_use]
pub fn is_return_with(message: &Message, fields: &[Value]) -> bool {
    message.kind == MessageKind::Return && message.fields == fields
}
