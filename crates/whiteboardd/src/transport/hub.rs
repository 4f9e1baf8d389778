//! Connection table and reply routing behind the [`Transport`] trait.

use std::collections::HashMap;
use std::io::{BufReader, Write};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::protocol::{Message, MessageKind};

use super::codec::{Frame, encode_frame, read_frame};
use super::{
    BrokerEvent, ChannelId, ConnectionHandler, ConnectionStream, TRANSPORT_TARGET, Transport,
    TransportError,
};

type PendingKey = (ChannelId, u32);

/// Owns every open connection and routes replies to blocked callers.
pub(crate) struct ConnectionHub {
    events: Sender<BrokerEvent>,
    writers: Mutex<HashMap<ChannelId, Arc<Mutex<ConnectionStream>>>>,
    pending: Mutex<HashMap<PendingKey, SyncSender<Message>>>,
    next_channel: AtomicU64,
    next_serial: AtomicU32,
}

impl ConnectionHub {
    pub(crate) fn new(events: Sender<BrokerEvent>) -> Self {
        Self {
            events,
            writers: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            next_channel: AtomicU64::new(1),
            next_serial: AtomicU32::new(1),
        }
    }

    /// Shuts down every connection so reader threads observe end-of-stream.
    pub(crate) fn close_all(&self) {
        let writers: Vec<_> = lock(&self.writers).values().cloned().collect();
        for writer in writers {
            if let Err(error) = lock(&writer).shutdown() {
                debug!(
                    target: TRANSPORT_TARGET,
                    error = %error,
                    "connection already closed"
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_replies(&self) -> usize {
        lock(&self.pending).len()
    }

    fn attach(&self, writer: ConnectionStream) -> ChannelId {
        let channel = ChannelId::new(self.next_channel.fetch_add(1, Ordering::SeqCst));
        lock(&self.writers).insert(channel, Arc::new(Mutex::new(writer)));
        self.publish(BrokerEvent::Connected(channel));
        channel
    }

    fn detach(&self, channel: ChannelId) {
        lock(&self.writers).remove(&channel);
        lock(&self.pending).retain(|(owner, _), _| *owner != channel);
        self.publish(BrokerEvent::Disconnected(channel));
    }

    fn serve(&self, channel: ChannelId, stream: ConnectionStream) {
        let mut reader = BufReader::new(stream);
        loop {
            match read_frame(&mut reader) {
                Ok(Frame::Message(message)) => self.route_inbound(channel, message),
                Ok(Frame::Malformed(error)) => {
                    warn!(
                        target: TRANSPORT_TARGET,
                        channel = %channel,
                        error = %error,
                        "discarding malformed frame"
                    );
                }
                Ok(Frame::Closed) => break,
                Err(error) => {
                    warn!(
                        target: TRANSPORT_TARGET,
                        channel = %channel,
                        error = %error,
                        "closing connection after read failure"
                    );
                    break;
                }
            }
        }
    }

    fn route_inbound(&self, channel: ChannelId, message: Message) {
        if matches!(message.kind, MessageKind::Return | MessageKind::Error)
            && let Some(serial) = message.reply_serial
            && let Some(waiter) = lock(&self.pending).remove(&(channel, serial))
        {
            // A waiter that has already timed out drops its receiver.
            if waiter.try_send(message).is_err() {
                debug!(
                    target: TRANSPORT_TARGET,
                    channel = %channel,
                    serial,
                    "reply arrived after its caller gave up"
                );
            }
            return;
        }
        self.publish(BrokerEvent::Message { channel, message });
    }

    fn publish(&self, event: BrokerEvent) {
        if self.events.send(event).is_err() {
            debug!(
                target: TRANSPORT_TARGET,
                "dispatcher stopped; dropping transport event"
            );
        }
    }

    fn stamp(&self, message: &mut Message) -> u32 {
        if message.serial == 0 {
            message.serial = self.next_serial.fetch_add(1, Ordering::SeqCst).max(1);
        }
        message.serial
    }

    fn write(&self, channel: ChannelId, message: &Message) -> Result<(), TransportError> {
        let writer = lock(&self.writers)
            .get(&channel)
            .cloned()
            .ok_or(TransportError::UnknownChannel { channel })?;
        let frame = encode_frame(message)?;
        let mut stream = writer
            .lock()
            .map_err(|_| TransportError::Poisoned { channel })?;
        stream
            .write_all(&frame)
            .and_then(|()| stream.flush())
            .map_err(|source| TransportError::Write { channel, source })
    }
}

impl Transport for ConnectionHub {
    fn send(&self, channel: ChannelId, mut message: Message) -> Result<(), TransportError> {
        self.stamp(&mut message);
        self.write(channel, &message)
    }

    fn call(
        &self,
        channel: ChannelId,
        mut message: Message,
        timeout: Duration,
    ) -> Result<Option<Message>, TransportError> {
        let serial = self.stamp(&mut message);
        let (sender, receiver) = mpsc::sync_channel(1);
        lock(&self.pending).insert((channel, serial), sender);

        if let Err(error) = self.write(channel, &message) {
            lock(&self.pending).remove(&(channel, serial));
            return Err(error);
        }

        let reply = receiver.recv_timeout(timeout).ok();
        if reply.is_none() {
            lock(&self.pending).remove(&(channel, serial));
            warn!(
                target: TRANSPORT_TARGET,
                channel = %channel,
                member = %message.member,
                timeout_ms = timeout.as_millis(),
                "no reply before timeout"
            );
        }
        Ok(reply)
    }
}

impl ConnectionHandler for ConnectionHub {
    fn handle(&self, stream: ConnectionStream) {
        let writer = match stream.try_clone() {
            Ok(writer) => writer,
            Err(error) => {
                warn!(
                    target: TRANSPORT_TARGET,
                    error = %error,
                    "failed to split connection; dropping it"
                );
                return;
            }
        };
        let channel = self.attach(writer);
        info!(target: TRANSPORT_TARGET, channel = %channel, "participant connected");
        self.serve(channel, stream);
        self.detach(channel);
        info!(target: TRANSPORT_TARGET, channel = %channel, "participant disconnected");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
