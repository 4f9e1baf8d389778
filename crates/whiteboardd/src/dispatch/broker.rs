//! Dispatcher context: the registries plus the collaborators handlers use.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use whiteboard_config::Config;

use crate::observer::BrokerObserver;
use crate::protocol::{Interface, Message, MessageKind, Value, member};
use crate::registry::{
    AccessIdGenerator, ChannelCategory, ChannelRegistry, CorrelationRegistry, SourceDirectory,
};
use crate::transport::{BrokerEvent, ChannelId, Transport};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::router::RouteTable;

/// Status returned for successful register, leave, and unsubscribe calls.
pub const SUCCESS_STATUS: i32 = 0;
/// Status, or access id, returned when a request cannot be served.
pub const FAILURE_STATUS: i32 = -1;
/// Response text paired with [`FAILURE_STATUS`] in mutation replies.
pub const FAILURE_RESPONSE: &str = "Fail";

/// Tunables the dispatcher reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    /// Bound on waiting for a SIB to answer a forwarded mutation.
    pub reply_timeout: Duration,
    /// Address returned to participants asking where the daemon listens.
    pub address: String,
}

impl BrokerSettings {
    /// Derives settings from the daemon configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            reply_timeout: config.reply_timeout(),
            address: config.daemon_socket().to_string(),
        }
    }
}

/// A message together with the channel it arrived on.
#[derive(Debug)]
pub(super) struct Inbound {
    pub(super) channel: ChannelId,
    pub(super) message: Message,
}

/// Routing core: owns all registries and applies one message at a time.
pub struct Broker {
    pub(super) channels: ChannelRegistry,
    pub(super) correlations: CorrelationRegistry,
    pub(super) sources: SourceDirectory,
    pub(super) access_ids: AccessIdGenerator,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn BrokerObserver>,
    settings: BrokerSettings,
    routes: RouteTable,
}

impl Broker {
    /// Builds a broker with empty registries.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        observer: Arc<dyn BrokerObserver>,
        settings: BrokerSettings,
    ) -> Self {
        Self {
            channels: ChannelRegistry::new(),
            correlations: CorrelationRegistry::new(),
            sources: SourceDirectory::new(),
            access_ids: AccessIdGenerator::new(),
            transport,
            observer,
            settings,
            routes: RouteTable::standard(),
        }
    }

    /// Channel registry, for inspection.
    #[must_use]
    pub const fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Correlation registry, for inspection.
    #[must_use]
    pub const fn correlations(&self) -> &CorrelationRegistry {
        &self.correlations
    }

    /// Source directory, for inspection.
    #[must_use]
    pub const fn sources(&self) -> &SourceDirectory {
        &self.sources
    }

    /// Applies one transport event. Returns `false` once shutdown is requested.
    pub fn handle_event(&mut self, event: BrokerEvent) -> bool {
        match event {
            BrokerEvent::Connected(channel) => self.on_new_channel(channel),
            BrokerEvent::Message { channel, message } => {
                self.handle_inbound_message(channel, message);
            }
            BrokerEvent::Disconnected(channel) => self.on_disconnected(channel),
            BrokerEvent::Shutdown => return false,
        }
        true
    }

    /// Notes a newly connected channel. Nothing is registered until the
    /// participant sends a register call.
    pub fn on_new_channel(&mut self, channel: ChannelId) {
        debug!(target: DISPATCH_TARGET, channel = %channel, "channel opened");
    }

    /// Classifies and handles one message.
    pub fn handle_inbound_message(&mut self, channel: ChannelId, mut message: Message) {
        if let Some(alias) = self.channels.alias(channel) {
            message.sender = Some(alias.to_owned());
        }
        let inbound = Inbound { channel, message };
        let handler = inbound.message.known_interface().and_then(|interface| {
            self.routes
                .lookup(interface, inbound.message.kind, &inbound.message.member)
        });
        let Some(handler) = handler else {
            self.unrouted(&inbound);
            return;
        };
        if let Err(error) = handler(self, &inbound) {
            self.log_failure(&inbound, &error);
        }
    }

    /// Drops every identity owned by a closed channel, running the
    /// disconnect cleanup for each.
    pub fn on_disconnected(&mut self, channel: ChannelId) {
        while let Some(identity) = self.channels.find_identity_by_channel(channel) {
            self.node_disconnected(&identity);
            self.channels.unregister(&identity);
        }
        self.channels.forget_channel(channel);
        debug!(target: DISPATCH_TARGET, channel = %channel, "channel closed");
    }

    /// Clears the join state of a departed participant and notifies the
    /// observer.
    pub(super) fn node_disconnected(&mut self, identity: &str) {
        self.observer.node_disconnected(identity);
        if let Some(sib) = self.sources.sib_for_joined_node(identity).map(str::to_owned) {
            self.sources.leave(&sib, identity);
            info!(
                target: DISPATCH_TARGET,
                node = identity,
                sib = %sib,
                "released membership of departed node"
            );
        }
        self.sources.forget_node(identity);
    }

    /// Registers `identity` for `channel` under a per-connection alias.
    pub(super) fn admit(&mut self, channel: ChannelId, identity: &str, category: ChannelCategory) {
        let alias = match self.channels.alias(channel) {
            Some(alias) => alias.to_owned(),
            None => {
                let alias = format!(":{}", self.access_ids.next_id());
                self.channels.assign_alias(channel, alias.clone());
                alias
            }
        };
        self.channels.register(alias.clone(), channel);
        self.channels.register(identity, channel);
        self.channels.add_to_category(category, channel);
        info!(
            target: DISPATCH_TARGET,
            identity,
            alias = %alias,
            category = ?category,
            channel = %channel,
            "participant registered"
        );
    }

    /// Adds a SIB to the directory and announces it to Discovery channels.
    pub(super) fn add_source(&mut self, id: &str, name: &str) -> bool {
        if !self.sources.add_source(id, name) {
            warn!(
                target: DISPATCH_TARGET,
                sib = id,
                "SIB already registered; keeping existing entry"
            );
            return false;
        }
        let announcement = Message::signal(Interface::Discovery, member::SIB_INSERTED, vec![
            Value::from(id),
            Value::from(name),
        ]);
        self.broadcast(ChannelCategory::Discovery, &announcement);
        true
    }

    /// Tells the observer a SIB finished registering.
    pub(super) fn sib_registered(&self, id: &str, name: &str) {
        self.observer.sib_registered(id, name);
    }

    /// Channel registered under `identity`.
    pub(super) fn resolve(&self, identity: &str) -> Result<ChannelId, DispatchError> {
        self.channels
            .lookup(identity)
            .ok_or_else(|| DispatchError::unresolved(identity))
    }

    /// Channel of `sib` after confirming `node` may address it.
    pub(super) fn require_membership(
        &self,
        node: &str,
        sib: &str,
    ) -> Result<ChannelId, DispatchError> {
        if self.sources.find(sib).is_none() {
            return Err(DispatchError::unknown_source(sib));
        }
        if !self.sources.is_node_joined(sib, node) {
            return Err(DispatchError::not_joined(node, sib));
        }
        self.resolve(sib)
    }

    pub(super) fn send(&self, channel: ChannelId, message: Message) -> Result<(), DispatchError> {
        self.transport.send(channel, message)?;
        Ok(())
    }

    pub(super) fn call(
        &self,
        channel: ChannelId,
        message: Message,
    ) -> Result<Option<Message>, DispatchError> {
        Ok(self
            .transport
            .call(channel, message, self.settings.reply_timeout)?)
    }

    pub(super) fn broadcast(&self, category: ChannelCategory, message: &Message) -> usize {
        let channels = self.channels.list_by_category(category);
        self.transport.broadcast(&channels, message)
    }

    pub(super) fn reply(&self, inbound: &Inbound, fields: Vec<Value>) -> Result<(), DispatchError> {
        self.send(inbound.channel, Message::method_return(&inbound.message, fields))
    }

    /// Replies with the outcome's value, or [`FAILURE_STATUS`] after logging.
    pub(super) fn reply_status(
        &self,
        inbound: &Inbound,
        outcome: Result<i32, DispatchError>,
    ) -> Result<(), DispatchError> {
        let status = self.settle(inbound, outcome).unwrap_or(FAILURE_STATUS);
        self.reply(inbound, vec![Value::Int32(status)])
    }

    /// Replies to a relayed call with an error describing why it failed.
    pub(super) fn reply_error(
        &self,
        inbound: &Inbound,
        error: &DispatchError,
    ) -> Result<(), DispatchError> {
        self.send(
            inbound.channel,
            Message::error_reply(&inbound.message, member::REQUEST_FAILED, error.to_string()),
        )
    }

    pub(super) fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Logs a failed outcome, passing successes through.
    pub(super) fn settle<T>(
        &self,
        inbound: &Inbound,
        outcome: Result<T, DispatchError>,
    ) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                self.log_failure(inbound, &error);
                None
            }
        }
    }

    pub(super) fn log_failure(&self, inbound: &Inbound, error: &DispatchError) {
        warn!(
            target: DISPATCH_TARGET,
            channel = %inbound.channel,
            interface = %inbound.message.interface,
            member = %inbound.message.member,
            kind = error.kind(),
            error = %error,
            "request failed"
        );
    }

    fn unrouted(&self, inbound: &Inbound) {
        warn!(
            target: DISPATCH_TARGET,
            channel = %inbound.channel,
            interface = %inbound.message.interface,
            member = %inbound.message.member,
            message_kind = ?inbound.message.kind,
            "no route for message"
        );
        if inbound.message.kind == MessageKind::Call
            && let Err(error) = self.send(inbound.channel, Message::unknown_method(&inbound.message))
        {
            self.log_failure(inbound, &error);
        }
    }
}
