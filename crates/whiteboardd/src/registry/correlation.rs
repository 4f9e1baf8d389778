use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::transport::ChannelId;

/// Correlation token for a multi-message exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessId(i32);

impl AccessId {
    /// Wraps a raw wire value.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw wire value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccessId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

/// Process-wide source of access ids and channel aliases.
///
/// Clones share one counter. Ids start at 1 and stay positive after the
/// counter wraps, so `-1` never collides with an issued id.
#[derive(Debug, Clone, Default)]
pub struct AccessIdGenerator {
    last: Arc<AtomicI32>,
}

impl AccessIdGenerator {
    /// Creates a generator whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next id.
    pub fn next_id(&self) -> AccessId {
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(successor(last)))
            .unwrap_or_else(|current| current);
        AccessId(successor(previous))
    }
}

fn successor(last: i32) -> i32 {
    last.checked_add(1).unwrap_or(1).max(1)
}

/// Channels at either end of a live exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    /// Channel of the requesting Node.
    pub node: ChannelId,
    /// Channel of the SIB serving the request.
    pub sib: ChannelId,
}

/// Pairing remembered while a join awaits its completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinContext {
    /// SIB being joined.
    pub sib: String,
    /// Node requesting the join.
    pub node: String,
}

/// Maps access ids to their exchanges and pending joins.
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    exchanges: HashMap<AccessId, Exchange>,
    joins: HashMap<AccessId, JoinContext>,
}

impl CorrelationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the channels participating in `access_id`.
    pub fn associate(&mut self, access_id: AccessId, node: ChannelId, sib: ChannelId) {
        self.exchanges.insert(access_id, Exchange { node, sib });
    }

    /// Requesting channel of a live exchange.
    #[must_use]
    pub fn resolve_node_channel(&self, access_id: AccessId) -> Option<ChannelId> {
        self.exchanges.get(&access_id).map(|exchange| exchange.node)
    }

    /// Serving channel of a live exchange.
    #[must_use]
    pub fn resolve_sib_channel(&self, access_id: AccessId) -> Option<ChannelId> {
        self.exchanges.get(&access_id).map(|exchange| exchange.sib)
    }

    /// Ends an exchange. Unknown ids are ignored; returns whether one ended.
    pub fn invalidate(&mut self, access_id: AccessId) -> bool {
        self.exchanges.remove(&access_id).is_some()
    }

    /// Remembers the pairing behind a pending join.
    pub fn put_join_context(
        &mut self,
        access_id: AccessId,
        sib: impl Into<String>,
        node: impl Into<String>,
    ) {
        self.joins.insert(access_id, JoinContext {
            sib: sib.into(),
            node: node.into(),
        });
    }

    /// Removes and returns the pairing behind a pending join.
    pub fn take_join_context(&mut self, access_id: AccessId) -> Option<JoinContext> {
        self.joins.remove(&access_id)
    }

    /// Number of live exchanges.
    #[must_use]
    pub fn live_exchanges(&self) -> usize {
        self.exchanges.len()
    }
}
