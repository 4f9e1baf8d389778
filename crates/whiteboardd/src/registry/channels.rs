use std::collections::HashMap;

use crate::transport::ChannelId;

/// Broadcast lists maintained alongside the identity map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelCategory {
    /// Node participants.
    Node,
    /// Control participants.
    Control,
    /// Discovery participants.
    Discovery,
    /// SIB access processes.
    Sib,
}

/// Maps participant identities to channels.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    identities: HashMap<String, ChannelId>,
    aliases: HashMap<ChannelId, String>,
    nodes: Vec<ChannelId>,
    controls: Vec<ChannelId>,
    discovery: Vec<ChannelId>,
    sibs: Vec<ChannelId>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `identity` to `channel`, replacing any previous mapping.
    pub fn register(&mut self, identity: impl Into<String>, channel: ChannelId) {
        self.identities.insert(identity.into(), channel);
    }

    /// Channel registered under `identity`.
    #[must_use]
    pub fn lookup(&self, identity: &str) -> Option<ChannelId> {
        self.identities.get(identity).copied()
    }

    /// Removes `identity`, pruning its channel from the Node and SIB lists.
    ///
    /// Returns whether the identity was registered.
    pub fn unregister(&mut self, identity: &str) -> bool {
        let Some(channel) = self.identities.remove(identity) else {
            return false;
        };
        self.nodes.retain(|listed| *listed != channel);
        self.sibs.retain(|listed| *listed != channel);
        true
    }

    /// Adds `channel` to a broadcast list.
    pub fn add_to_category(&mut self, category: ChannelCategory, channel: ChannelId) {
        self.list_mut(category).push(channel);
    }

    /// Snapshot of a broadcast list, most recent registration first.
    #[must_use]
    pub fn list_by_category(&self, category: ChannelCategory) -> Vec<ChannelId> {
        let list = match category {
            ChannelCategory::Node => &self.nodes,
            ChannelCategory::Control => &self.controls,
            ChannelCategory::Discovery => &self.discovery,
            ChannelCategory::Sib => &self.sibs,
        };
        list.iter().rev().copied().collect()
    }

    /// Any identity currently mapped to `channel`.
    #[must_use]
    pub fn find_identity_by_channel(&self, channel: ChannelId) -> Option<String> {
        self.identities
            .iter()
            .find(|(_, listed)| **listed == channel)
            .map(|(identity, _)| identity.clone())
    }

    /// Records the short alias stamped on messages from `channel`.
    pub fn assign_alias(&mut self, channel: ChannelId, alias: impl Into<String>) {
        self.aliases.insert(channel, alias.into());
    }

    /// Short alias of `channel`, if it has registered.
    #[must_use]
    pub fn alias(&self, channel: ChannelId) -> Option<&str> {
        self.aliases.get(&channel).map(String::as_str)
    }

    /// Drops every trace of a closed channel from the broadcast lists.
    pub fn forget_channel(&mut self, channel: ChannelId) {
        self.aliases.remove(&channel);
        for category in [
            ChannelCategory::Node,
            ChannelCategory::Control,
            ChannelCategory::Discovery,
            ChannelCategory::Sib,
        ] {
            self.list_mut(category).retain(|listed| *listed != channel);
        }
    }

    fn list_mut(&mut self, category: ChannelCategory) -> &mut Vec<ChannelId> {
        match category {
            ChannelCategory::Node => &mut self.nodes,
            ChannelCategory::Control => &mut self.controls,
            ChannelCategory::Discovery => &mut self.discovery,
            ChannelCategory::Sib => &mut self.sibs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> ChannelRegistry {
        ChannelRegistry::new()
    }

    #[rstest]
    fn register_then_unregister_restores_lookup(mut registry: ChannelRegistry) {
        registry.register("n1", ChannelId::new(1));
        assert_eq!(registry.lookup("n1"), Some(ChannelId::new(1)));

        assert!(registry.unregister("n1"));
        assert_eq!(registry.lookup("n1"), None);
        assert!(!registry.unregister("n1"), "second removal reports absence");
    }

    #[rstest]
    fn register_overwrites_previous_channel(mut registry: ChannelRegistry) {
        registry.register("n1", ChannelId::new(1));
        registry.register("n1", ChannelId::new(2));
        assert_eq!(registry.lookup("n1"), Some(ChannelId::new(2)));
    }

    #[rstest]
    fn unregister_prunes_node_and_sib_lists_only(mut registry: ChannelRegistry) {
        let channel = ChannelId::new(4);
        registry.register("s1", channel);
        for category in [
            ChannelCategory::Node,
            ChannelCategory::Sib,
            ChannelCategory::Control,
        ] {
            registry.add_to_category(category, channel);
        }
        registry.add_to_category(ChannelCategory::Sib, channel);

        registry.unregister("s1");

        assert!(registry.list_by_category(ChannelCategory::Node).is_empty());
        assert!(registry.list_by_category(ChannelCategory::Sib).is_empty());
        assert_eq!(
            registry.list_by_category(ChannelCategory::Control),
            vec![channel]
        );
    }

    #[rstest]
    fn reverse_lookup_finds_every_identity_of_a_channel(mut registry: ChannelRegistry) {
        let channel = ChannelId::new(9);
        registry.register(":1", channel);
        registry.register("n1", channel);
        registry.register("n2", ChannelId::new(10));

        let mut found = Vec::new();
        while let Some(identity) = registry.find_identity_by_channel(channel) {
            registry.unregister(&identity);
            found.push(identity);
        }
        found.sort();

        assert_eq!(found, vec![":1".to_owned(), "n1".to_owned()]);
        assert_eq!(registry.lookup("n2"), Some(ChannelId::new(10)));
    }

    #[rstest]
    fn forget_channel_clears_alias_and_every_list(mut registry: ChannelRegistry) {
        let channel = ChannelId::new(3);
        registry.assign_alias(channel, ":3");
        registry.add_to_category(ChannelCategory::Discovery, channel);
        registry.add_to_category(ChannelCategory::Control, channel);

        registry.forget_channel(channel);

        assert_eq!(registry.alias(channel), None);
        assert!(registry.list_by_category(ChannelCategory::Discovery).is_empty());
        assert!(registry.list_by_category(ChannelCategory::Control).is_empty());
    }
}
