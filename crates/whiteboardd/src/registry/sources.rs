use std::collections::{BTreeSet, HashMap};

/// A registered SIB and the Nodes joined to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSource {
    id: String,
    name: String,
    joined_nodes: BTreeSet<String>,
}

impl AccessSource {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            joined_nodes: BTreeSet::new(),
        }
    }

    /// SIB identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name announced at registration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes currently joined.
    pub fn joined_nodes(&self) -> impl Iterator<Item = &str> {
        self.joined_nodes.iter().map(String::as_str)
    }
}

/// Registered SIBs plus the node-to-SIB join map.
///
/// `join` and `leave` update a source's member set and the join map
/// together; a Node belongs to at most one source at a time.
#[derive(Debug, Default)]
pub struct SourceDirectory {
    sources: Vec<AccessSource>,
    join_map: HashMap<String, String>,
}

impl SourceDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source; returns `false` and changes nothing if `id` exists.
    pub fn add_source(&mut self, id: &str, name: &str) -> bool {
        if self.find(id).is_some() {
            return false;
        }
        self.sources.push(AccessSource::new(id, name));
        true
    }

    /// Removes a source after unlinking every joined Node from the join map.
    pub fn remove_source(&mut self, id: &str) -> Option<AccessSource> {
        let position = self.sources.iter().position(|source| source.id == id)?;
        let removed = self.sources.remove(position);
        for node in &removed.joined_nodes {
            if self.join_map.get(node).is_some_and(|sib| sib == id) {
                self.join_map.remove(node);
            }
        }
        Some(removed)
    }

    /// Source registered under `id`.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&AccessSource> {
        self.sources.iter().find(|source| source.id == id)
    }

    /// Every source in registration order.
    #[must_use]
    pub fn list_all(&self) -> &[AccessSource] {
        &self.sources
    }

    /// Whether `node` is in the member set of `source`.
    #[must_use]
    pub fn is_node_joined(&self, source: &str, node: &str) -> bool {
        self.find(source)
            .is_some_and(|entry| entry.joined_nodes.contains(node))
    }

    /// Marks `node` joined to `source`. Returns `false` if the source is
    /// unknown; membership checks are the caller's concern.
    pub fn join(&mut self, source: &str, node: &str) -> bool {
        let Some(entry) = self.sources.iter_mut().find(|entry| entry.id == source) else {
            return false;
        };
        entry.joined_nodes.insert(node.to_owned());
        self.join_map.insert(node.to_owned(), source.to_owned());
        true
    }

    /// Removes `node` from `source` and clears its join-map entry.
    pub fn leave(&mut self, source: &str, node: &str) -> bool {
        let removed = self
            .sources
            .iter_mut()
            .find(|entry| entry.id == source)
            .is_some_and(|entry| entry.joined_nodes.remove(node));
        if self.join_map.get(node).is_some_and(|sib| sib == source) {
            self.join_map.remove(node);
        }
        removed
    }

    /// SIB that `node` is joined to.
    #[must_use]
    pub fn sib_for_joined_node(&self, node: &str) -> Option<&str> {
        self.join_map.get(node).map(String::as_str)
    }

    /// Drops a stale join-map entry for `node`.
    pub fn forget_node(&mut self, node: &str) -> bool {
        self.join_map.remove(node).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn directory() -> SourceDirectory {
        let mut directory = SourceDirectory::new();
        assert!(directory.add_source("s1", "Kitchen"));
        assert!(directory.add_source("s2", "Garage"));
        directory
    }

    fn assert_consistent(directory: &SourceDirectory, node: &str) {
        let members: Vec<&str> = directory
            .list_all()
            .iter()
            .filter(|source| directory.is_node_joined(source.id(), node))
            .map(AccessSource::id)
            .collect();
        assert!(members.len() <= 1, "{node} joined to {members:?}");
        assert_eq!(members.first().copied(), directory.sib_for_joined_node(node));
    }

    #[rstest]
    fn duplicate_add_is_rejected(mut directory: SourceDirectory) {
        assert!(!directory.add_source("s1", "Other"));
        let matching = directory
            .list_all()
            .iter()
            .filter(|source| source.id() == "s1")
            .count();
        assert_eq!(matching, 1);
        assert_eq!(directory.find("s1").map(AccessSource::name), Some("Kitchen"));
    }

    #[rstest]
    fn join_then_leave_restores_state(mut directory: SourceDirectory) {
        assert!(directory.join("s1", "n1"));
        assert_consistent(&directory, "n1");
        assert_eq!(directory.sib_for_joined_node("n1"), Some("s1"));

        assert!(directory.leave("s1", "n1"));
        assert_consistent(&directory, "n1");
        assert_eq!(directory.sib_for_joined_node("n1"), None);
        assert!(!directory.is_node_joined("s1", "n1"));
    }

    #[rstest]
    fn join_to_unknown_source_changes_nothing(mut directory: SourceDirectory) {
        assert!(!directory.join("missing", "n1"));
        assert_eq!(directory.sib_for_joined_node("n1"), None);
    }

    #[rstest]
    fn remove_source_unlinks_every_joined_node(mut directory: SourceDirectory) {
        for node in ["n1", "n2", "n3"] {
            directory.join("s1", node);
        }
        directory.join("s2", "n4");

        let removed = directory.remove_source("s1").expect("s1 registered");

        assert_eq!(removed.joined_nodes().count(), 3);
        assert!(directory.find("s1").is_none());
        for node in ["n1", "n2", "n3"] {
            assert_eq!(directory.sib_for_joined_node(node), None);
        }
        assert_eq!(directory.sib_for_joined_node("n4"), Some("s2"));
    }

    #[rstest]
    fn list_all_preserves_registration_order(directory: SourceDirectory) {
        let ids: Vec<&str> = directory.list_all().iter().map(AccessSource::id).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
    }
}
