//! Aggregated results: the fan-in side of the protocol.
//!
//! Each node reports a map from server-instance ID to a positional marker;
//! inner nodes fold their children's maps into their own. Because several
//! nodes of one tree may land on the same physical server, values collide on
//! equal keys and are concatenated. Degradation (any descendant reporting a
//! non-OK status) travels alongside the map as a flag, carried on the wire as
//! the HTTP status code rather than in the body.

use crate::node::NodeDescriptor;
use crate::types::ServerId;
use std::collections::BTreeMap;

/// The merged result of a node and all of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Aggregate {
    /// Server-instance ID → space-separated positional markers.
    pub entries: BTreeMap<String, String>,
    /// Whether any node in this subtree reported a non-OK status.
    pub degraded: bool,
}

impl Aggregate {
    /// The singleton result of one node, before any children are folded in.
    #[must_use]
    pub fn of_node(server_id: ServerId, node: &NodeDescriptor) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(server_id.to_string(), node.marker());
        Self {
            entries,
            degraded: false,
        }
    }

    /// Build an aggregate from an already-decoded entry map.
    #[must_use]
    pub fn from_entries(entries: BTreeMap<String, String>, degraded: bool) -> Self {
        Self { entries, degraded }
    }

    /// Fold another aggregate into this one.
    ///
    /// Key-wise union; colliding values concatenate with a single space.
    /// The set of markers per key is independent of merge order, which is
    /// what makes the fan-in insensitive to child arrival order.
    pub fn merge(&mut self, other: Self) {
        for (key, value) in other.entries {
            match self.entries.get_mut(&key) {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(&value);
                }
                None => {
                    self.entries.insert(key, value);
                }
            }
        }
        self.degraded |= other.degraded;
    }

    /// Mark this subtree as degraded.
    pub fn degrade(&mut self) {
        self.degraded = true;
    }
}
