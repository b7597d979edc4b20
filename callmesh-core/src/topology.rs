//! Topology algorithm: deriving a node's children from its position.
//!
//! The three shapes share one invariant: expanding any valid root recursively
//! instantiates exactly `size` nodes, with indices 1..=size each appearing
//! once and every non-root node having exactly one parent.

use crate::node::NodeDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape rule governing how children are derived from a node.
///
/// Fixed for a whole call tree once chosen at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// One dispatcher fanning out to `size - 1` independent workers.
    #[default]
    Fan,
    /// A strict sequential pipeline: 1 → 2 → ... → size.
    Chain,
    /// A binary tree addressed by bit-shift indexing.
    Tree,
}

impl Topology {
    /// The lowercase wire tag for this topology.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fan => "fan",
            Self::Chain => "chain",
            Self::Tree => "tree",
        }
    }
}

impl FromStr for Topology {
    type Err = crate::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fan" => Ok(Self::Fan),
            "chain" => Ok(Self::Chain),
            "tree" => Ok(Self::Tree),
            other => Err(crate::ValidationError::UnknownTopology(other.to_string())),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NodeDescriptor {
    /// Compute the ordered children of this node.
    ///
    /// Pure, deterministic, and total: a structurally valid node never makes
    /// this fail. Leaves get an empty vector.
    #[must_use]
    pub fn children(&self) -> Vec<NodeDescriptor> {
        match self.topology {
            Topology::Fan => {
                // Only the root has children: all remaining indices, depth 1.
                if self.index != 1 {
                    return Vec::new();
                }
                (2..=self.size).map(|index| self.child(index, 1)).collect()
            }
            Topology::Chain => {
                if self.index >= self.size {
                    return Vec::new();
                }
                vec![self.child(self.index + 1, self.depth + 1)]
            }
            Topology::Tree => {
                // Bit-shift addressing: candidates index + 2^(depth + i) for
                // i in {0, 1}. Assigns indices in level order and terminates
                // once a candidate exceeds the tree size. Checked arithmetic
                // keeps this total even for descriptors whose depth exceeds
                // the shift width: such candidates cannot fit in any valid
                // tree, so they count as exceeding the size.
                let mut children = Vec::with_capacity(2);
                for i in 0..2u32 {
                    let candidate = self
                        .depth
                        .checked_add(i)
                        .and_then(|shift| 1u32.checked_shl(shift))
                        .and_then(|step| self.index.checked_add(step));
                    match candidate {
                        Some(index) if index <= self.size => {
                            children.push(self.child(index, self.depth + 1));
                        }
                        _ => break,
                    }
                }
                children
            }
        }
    }

    /// Whether this node has no children under its topology.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::RootParams;
    use std::collections::BTreeMap;

    fn root(topology: Topology, size: u32) -> NodeDescriptor {
        NodeDescriptor::root(RootParams {
            topology,
            size,
            ..RootParams::default()
        })
    }

    /// Recursively expand a root, returning index -> (parent_index, depth).
    fn expand(node: &NodeDescriptor, seen: &mut BTreeMap<u32, (u32, u32)>) {
        let prev = seen.insert(node.index, (node.parent_index, node.depth));
        assert!(prev.is_none(), "index {} instantiated twice", node.index);
        for child in node.children() {
            assert_eq!(child.depth, node.depth + 1);
            assert_eq!(child.parent_index, node.index);
            assert_eq!(child.request_id, node.request_id);
            assert_eq!(child.topology, node.topology);
            assert_eq!(child.size, node.size);
            expand(&child, seen);
        }
    }

    #[test]
    fn every_topology_instantiates_exactly_size_nodes() {
        for topology in [Topology::Fan, Topology::Chain, Topology::Tree] {
            for size in [1, 2, 3, 4, 5, 7, 8, 16, 100, 1000] {
                let mut seen = BTreeMap::new();
                expand(&root(topology, size), &mut seen);
                assert_eq!(
                    seen.len() as u32,
                    size,
                    "{topology} size={size} produced {} nodes",
                    seen.len()
                );
                let indices: Vec<u32> = seen.keys().copied().collect();
                assert_eq!(indices, (1..=size).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn fan_root_has_all_other_indices_as_leaves() {
        let root = root(Topology::Fan, 5);
        let children = root.children();
        let indices: Vec<u32> = children.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![2, 3, 4, 5]);
        for child in &children {
            assert_eq!(child.depth, 1);
            assert!(child.is_leaf());
        }
    }

    #[test]
    fn chain_links_every_index_once() {
        let mut node = root(Topology::Chain, 4);
        for expected in [2u32, 3, 4] {
            let children = node.children();
            assert_eq!(children.len(), 1);
            node = children.into_iter().next().unwrap();
            assert_eq!(node.index, expected);
        }
        assert!(node.is_leaf());
    }

    #[test]
    fn tree_of_five_matches_level_order_layout() {
        let root = root(Topology::Tree, 5);
        let level1: Vec<u32> = root.children().iter().map(|c| c.index).collect();
        assert_eq!(level1, vec![2, 3]);

        let node2 = &root.children()[0];
        let node3 = &root.children()[1];
        assert_eq!(
            node2.children().iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![4]
        );
        // 3 + 2^1 = 5 <= size, so node 3 still has one child.
        assert_eq!(
            node3.children().iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![5]
        );
    }

    #[test]
    fn single_node_tree_is_just_the_root() {
        for topology in [Topology::Fan, Topology::Chain, Topology::Tree] {
            assert!(root(topology, 1).is_leaf());
        }
    }

    #[test]
    fn tree_depth_beyond_shift_width_is_a_leaf() {
        // A forged descriptor can carry any depth; the candidate step no
        // longer fits in u32, so the node must terminate, not panic.
        let mut node = root(Topology::Tree, 5);
        node.depth = 32;
        assert!(node.children().is_empty());
        node.depth = u32::MAX;
        assert!(node.children().is_empty());
    }

    #[test]
    fn chain_never_extends_past_size() {
        // Termination must hold even for positions no honest tree produces,
        // otherwise a forged descriptor recurses forever.
        let mut node = root(Topology::Chain, 4);
        node.index = 4;
        assert!(node.children().is_empty());
        node.index = 9;
        assert!(node.children().is_empty());
        node.size = 0;
        node.index = 1;
        assert!(node.children().is_empty());
    }

    #[test]
    fn topology_parses_only_known_tags() {
        assert_eq!("fan".parse::<Topology>().unwrap(), Topology::Fan);
        assert_eq!("chain".parse::<Topology>().unwrap(), Topology::Chain);
        assert_eq!("tree".parse::<Topology>().unwrap(), Topology::Tree);
        assert!("ring".parse::<Topology>().is_err());
        assert!("FAN".parse::<Topology>().is_err());
    }
}
