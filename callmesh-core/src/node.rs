//! Node descriptor: one position in a simulated call tree.
//!
//! A descriptor is created fresh per HTTP call — the root from inbound query
//! parameters, every child by the topology algorithm — is never mutated after
//! creation, and is discarded when the call that owns it returns. The JSON
//! field names are the wire contract between instances and are kept stable.

use crate::error::ValidationError;
use crate::task::TaskKind;
use crate::topology::Topology;
use crate::types::RequestId;
use crate::{DEFAULT_TASK_DURATION_MS, MAX_TREE_SIZE};
use serde::{Deserialize, Serialize};

/// Serializable description of one node of a call tree.
///
/// Exchanged verbatim between caller and callee as the body of the internal
/// recursion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Identifier shared by every node of one call tree.
    #[serde(rename = "RequestID")]
    pub request_id: RequestId,
    /// Shape of the whole tree; fixed once chosen at the root.
    #[serde(rename = "Topology")]
    pub topology: Topology,
    /// Unique position within the tree, starting at 1 for the root.
    #[serde(rename = "Index")]
    pub index: u32,
    /// Index of the node that spawned this one; 0 at the root.
    #[serde(rename = "ParentIndex")]
    pub parent_index: u32,
    /// Total number of nodes requested for this tree.
    #[serde(rename = "Size")]
    pub size: u32,
    /// Distance from the root; 0 at the root.
    #[serde(rename = "Depth")]
    pub depth: u32,
    /// Workload to run at this node; `None` means no-op.
    #[serde(rename = "TaskName", with = "task_name")]
    pub task: Option<TaskKind>,
    /// Milliseconds the workload runs before being cancelled.
    #[serde(rename = "TaskDuration")]
    pub task_duration_ms: u64,
}

/// Validated parameters for constructing a root descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootParams {
    /// Requested tree shape.
    pub topology: Topology,
    /// Requested tree size.
    pub size: u32,
    /// Workload to run at each node, if any.
    pub task: Option<TaskKind>,
    /// Workload duration in milliseconds.
    pub task_duration_ms: u64,
}

impl Default for RootParams {
    fn default() -> Self {
        Self {
            topology: Topology::Fan,
            size: 1,
            task: None,
            task_duration_ms: DEFAULT_TASK_DURATION_MS,
        }
    }
}

impl RootParams {
    /// Parse and validate root parameters from an entry-point request.
    ///
    /// `task_segment` is the path segment after `/` ("" for none); `query`
    /// is the raw query string (`size=..&topology=..&time=..`). Unknown query
    /// parameters are ignored, matching the original service.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending parameter.
    pub fn from_query(task_segment: &str, query: &str) -> Result<Self, ValidationError> {
        let mut params = Self::default();

        if !task_segment.is_empty() {
            params.task = Some(task_segment.parse()?);
        }

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "size" => {
                    params.size = value
                        .parse::<u32>()
                        .ok()
                        .filter(|s| (1..=MAX_TREE_SIZE).contains(s))
                        .ok_or_else(|| ValidationError::InvalidSize(value.to_string()))?;
                }
                "topology" => params.topology = value.parse()?,
                "time" => {
                    params.task_duration_ms = value
                        .parse::<u64>()
                        .ok()
                        .filter(|t| *t > 0)
                        .ok_or_else(|| ValidationError::InvalidDuration(value.to_string()))?;
                }
                _ => {}
            }
        }

        Ok(params)
    }
}

impl NodeDescriptor {
    /// Construct the root descriptor of a new call tree.
    ///
    /// Generates the tree-wide request ID; every descendant inherits it
    /// unchanged.
    #[must_use]
    pub fn root(params: RootParams) -> Self {
        Self {
            request_id: RequestId::new(),
            topology: params.topology,
            index: 1,
            parent_index: 0,
            size: params.size,
            depth: 0,
            task: params.task,
            task_duration_ms: params.task_duration_ms,
        }
    }

    /// Construct a child of this node at the given position.
    ///
    /// Tree-wide fields (request ID, topology, size, task, duration) carry
    /// over unchanged; only position fields differ.
    pub(crate) fn child(&self, index: u32, depth: u32) -> Self {
        Self {
            request_id: self.request_id,
            topology: self.topology,
            index,
            parent_index: self.index,
            size: self.size,
            depth,
            task: self.task,
            task_duration_ms: self.task_duration_ms,
        }
    }

    /// The zero-padded positional marker this node reports under its server.
    #[must_use]
    pub fn marker(&self) -> String {
        format!("{:04}", self.index)
    }

    /// Check the tree invariants this descriptor must satisfy.
    ///
    /// Descriptors built by [`NodeDescriptor::root`] and the topology
    /// algorithm always satisfy them; the internal endpoint is public, so a
    /// forged descriptor must be rejected here before any child is spawned.
    /// A chain with `Size` below `Index` would otherwise recurse without
    /// bound.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDescriptor`] naming the violated
    /// invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_TREE_SIZE).contains(&self.size) {
            return Err(ValidationError::InvalidDescriptor(format!(
                "size {} out of [1, {MAX_TREE_SIZE}]",
                self.size
            )));
        }
        if !(1..=self.size).contains(&self.index) {
            return Err(ValidationError::InvalidDescriptor(format!(
                "index {} out of [1, {}]",
                self.index, self.size
            )));
        }
        if self.depth >= self.size {
            return Err(ValidationError::InvalidDescriptor(format!(
                "depth {} not below size {}",
                self.depth, self.size
            )));
        }
        if self.parent_index >= self.index {
            return Err(ValidationError::InvalidDescriptor(format!(
                "parent index {} not below index {}",
                self.parent_index, self.index
            )));
        }
        if self.task_duration_ms == 0 {
            return Err(ValidationError::InvalidDescriptor(
                "task duration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Wire encoding of the optional task: a plain string, "" meaning none.
mod task_name {
    use crate::task::TaskKind;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        task: &Option<TaskKind>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(task.map_or("", |t| t.as_str()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<TaskKind>, D::Error> {
        let name = String::deserialize(deserializer)?;
        if name.is_empty() {
            return Ok(None);
        }
        name.parse().map(Some).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_entry_point_contract() {
        let params = RootParams::from_query("", "").unwrap();
        assert_eq!(params, RootParams::default());

        let root = NodeDescriptor::root(params);
        assert_eq!(root.index, 1);
        assert_eq!(root.parent_index, 0);
        assert_eq!(root.depth, 0);
        assert_eq!(root.size, 1);
        assert_eq!(root.task_duration_ms, 50);
        assert!(root.task.is_none());
    }

    #[test]
    fn full_query_is_parsed() {
        let params = RootParams::from_query("cpu", "size=42&topology=tree&time=200").unwrap();
        assert_eq!(params.task, Some(TaskKind::Cpu));
        assert_eq!(params.size, 42);
        assert_eq!(params.topology, Topology::Tree);
        assert_eq!(params.task_duration_ms, 200);
    }

    #[test]
    fn out_of_range_sizes_are_rejected() {
        for bad in ["0", "1001", "-3", "abc", ""] {
            let err = RootParams::from_query("", &format!("size={bad}")).unwrap_err();
            assert_eq!(err, ValidationError::InvalidSize(bad.to_string()));
        }
        assert!(RootParams::from_query("", "size=1000").is_ok());
    }

    #[test]
    fn bad_topology_duration_and_task_are_rejected() {
        assert!(matches!(
            RootParams::from_query("", "topology=ring"),
            Err(ValidationError::UnknownTopology(_))
        ));
        assert!(matches!(
            RootParams::from_query("", "time=0"),
            Err(ValidationError::InvalidDuration(_))
        ));
        assert!(matches!(
            RootParams::from_query("fork", ""),
            Err(ValidationError::UnknownTask(_))
        ));
    }

    #[test]
    fn wire_field_names_are_stable() {
        let root = NodeDescriptor::root(RootParams::default());
        let json = serde_json::to_value(&root).unwrap();
        let object = json.as_object().unwrap();
        for field in [
            "RequestID",
            "Topology",
            "Index",
            "ParentIndex",
            "Size",
            "Depth",
            "TaskName",
            "TaskDuration",
        ] {
            assert!(object.contains_key(field), "missing wire field {field}");
        }
        assert_eq!(json["TaskName"], "");
        assert_eq!(json["Topology"], "fan");
    }

    #[test]
    fn descriptor_roundtrips_with_task() {
        let mut root = NodeDescriptor::root(RootParams::default());
        root.task = Some(TaskKind::Ram);
        let json = serde_json::to_string(&root).unwrap();
        let back: NodeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(root, back);
    }

    #[test]
    fn honestly_built_descriptors_validate() {
        fn check(node: &NodeDescriptor) {
            node.validate().unwrap();
            for child in node.children() {
                check(&child);
            }
        }
        for topology in [Topology::Fan, Topology::Chain, Topology::Tree] {
            check(&NodeDescriptor::root(RootParams {
                topology,
                size: 8,
                ..RootParams::default()
            }));
        }
    }

    #[test]
    fn forged_descriptors_are_rejected() {
        let root = NodeDescriptor::root(RootParams {
            topology: Topology::Chain,
            size: 5,
            ..RootParams::default()
        });

        let mut zero_size = root.clone();
        zero_size.size = 0;
        assert!(zero_size.validate().is_err());

        let mut index_past_size = root.clone();
        index_past_size.index = 6;
        assert!(index_past_size.validate().is_err());

        let mut absurd_depth = root.clone();
        absurd_depth.depth = 32;
        assert!(absurd_depth.validate().is_err());

        let mut parent_not_below = root.clone();
        parent_not_below.index = 2;
        parent_not_below.parent_index = 2;
        assert!(parent_not_below.validate().is_err());

        let mut zero_duration = root;
        zero_duration.task_duration_ms = 0;
        assert!(zero_duration.validate().is_err());
    }

    #[test]
    fn marker_is_zero_padded() {
        let mut root = NodeDescriptor::root(RootParams::default());
        assert_eq!(root.marker(), "0001");
        root.index = 123;
        assert_eq!(root.marker(), "0123");
    }
}
