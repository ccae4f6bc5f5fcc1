//! Typed workflow graph model.
//!
//! ComfyUI executes a JSON map of `"<id>": {"class_type", "inputs"}`
//! nodes where inputs are either literals or `["<producer id>", slot]`
//! links. This module models that wire format with typed nodes and
//! links, and allocates node ids from a monotonically increasing
//! counter so that splicing extensions (ControlNet, LoRA, CLIP-skip)
//! can never collide with hand-picked ids.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::GraphError;

/// Identifier of a node within one graph.
///
/// Allocated by [`WorkflowGraph::add_node`]; rendered as a decimal
/// string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Numeric value of this id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to one output slot of a producer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub node: NodeId,
    pub slot: u32,
}

impl Link {
    pub fn new(node: NodeId, slot: u32) -> Self {
        Self { node, slot }
    }
}

/// A single node input: a literal value or a link to another node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeInput {
    Value(serde_json::Value),
    Link(Link),
}

impl NodeInput {
    /// Literal input from anything convertible to a JSON value.
    pub fn value(v: impl Into<serde_json::Value>) -> Self {
        Self::Value(v.into())
    }

    /// Link input to `slot` of `node`.
    pub fn link(node: NodeId, slot: u32) -> Self {
        Self::Link(Link::new(node, slot))
    }

    /// The link target, if this input is a link.
    pub fn as_link(&self) -> Option<Link> {
        match self {
            Self::Link(l) => Some(*l),
            Self::Value(_) => None,
        }
    }
}

impl From<Link> for NodeInput {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

/// One operation node in the workflow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Remote operation class, e.g. `KSampler`.
    pub class_type: String,
    /// Optional display title, serialized under `_meta.title`.
    pub title: Option<String>,
    pub inputs: BTreeMap<String, NodeInput>,
}

impl Node {
    pub fn new(class_type: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            title: None,
            inputs: BTreeMap::new(),
        }
    }

    /// Builder-style title setter.
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder-style input setter.
    pub fn input(mut self, name: impl Into<String>, input: NodeInput) -> Self {
        self.inputs.insert(name.into(), input);
        self
    }
}

/// Whether a class type is a terminal save node.
fn is_save_class(class_type: &str) -> bool {
    class_type.starts_with("SaveImage") || class_type.starts_with("SaveVideo")
}

/// A directed acyclic graph of workflow nodes.
///
/// Built fresh per request and never mutated after submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert a node, allocating the next sequential id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Replace one input of an existing node.
    pub fn set_input(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        input: NodeInput,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
        node.inputs.insert(name.into(), input);
        Ok(())
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// The single terminal save node, if exactly one exists.
    pub fn terminal_save_node(&self) -> Option<NodeId> {
        let mut save_nodes = self
            .nodes
            .iter()
            .filter(|(_, n)| is_save_class(&n.class_type))
            .map(|(id, _)| *id);
        let first = save_nodes.next()?;
        if save_nodes.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Validate the structural invariants of the graph.
    ///
    /// - every link targets a node present in the graph;
    /// - the graph is acyclic;
    /// - exactly one terminal save node exists.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (id, node) in &self.nodes {
            for (name, input) in &node.inputs {
                if let Some(link) = input.as_link() {
                    if !self.nodes.contains_key(&link.node) {
                        return Err(GraphError::DanglingLink {
                            from: *id,
                            input: name.clone(),
                            to: link.node,
                        });
                    }
                }
            }
        }

        self.check_acyclic()?;

        let save_count = self
            .nodes
            .values()
            .filter(|n| is_save_class(&n.class_type))
            .count();
        match save_count {
            0 => Err(GraphError::NoSaveNode),
            1 => Ok(()),
            n => Err(GraphError::MultipleSaveNodes(n)),
        }
    }

    /// Depth-first cycle check over consumer-to-producer edges.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        let mut marks: BTreeMap<NodeId, Mark> = BTreeMap::new();

        fn visit(
            graph: &WorkflowGraph,
            id: NodeId,
            marks: &mut BTreeMap<NodeId, Mark>,
        ) -> Result<(), GraphError> {
            match marks.get(&id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => return Err(GraphError::CycleDetected(id)),
                None => {}
            }
            marks.insert(id, Mark::InProgress);
            if let Some(node) = graph.node(id) {
                for input in node.inputs.values() {
                    if let Some(link) = input.as_link() {
                        visit(graph, link.node, marks)?;
                    }
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        for id in self.nodes.keys() {
            visit(self, *id, &mut marks)?;
        }
        Ok(())
    }

    /// Serialize to the ComfyUI `/prompt` wire shape.
    ///
    /// Links become `["<producer id>", slot]` pairs; node titles are
    /// carried under `_meta.title` when set.
    pub fn to_api_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (id, node) in &self.nodes {
            let mut inputs = serde_json::Map::new();
            for (name, input) in &node.inputs {
                let value = match input {
                    NodeInput::Value(v) => v.clone(),
                    NodeInput::Link(l) => {
                        serde_json::json!([l.node.to_string(), l.slot])
                    }
                };
                inputs.insert(name.clone(), value);
            }
            let mut obj = serde_json::Map::new();
            obj.insert(
                "class_type".to_string(),
                serde_json::Value::String(node.class_type.clone()),
            );
            obj.insert("inputs".to_string(), serde_json::Value::Object(inputs));
            if let Some(title) = &node.title {
                obj.insert("_meta".to_string(), serde_json::json!({ "title": title }));
            }
            map.insert(id.to_string(), serde_json::Value::Object(obj));
        }
        serde_json::Value::Object(map)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_sequential_from_one() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(Node::new("CheckpointLoaderSimple"));
        let b = graph.add_node(Node::new("CLIPTextEncode"));
        let c = graph.add_node(Node::new("SaveImage"));
        assert_eq!(a.as_u32(), 1);
        assert_eq!(b.as_u32(), 2);
        assert_eq!(c.as_u32(), 3);
    }

    #[test]
    fn valid_chain_passes_validation() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(Node::new("CheckpointLoaderSimple"));
        let b = graph.add_node(Node::new("VAEDecode").input("vae", NodeInput::link(a, 2)));
        graph.add_node(Node::new("SaveImage").input("images", NodeInput::link(b, 0)));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn dangling_link_is_rejected() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(
            Node::new("SaveImage").input("images", NodeInput::link(NodeId(99), 0)),
        );
        match graph.validate() {
            Err(GraphError::DanglingLink { from, to, .. }) => {
                assert_eq!(from, a);
                assert_eq!(to.as_u32(), 99);
            }
            other => panic!("Expected DanglingLink, got {other:?}"),
        }
    }

    #[test]
    fn cycle_is_rejected() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(Node::new("SaveImage"));
        let b = graph.add_node(Node::new("VAEDecode").input("samples", NodeInput::link(a, 0)));
        graph
            .set_input(a, "images", NodeInput::link(b, 0))
            .unwrap();
        assert!(matches!(
            graph.validate(),
            Err(GraphError::CycleDetected(_))
        ));
    }

    #[test]
    fn missing_save_node_is_rejected() {
        let mut graph = WorkflowGraph::new();
        graph.add_node(Node::new("CheckpointLoaderSimple"));
        assert!(matches!(graph.validate(), Err(GraphError::NoSaveNode)));
    }

    #[test]
    fn multiple_save_nodes_are_rejected() {
        let mut graph = WorkflowGraph::new();
        graph.add_node(Node::new("SaveImage"));
        graph.add_node(Node::new("SaveImage"));
        assert!(matches!(
            graph.validate(),
            Err(GraphError::MultipleSaveNodes(2))
        ));
    }

    #[test]
    fn terminal_save_node_requires_exactly_one() {
        let mut graph = WorkflowGraph::new();
        assert_eq!(graph.terminal_save_node(), None);
        let save = graph.add_node(Node::new("SaveImage"));
        assert_eq!(graph.terminal_save_node(), Some(save));
        graph.add_node(Node::new("SaveImage"));
        assert_eq!(graph.terminal_save_node(), None);
    }

    #[test]
    fn set_input_on_missing_node_errors() {
        let mut graph = WorkflowGraph::new();
        let err = graph.set_input(NodeId(7), "clip", NodeInput::value(1));
        assert!(matches!(err, Err(GraphError::UnknownNode(_))));
    }

    #[test]
    fn wire_format_uses_string_ids_and_link_pairs() {
        let mut graph = WorkflowGraph::new();
        let ckpt = graph.add_node(
            Node::new("CheckpointLoaderSimple")
                .titled("Load Checkpoint")
                .input("ckpt_name", NodeInput::value("dreamshaper_8.safetensors")),
        );
        graph.add_node(
            Node::new("SaveImage").input("images", NodeInput::link(ckpt, 0)),
        );

        let json = graph.to_api_json();
        assert_eq!(json["1"]["class_type"], "CheckpointLoaderSimple");
        assert_eq!(
            json["1"]["inputs"]["ckpt_name"],
            "dreamshaper_8.safetensors"
        );
        assert_eq!(json["1"]["_meta"]["title"], "Load Checkpoint");
        assert_eq!(json["2"]["inputs"]["images"], serde_json::json!(["1", 0]));
        // Untitled nodes carry no _meta key.
        assert!(json["2"].get("_meta").is_none());
    }
}
