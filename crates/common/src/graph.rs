//! The program graph handed over by the editor.
//!
//! A graph is a flat, id-indexed dictionary of block nodes. Chains are
//! formed by `next` links; control blocks point at the first node of a
//! nested chain through `body`. The engine only reads the graph.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::instruction::NodeId;
use crate::value::Value;

/// One block placed in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub id: NodeId,
    /// Block type tag, resolved through the registry.
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,
    /// Linear successor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NodeId>,
    /// First node of the nested chain, for control blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<NodeId>,
}

impl BlockNode {
    pub fn new(id: impl Into<NodeId>, block_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            inputs: IndexMap::new(),
            next: None,
            body: None,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn with_next(mut self, next: impl Into<NodeId>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<NodeId>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Numeric input, or `default` when absent or not a number.
    pub fn number_input(&self, name: &str, default: f64) -> f64 {
        match self.input(name) {
            Some(v) if v.is_numeric() => v.as_number(),
            _ => default,
        }
    }

    /// Input as a value, or `default` when absent.
    pub fn value_input(&self, name: &str, default: impl Into<Value>) -> Value {
        self.input(name).cloned().unwrap_or_else(|| default.into())
    }
}

/// Document shapes accepted by [`BlockGraph::from_json`].
#[derive(Deserialize)]
#[serde(untagged)]
enum GraphDocument {
    List(Vec<BlockNode>),
    Keyed { blocks: IndexMap<NodeId, BlockNode> },
}

/// The whole program graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockGraph {
    nodes: IndexMap<NodeId, BlockNode>,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes, rejecting duplicate ids.
    pub fn from_nodes(nodes: impl IntoIterator<Item = BlockNode>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert(node)?;
        }
        Ok(graph)
    }

    /// Parse a graph document.
    ///
    /// Accepts either `{"blocks": {"<id>": node, ...}}` or a bare array of
    /// nodes. Fields the engine does not use (canvas position, etc.) are
    /// ignored.
    pub fn from_json(text: &str) -> Result<Self, GraphError> {
        match serde_json::from_str::<GraphDocument>(text)? {
            GraphDocument::Keyed { blocks } => {
                let mut graph = Self::new();
                for (key, node) in blocks {
                    if key != node.id {
                        return Err(GraphError::IdMismatch { key, id: node.id });
                    }
                    graph.insert(node)?;
                }
                Ok(graph)
            }
            GraphDocument::List(nodes) => Self::from_nodes(nodes),
        }
    }

    /// Add a node, rejecting duplicate ids.
    pub fn insert(&mut self, node: BlockNode) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&BlockNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that no other node links to as `next` or `body`, in document order.
    pub fn roots(&self) -> Vec<&BlockNode> {
        let linked: IndexSet<&str> = self
            .nodes
            .values()
            .flat_map(|n| [n.next.as_deref(), n.body.as_deref()])
            .flatten()
            .collect();
        self.nodes
            .values()
            .filter(|n| !linked.contains(n.id.as_str()))
            .collect()
    }

    /// Root nodes of the given type, e.g. every `start` block.
    pub fn start_nodes(&self, block_type: &str) -> Vec<&BlockNode> {
        self.roots()
            .into_iter()
            .filter(|n| n.block_type == block_type)
            .collect()
    }
}
