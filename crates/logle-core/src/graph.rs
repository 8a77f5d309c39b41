//! # Labeled Graph
//!
//! The deterministic graph storage shared by every analyzer.
//!
//! Nodes and edges carry a [`Label`]: a tag naming what the element is and a
//! [`LabelValue`] holding its data. A [`GraphSchema`] fixes the tags a graph
//! accepts and which of them are unique. All data structures use `BTreeMap`
//! for deterministic ordering, and ids are handed out in allocation order.

use crate::LogleError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node. Allocated sequentially from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an edge. Allocated sequentially from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u64);

// =============================================================================
// LABELS
// =============================================================================

/// Data attached to a node or an edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelValue {
    /// No data.
    Null,
    Int(i64),
    Str(String),
    /// Microseconds since the Unix epoch, UTC.
    Timestamp(i64),
    /// Fixed-arity record.
    Tuple(Vec<LabelValue>),
    /// Variable-length sequence.
    List(Vec<LabelValue>),
}

impl LabelValue {
    /// Shorthand for a string value.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Field `index` of a tuple, or `None` for any other value.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&LabelValue> {
        match self {
            Self::Tuple(fields) => fields.get(index),
            _ => None,
        }
    }
}

/// Values print without delimiters; container elements are joined by `/`.
impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::Timestamp(micros) => f.write_str(&crate::export::format_timestamp(*micros)),
            Self::Tuple(items) | Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("/")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// A tagged value. Two labels are equal when tag and value are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    pub tag: String,
    pub value: LabelValue,
}

impl Label {
    /// Create a label.
    pub fn new(tag: impl Into<String>, value: LabelValue) -> Self {
        Self {
            tag: tag.into(),
            value,
        }
    }

    /// A label with no data.
    pub fn null(tag: impl Into<String>) -> Self {
        Self::new(tag, LabelValue::Null)
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// Declares the node and edge tags a graph accepts.
///
/// A label whose tag is *unique* maps to at most one node (or, for edges, at
/// most one edge per source and target).
#[derive(Debug, Clone, Default)]
pub struct GraphSchema {
    node_tags: BTreeSet<String>,
    edge_tags: BTreeSet<String>,
    unique_node_tags: BTreeSet<String>,
    unique_edge_tags: BTreeSet<String>,
}

impl GraphSchema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node tag.
    #[must_use]
    pub fn node(mut self, tag: &str, unique: bool) -> Self {
        self.node_tags.insert(tag.to_string());
        if unique {
            self.unique_node_tags.insert(tag.to_string());
        }
        self
    }

    /// Declare an edge tag.
    #[must_use]
    pub fn edge(mut self, tag: &str, unique: bool) -> Self {
        self.edge_tags.insert(tag.to_string());
        if unique {
            self.unique_edge_tags.insert(tag.to_string());
        }
        self
    }

    fn check_node(&self, label: &Label) -> Result<bool, LogleError> {
        if !self.node_tags.contains(&label.tag) {
            return Err(LogleError::internal(format!(
                "The graph has no node tag: {}",
                label.tag
            )));
        }
        Ok(self.unique_node_tags.contains(&label.tag))
    }

    fn check_edge(&self, label: &Label) -> Result<bool, LogleError> {
        if !self.edge_tags.contains(&label.tag) {
            return Err(LogleError::internal(format!(
                "The graph has no edge tag: {}",
                label.tag
            )));
        }
        Ok(self.unique_edge_tags.contains(&label.tag))
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// A directed, labeled edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub label: Label,
}

/// A directed multigraph with labeled nodes and edges.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone)]
pub struct LabeledGraph {
    schema: GraphSchema,

    /// Node storage: NodeId -> Label
    nodes: BTreeMap<NodeId, Label>,

    /// Edge storage: EdgeId -> Edge
    edges: BTreeMap<EdgeId, Edge>,

    /// Reverse lookup for unique node labels.
    unique_nodes: BTreeMap<Label, NodeId>,

    /// Reverse lookup for unique edge labels.
    unique_edges: BTreeMap<(NodeId, NodeId, Label), EdgeId>,

    /// target -> sources
    predecessors: BTreeMap<NodeId, BTreeSet<NodeId>>,

    next_node_id: u64,
    next_edge_id: u64,
}

impl LabeledGraph {
    /// Create an empty graph accepting the tags in `schema`.
    #[must_use]
    pub fn new(schema: GraphSchema) -> Self {
        Self {
            schema,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            unique_nodes: BTreeMap::new(),
            unique_edges: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            next_node_id: 0,
            next_edge_id: 0,
        }
    }

    /// Add a node with `label`. For a unique tag, an existing node with the
    /// same label is returned instead.
    pub fn find_or_add_node(&mut self, label: Label) -> Result<NodeId, LogleError> {
        let unique = self.schema.check_node(&label)?;
        if let Some(&id) = self.unique_nodes.get(&label).filter(|_| unique) {
            return Ok(id);
        }

        let id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        if unique {
            self.unique_nodes.insert(label.clone(), id);
        }
        self.nodes.insert(id, label);
        Ok(id)
    }

    /// Add an edge `source -> target` with `label`. For a unique tag, an
    /// existing edge with the same endpoints and label is returned instead.
    pub fn find_or_add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        label: Label,
    ) -> Result<EdgeId, LogleError> {
        let unique = self.schema.check_edge(&label)?;
        for endpoint in [source, target] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(LogleError::internal(format!(
                    "Edge endpoint {endpoint} is not in the graph"
                )));
            }
        }

        let key = (source, target, label);
        if let Some(&id) = self.unique_edges.get(&key).filter(|_| unique) {
            return Ok(id);
        }

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id = self.next_edge_id.saturating_add(1);
        self.predecessors.entry(target).or_default().insert(source);
        if unique {
            self.unique_edges.insert(key.clone(), id);
        }
        let (source, target, label) = key;
        self.edges.insert(
            id,
            Edge {
                source,
                target,
                label,
            },
        );
        Ok(id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Label)> {
        self.nodes.iter().map(|(id, label)| (*id, label))
    }

    /// All edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().map(|(id, edge)| (*id, edge))
    }

    /// The label of a node.
    #[must_use]
    pub fn node_label(&self, id: NodeId) -> Option<&Label> {
        self.nodes.get(&id)
    }

    /// Sources of the edges ending at `id`, in id order.
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.predecessors
            .get(&id)
            .into_iter()
            .flat_map(|sources| sources.iter().copied())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes carrying exactly `label`.
    #[must_use]
    pub fn labeled_node_count(&self, label: &Label) -> usize {
        self.nodes.values().filter(|l| *l == label).count()
    }

    /// Number of edges carrying exactly `label`.
    #[must_use]
    pub fn labeled_edge_count(&self, label: &Label) -> usize {
        self.edges.values().filter(|e| e.label == *label).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
