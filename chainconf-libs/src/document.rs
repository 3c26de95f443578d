//! In-memory document model.
//!
//! A configuration document is an ordered tree of typed nodes. Two views of
//! the same data are provided:
//!
//! - [`ConfigNode`]: an owned, recursive value. This is the persisted shape
//!   and the unit new sub-trees are built in.
//! - [`DocumentTree`]: an arena of nodes addressed by [`NodeId`]. The
//!   placement algorithm reads and mutates this one. Ids stay valid across
//!   sibling insertions and removals, so a chain found during resolution can
//!   still be used after the tree has been edited.
//!
//! # Example YAML
//!
//! ```yaml
//! kind: root
//! children:
//!   - kind: chain
//!     attributes:
//!       name: default
//!     children:
//!       - kind: reader
//!         attributes:
//!           path: src/main/java
//!       - kind: walker
//!         children:
//!           - kind: transformations
//!             children:
//!               - kind: transformation
//!                 attributes:
//!                   type: imports-cleaner
//!       - kind: writer
//!         attributes:
//!           path: src/main/java
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a node. Keys are kept sorted for stable output.
pub type Attributes = BTreeMap<String, String>;

/// Closed set of node kinds a configuration document may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Document root
    Root,

    /// Named pipeline: reader, walker, writer
    Chain,

    /// Source of the chain
    Reader,

    /// Sink of the chain
    Writer,

    /// Stage owning the ordered transformation list
    Walker,

    /// Ordered list of transformations inside a walker
    #[serde(rename = "transformations")]
    TransformationsList,

    /// Single processing step
    Transformation,

    /// Sub-module declaration (directory holding its own document)
    Module,

    /// Configuration provider declaration
    Provider,

    /// Plugin declaration
    Plugin,
}

impl NodeKind {
    /// Tag used for this kind in persisted documents and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Chain => "chain",
            NodeKind::Reader => "reader",
            NodeKind::Writer => "writer",
            NodeKind::Walker => "walker",
            NodeKind::TransformationsList => "transformations",
            NodeKind::Transformation => "transformation",
            NodeKind::Module => "module",
            NodeKind::Provider => "provider",
            NodeKind::Plugin => "plugin",
        }
    }
}

/// Owned configuration node with its whole subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// What this node is
    pub kind: NodeKind,

    /// String attributes (`name`, `path`, `type`, parameters...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,

    /// Ordered children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Create a node without attributes or children
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute lookup
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Index of a node inside a [`DocumentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    attributes: Attributes,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed mutable document.
///
/// Nodes are never freed while the tree lives: a detached node keeps its id
/// and may be attached again elsewhere. Attaching a node that already has a
/// parent moves it.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// Create a document holding only an empty root
    pub fn new() -> Self {
        Self::from_node(ConfigNode::new(NodeKind::Root))
    }

    /// Build a tree whose root is `node`
    pub fn from_node(node: ConfigNode) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.create(node);
        tree
    }

    /// Snapshot of the whole document
    pub fn to_node(&self) -> ConfigNode {
        self.snapshot(self.root)
    }

    /// Snapshot of the subtree rooted at `id`
    pub fn snapshot(&self, id: NodeId) -> ConfigNode {
        let data = &self.nodes[id.0];
        ConfigNode {
            kind: data.kind,
            attributes: data.attributes.clone(),
            children: data.children.iter().map(|c| self.snapshot(*c)).collect(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self, id: NodeId) -> &Attributes {
        &self.nodes[id.0].attributes
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// First direct child of `id` with the given kind
    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.kind(*c) == kind)
    }

    /// All direct children of `id` with the given kind, in order
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.kind(*c) == kind)
            .collect()
    }

    /// Index of `id` among its parent's children
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Copy `node` into the arena as a detached subtree
    pub fn create(&mut self, node: ConfigNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: node.kind,
            attributes: node.attributes,
            parent: None,
            children: Vec::with_capacity(node.children.len()),
        });
        for child in node.children {
            let child_id = self.create(child);
            self.nodes[child_id.0].parent = Some(id);
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `child` at `index` among `parent`'s children.
    ///
    /// Later siblings shift one position; an index past the end appends.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` right before `reference`, a child of `parent`.
    ///
    /// Appends when `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        match self.position(reference) {
            Some(index) if self.parent(reference) == Some(parent) => self.insert_child(parent, index, child),
            _ => self.append_child(parent, child),
        }
    }

    /// Remove `id` from its parent. The subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }
}
