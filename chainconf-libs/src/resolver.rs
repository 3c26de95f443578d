//! Classification of a document's top level.
//!
//! One left-to-right pass over the root's children answers every question
//! the placement rules need: where the target chain is, where the "before"
//! chain is, where the default chain is, whether the document is still in
//! the legacy flat format, and whether any chain exists at all.

use crate::config::{DEFAULT_CHAIN, chain_name};
use crate::document::{DocumentTree, NodeId, NodeKind};

/// Result of [`resolve`]. Node ids point into the tree that was scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// First chain whose name equals the requested chain
    pub target_chain: Option<NodeId>,

    /// Chain whose name equals the "before" hint
    pub before_chain: Option<NodeId>,

    /// First chain named `default`, whatever chain was requested
    pub default_chain: Option<NodeId>,

    /// Transformations sitting directly under the root, in document order
    pub bare_transformations: Vec<NodeId>,

    /// At least one chain was seen
    pub has_any_chain: bool,
}

impl Resolution {
    /// The document uses the legacy flat format
    pub fn has_bare_transformations(&self) -> bool {
        !self.bare_transformations.is_empty()
    }
}

/// Classify the root's direct children.
///
/// Chain names are assumed unique: the first chain named `chain_name` wins
/// and later ones are ignored for matching.
pub fn resolve(tree: &DocumentTree, chain: &str, before: Option<&str>) -> Resolution {
    let mut resolution = Resolution::default();

    for &child in tree.children(tree.root()) {
        match tree.kind(child) {
            NodeKind::Chain => {
                resolution.has_any_chain = true;
                let name = chain_name(tree, child);
                if before == Some(name) && resolution.before_chain.is_none() {
                    resolution.before_chain = Some(child);
                }
                if name == chain && resolution.target_chain.is_none() {
                    resolution.target_chain = Some(child);
                }
                if name == DEFAULT_CHAIN && resolution.default_chain.is_none() {
                    resolution.default_chain = Some(child);
                }
            }
            NodeKind::Transformation => resolution.bare_transformations.push(child),
            _ => {}
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ConfigNode;

    fn chain(name: &str) -> ConfigNode {
        ConfigNode::new(NodeKind::Chain).with_attr("name", name)
    }

    fn transformation(kind: &str) -> ConfigNode {
        ConfigNode::new(NodeKind::Transformation).with_attr("type", kind)
    }

    #[test]
    fn test_resolve_empty_document() {
        let tree = DocumentTree::new();
        let resolution = resolve(&tree, "default", None);
        assert_eq!(resolution, Resolution::default());
    }

    #[test]
    fn test_resolve_target_and_before() {
        let tree = DocumentTree::from_node(
            ConfigNode::new(NodeKind::Root)
                .with_child(chain("first"))
                .with_child(chain("target"))
                .with_child(chain("target")),
        );
        let children = tree.children(tree.root()).to_vec();
        let resolution = resolve(&tree, "target", Some("first"));

        assert_eq!(resolution.target_chain, Some(children[1]));
        assert_eq!(resolution.before_chain, Some(children[0]));
        assert_eq!(resolution.default_chain, None);
        assert!(resolution.has_any_chain);
        assert!(!resolution.has_bare_transformations());
    }

    #[test]
    fn test_resolve_unnamed_chain_is_default() {
        let tree = DocumentTree::from_node(
            ConfigNode::new(NodeKind::Root).with_child(ConfigNode::new(NodeKind::Chain)),
        );
        let resolution = resolve(&tree, "default", None);
        assert_eq!(resolution.target_chain, Some(tree.children(tree.root())[0]));
        assert_eq!(resolution.default_chain, resolution.target_chain);
    }

    #[test]
    fn test_resolve_records_default_chain_for_named_request() {
        let tree = DocumentTree::from_node(
            ConfigNode::new(NodeKind::Root)
                .with_child(chain("mychain"))
                .with_child(chain("default"))
                .with_child(transformation("a")),
        );
        let children = tree.children(tree.root()).to_vec();
        let resolution = resolve(&tree, "mychain", None);

        assert_eq!(resolution.target_chain, Some(children[0]));
        assert_eq!(resolution.default_chain, Some(children[1]));
        assert_eq!(resolution.bare_transformations, vec![children[2]]);
    }

    #[test]
    fn test_resolve_legacy_flat_format() {
        let tree = DocumentTree::from_node(
            ConfigNode::new(NodeKind::Root)
                .with_child(transformation("a"))
                .with_child(ConfigNode::new(NodeKind::Plugin))
                .with_child(transformation("b")),
        );
        let resolution = resolve(&tree, "mychain", Some("default"));

        assert_eq!(resolution.bare_transformations.len(), 2);
        assert!(!resolution.has_any_chain);
        assert!(resolution.target_chain.is_none());
        assert!(resolution.before_chain.is_none());
    }

    #[test]
    fn test_resolve_ignores_non_chain_names() {
        let tree = DocumentTree::from_node(
            ConfigNode::new(NodeKind::Root)
                .with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "default")),
        );
        let resolution = resolve(&tree, "default", None);
        assert!(resolution.target_chain.is_none());
        assert!(!resolution.has_any_chain);
    }
}
