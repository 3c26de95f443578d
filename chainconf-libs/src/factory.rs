//! Builds document sub-trees from chain entities.

use crate::config::{ChainConfig, ReaderConfig, TransformationConfig, WalkerConfig, WriterConfig};
use crate::document::{Attributes, ConfigNode, NodeKind};

/// Transformation node: `type`, optional `name`, then its parameters
pub fn transformation_node(cfg: &TransformationConfig) -> ConfigNode {
    let mut node = ConfigNode::new(NodeKind::Transformation);
    node.attributes = cfg.attributes.clone();
    node.attributes
        .insert("type".to_string(), cfg.transformation_type.clone());
    if let Some(name) = &cfg.name {
        node.attributes.insert("name".to_string(), name.clone());
    }
    node
}

/// Chain node with reader, walker and writer, in that order.
///
/// The walker always carries a transformations list, even an empty one, so
/// that later insertions land inside it.
pub fn chain_node(cfg: &ChainConfig) -> ConfigNode {
    let mut node = ConfigNode::new(NodeKind::Chain).with_attr("name", cfg.name.as_str());
    if let Some(reader) = &cfg.reader {
        node = node.with_child(reader_node(reader));
    }
    node = node.with_child(walker_node(&cfg.walker));
    if let Some(writer) = &cfg.writer {
        node = node.with_child(writer_node(writer));
    }
    node
}

fn reader_node(cfg: &ReaderConfig) -> ConfigNode {
    stage_node(NodeKind::Reader, cfg.reader_type.as_deref(), cfg.path.as_deref(), &cfg.attributes)
}

fn writer_node(cfg: &WriterConfig) -> ConfigNode {
    stage_node(NodeKind::Writer, cfg.writer_type.as_deref(), cfg.path.as_deref(), &cfg.attributes)
}

fn walker_node(cfg: &WalkerConfig) -> ConfigNode {
    let list = cfg
        .transformations
        .iter()
        .fold(ConfigNode::new(NodeKind::TransformationsList), |list, t| {
            list.with_child(transformation_node(t))
        });
    let mut node = stage_node(NodeKind::Walker, cfg.walker_type.as_deref(), None, &cfg.attributes);
    node.children.push(list);
    node
}

fn stage_node(kind: NodeKind, stage_type: Option<&str>, path: Option<&str>, attributes: &Attributes) -> ConfigNode {
    let mut node = ConfigNode::new(kind);
    node.attributes = attributes.clone();
    if let Some(stage_type) = stage_type {
        node.attributes.insert("type".to_string(), stage_type.to_string());
    }
    if let Some(path) = path {
        node.attributes.insert("path".to_string(), path.to_string());
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::SettingsDefaults;
    use crate::document::DocumentTree;

    #[test]
    fn test_transformation_node() {
        let cfg = TransformationConfig::new("imports-cleaner")
            .with_name("cleaner")
            .with_param("keepStatic", "true");
        let node = transformation_node(&cfg);

        assert_eq!(node.kind, NodeKind::Transformation);
        assert_eq!(node.attr("type"), Some("imports-cleaner"));
        assert_eq!(node.attr("name"), Some("cleaner"));
        assert_eq!(node.attr("keepStatic"), Some("true"));
    }

    #[test]
    fn test_chain_node_layout() {
        let cfg = ChainConfig::with_defaults(
            "mychain",
            &SettingsDefaults::default(),
            vec![TransformationConfig::new("a"), TransformationConfig::new("b")],
        );
        let node = chain_node(&cfg);

        let kinds: Vec<_> = node.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Reader, NodeKind::Walker, NodeKind::Writer]);
        assert_eq!(node.attr("name"), Some("mychain"));

        let list = &node.children[1].children[0];
        assert_eq!(list.kind, NodeKind::TransformationsList);
        assert_eq!(list.children.len(), 2);
    }

    #[test]
    fn test_chain_node_reads_back_identically() {
        let mut cfg = ChainConfig::with_defaults(
            "mychain",
            &SettingsDefaults::default(),
            vec![TransformationConfig::new("a").with_param("x", "1")],
        );
        cfg.set_path("src");

        let tree = DocumentTree::from_node(chain_node(&cfg));
        assert_eq!(ChainConfig::from_node(&tree, tree.root()), cfg);
    }
}
