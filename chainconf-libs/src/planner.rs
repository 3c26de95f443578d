//! Placement of a transformation inside an existing chain.

use crate::document::{ConfigNode, DocumentTree, NodeId, NodeKind};
use tracing::debug;

/// Where [`insert_into`] put the transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Inside the walker's transformation list, at this index
    WalkerList(usize),
    /// Right before the chain's writer
    BeforeWriter,
    /// As the chain's last child
    ChainEnd,
}

/// Insert `transformation` (a detached node) into `chain`.
///
/// Rules, first applicable wins:
/// 1. the chain has a walker: go into its transformation list (created when
///    missing). `order = k` with `k < len` inserts at `k` and shifts later
///    entries; any other order appends.
/// 2. the chain has a writer: insert right before it, transformations run
///    before writing.
/// 3. append to the chain.
pub fn insert_into(tree: &mut DocumentTree, chain: NodeId, transformation: NodeId, order: Option<usize>) -> Slot {
    if let Some(walker) = tree.first_child_of_kind(chain, NodeKind::Walker) {
        let list = match tree.first_child_of_kind(walker, NodeKind::TransformationsList) {
            Some(list) => list,
            None => {
                let list = tree.create(ConfigNode::new(NodeKind::TransformationsList));
                tree.append_child(walker, list);
                list
            }
        };
        let len = tree.children(list).len();
        let index = match order {
            Some(k) if k < len => k,
            _ => len,
        };
        tree.insert_child(list, index, transformation);
        debug!("Inserted transformation at walker position {}", index);
        return Slot::WalkerList(index);
    }

    if let Some(writer) = tree.first_child_of_kind(chain, NodeKind::Writer) {
        tree.insert_before(chain, transformation, writer);
        debug!("Inserted transformation before writer");
        return Slot::BeforeWriter;
    }

    tree.append_child(chain, transformation);
    debug!("Appended transformation to chain");
    Slot::ChainEnd
}
