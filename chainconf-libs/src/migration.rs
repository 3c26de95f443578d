//! Migration from the legacy flat format to a single default chain.

use crate::config::{ChainConfig, DEFAULT_CHAIN, TransformationConfig};
use crate::defaults::DefaultsProvider;
use crate::document::{DocumentTree, NodeId};
use crate::factory;
use crate::planner::insert_into;
use tracing::info;

/// Move the bare root transformations `bare` into a new default chain.
///
/// The chain gets the default reader, writer and walker; its transformation
/// list holds exactly the bare transformations, in the order given. Every
/// node in `bare` is detached from the root. The returned chain is detached:
/// placing it is up to the caller.
pub fn migrate_flat_to_chain(tree: &mut DocumentTree, bare: &[NodeId], defaults: &dyn DefaultsProvider) -> NodeId {
    let transformations: Vec<TransformationConfig> = bare
        .iter()
        .map(|t| TransformationConfig::from_node(tree, *t))
        .collect();
    for t in bare {
        tree.detach(*t);
    }

    info!(
        "Migrating {} bare transformation(s) into the '{}' chain",
        transformations.len(),
        DEFAULT_CHAIN
    );
    let chain = ChainConfig::with_defaults(DEFAULT_CHAIN, defaults, transformations);
    tree.create(factory::chain_node(&chain))
}

/// Move the bare root transformations `bare` to the end of the existing
/// chain `chain`, in the order given.
pub fn fold_into_chain(tree: &mut DocumentTree, chain: NodeId, bare: &[NodeId]) {
    info!(
        "Moving {} bare transformation(s) into the existing '{}' chain",
        bare.len(),
        DEFAULT_CHAIN
    );
    for t in bare {
        insert_into(tree, chain, *t, None);
    }
}
