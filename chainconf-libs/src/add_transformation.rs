//! The `add transformation` operation.
//!
//! Decides where a new transformation goes, based on the shape of the
//! document ([`resolve`]) and the request:
//!
//! | request chain | document shape                       | placement |
//! |---------------|--------------------------------------|-----------|
//! | named         | chain exists                         | [`Placement::ExistingChain`] |
//! | named         | chain missing                        | [`Placement::NewChain`] |
//! | default       | default chain exists                 | [`Placement::DefaultChain`] |
//! | default       | other chains only                    | [`Placement::NewDefaultChain`] |
//! | default       | no chains, bare transformations      | [`Placement::BareRoot`] |
//! | default       | no chains, nothing to migrate        | [`Placement::NewDefaultChain`] |
//! | default + path| no chains                            | [`Placement::Normalized`] |
//!
//! Documents still in the legacy flat format are migrated to a default chain
//! whenever a named chain is involved. Bare transformations go into the
//! existing default chain when there is one, so a document never ends up
//! with two. Adding the same transformation twice yields two entries.

use crate::action::ConfigurationAction;
use crate::config::{ChainConfig, DEFAULT_CHAIN, TransformationConfig, load_chain_model};
use crate::defaults::DefaultsProvider;
use crate::document::{DocumentTree, NodeId, NodeKind};
use crate::error::ConfError;
use crate::factory;
use crate::migration::{fold_into_chain, migrate_flat_to_chain};
use crate::planner::{Slot, insert_into};
use crate::resolver::{Resolution, resolve};
use tracing::{debug, info};

/// Request to add a transformation to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTransformation {
    /// Target chain; blank means the default chain
    pub chain: Option<String>,

    /// Directory the chain reads from and writes to
    pub path: Option<String>,

    /// The transformation to add
    pub transformation: TransformationConfig,

    /// Position inside the chain's transformation list
    pub order: Option<usize>,

    /// Name of the chain a newly created chain must precede
    pub before: Option<String>,
}

/// Where a transformation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Added to an existing named chain; `migrated` when legacy bare
    /// transformations were moved into a default chain on the way
    ExistingChain {
        chain: String,
        slot: Slot,
        migrated: bool,
    },

    /// A new named chain was created around the transformation
    NewChain { chain: String, migrated: bool },

    /// Added to the existing default chain. `None` when that chain was empty
    /// and left untouched.
    DefaultChain { slot: Option<Slot> },

    /// A new default chain was created around the transformation
    NewDefaultChain,

    /// Appended under the root, the document stays in the flat format
    BareRoot,

    /// The document was rewritten into a single default chain carrying the
    /// requested path; `from_model` when an existing (flat) chain model was
    /// carried over
    Normalized { from_model: bool },
}

impl AddTransformation {
    pub fn new(transformation: TransformationConfig) -> Self {
        Self {
            chain: None,
            path: None,
            transformation,
            order: None,
            before: None,
        }
    }

    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }

    /// Requested chain, blank mapped to the default chain
    pub fn chain_name(&self) -> &str {
        match self.chain.as_deref() {
            Some(chain) if !chain.trim().is_empty() => chain,
            _ => DEFAULT_CHAIN,
        }
    }

    /// Requested path, trimmed; blank means none
    pub fn normalized_path(&self) -> Option<&str> {
        self.path.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    fn transformation_node(&self, tree: &mut DocumentTree) -> NodeId {
        tree.create(factory::transformation_node(&self.transformation))
    }

    fn synthesize_chain(&self, name: &str, defaults: &dyn DefaultsProvider) -> ChainConfig {
        let mut cfg = ChainConfig::with_defaults(name, defaults, vec![self.transformation.clone()]);
        if let Some(path) = self.normalized_path() {
            cfg.set_path(path);
        }
        cfg
    }

    /// Move the bare transformations of `resolution` into the default chain.
    ///
    /// Returns the new detached default chain when the document had none;
    /// otherwise they are appended to the existing one in place.
    fn migrate_bare(
        &self,
        tree: &mut DocumentTree,
        resolution: &Resolution,
        defaults: &dyn DefaultsProvider,
    ) -> Option<NodeId> {
        match resolution.default_chain {
            Some(existing) => {
                fold_into_chain(tree, existing, &resolution.bare_transformations);
                None
            }
            None => Some(migrate_flat_to_chain(tree, &resolution.bare_transformations, defaults)),
        }
    }

    fn add_to_named_chain(
        &self,
        tree: &mut DocumentTree,
        target: NodeId,
        resolution: &Resolution,
        defaults: &dyn DefaultsProvider,
    ) -> Placement {
        let node = self.transformation_node(tree);
        let slot = insert_into(tree, target, node, self.order);

        let migrated = resolution.has_bare_transformations();
        if migrated {
            if let Some(default_chain) = self.migrate_bare(tree, resolution, defaults) {
                let root = tree.root();
                tree.append_child(root, default_chain);
            }
        }

        Placement::ExistingChain {
            chain: self.chain_name().to_string(),
            slot,
            migrated,
        }
    }

    fn add_new_named_chain(
        &self,
        tree: &mut DocumentTree,
        resolution: &Resolution,
        defaults: &dyn DefaultsProvider,
    ) -> Placement {
        let name = self.chain_name();
        let migrated = resolution.has_bare_transformations();
        let migrated_default = if migrated {
            self.migrate_bare(tree, resolution, defaults)
        } else {
            None
        };
        let cfg = self.synthesize_chain(name, defaults);
        let new_chain = tree.create(factory::chain_node(&cfg));
        let root = tree.root();

        match resolution.before_chain {
            Some(before) => {
                debug!("Placing chain '{}' before an existing chain", name);
                tree.insert_before(root, new_chain, before);
                if let Some(default_chain) = migrated_default {
                    tree.append_child(root, default_chain);
                }
            }
            None => {
                // Without a hint the migrated chain keeps running first;
                // any hint that matched nothing pushes it after the new one.
                let default_first = self.before.is_none();
                if let Some(default_chain) = migrated_default.filter(|_| default_first) {
                    tree.append_child(root, default_chain);
                }
                tree.append_child(root, new_chain);
                if let Some(default_chain) = migrated_default.filter(|_| !default_first) {
                    tree.append_child(root, default_chain);
                }
            }
        }

        Placement::NewChain {
            chain: name.to_string(),
            migrated,
        }
    }

    fn add_to_default_chain(&self, tree: &mut DocumentTree, target: NodeId) -> Result<Placement, ConfError> {
        if let Some(path) = self.normalized_path() {
            if let Some(reader) = tree.first_child_of_kind(target, NodeKind::Reader) {
                let existing = tree.attr(reader, "path").unwrap_or_default();
                if existing != path {
                    return Err(ConfError::PathMismatch {
                        transformation_type: self.transformation.transformation_type.clone(),
                        expected: existing.to_string(),
                        found: path.to_string(),
                    });
                }
            }
        }

        if tree.children(target).is_empty() {
            debug!("Default chain is empty, leaving it untouched");
            return Ok(Placement::DefaultChain { slot: None });
        }

        let node = self.transformation_node(tree);
        let slot = insert_into(tree, target, node, self.order);
        Ok(Placement::DefaultChain { slot: Some(slot) })
    }

    fn add_new_default_chain(&self, tree: &mut DocumentTree, defaults: &dyn DefaultsProvider) -> Placement {
        let cfg = self.synthesize_chain(DEFAULT_CHAIN, defaults);
        let chain = tree.create(factory::chain_node(&cfg));
        let root = tree.root();
        tree.append_child(root, chain);
        Placement::NewDefaultChain
    }

    fn add_bare(&self, tree: &mut DocumentTree) -> Placement {
        let node = self.transformation_node(tree);
        let root = tree.root();
        tree.append_child(root, node);
        Placement::BareRoot
    }

    /// Rewrite a chain-less document into one default chain reading `path`.
    ///
    /// Bare transformations are folded into that chain; modules, providers
    /// and plugins stay where they are.
    fn normalize(
        &self,
        tree: &mut DocumentTree,
        resolution: &Resolution,
        path: &str,
        defaults: &dyn DefaultsProvider,
    ) -> Placement {
        let model = load_chain_model(tree, defaults);
        let from_model = !model.is_empty();
        let cfg = match model.into_iter().next() {
            Some(mut cfg) => {
                cfg.set_path(path);
                cfg.insert_transformation(self.transformation.clone(), self.order);
                cfg
            }
            None => self.synthesize_chain(DEFAULT_CHAIN, defaults),
        };

        for bare in &resolution.bare_transformations {
            tree.detach(*bare);
        }
        let chain = tree.create(factory::chain_node(&cfg));
        let root = tree.root();
        tree.append_child(root, chain);
        Placement::Normalized { from_model }
    }
}

impl ConfigurationAction for AddTransformation {
    type Outcome = Placement;

    fn subject(&self) -> &str {
        &self.transformation.transformation_type
    }

    fn validate(&self) -> Result<(), ConfError> {
        if self.transformation.transformation_type.trim().is_empty() {
            return Err(ConfError::ConfigError(
                "transformation type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(&self, tree: &mut DocumentTree, defaults: &dyn DefaultsProvider) -> Result<Placement, ConfError> {
        let chain = self.chain_name();
        let resolution = resolve(tree, chain, self.before.as_deref());
        debug!(
            "Resolved chain '{}': found={}, before={}, bare={}, chains={}",
            chain,
            resolution.target_chain.is_some(),
            resolution.before_chain.is_some(),
            resolution.bare_transformations.len(),
            resolution.has_any_chain
        );

        let placement = if chain != DEFAULT_CHAIN {
            match resolution.target_chain {
                Some(target) => self.add_to_named_chain(tree, target, &resolution, defaults),
                None => self.add_new_named_chain(tree, &resolution, defaults),
            }
        } else if let Some(target) = resolution.target_chain {
            self.add_to_default_chain(tree, target)?
        } else if resolution.has_any_chain {
            self.add_new_default_chain(tree, defaults)
        } else if let Some(path) = self.normalized_path() {
            self.normalize(tree, &resolution, path, defaults)
        } else if resolution.has_bare_transformations() {
            self.add_bare(tree)
        } else {
            self.add_new_default_chain(tree, defaults)
        };

        info!(
            "Added transformation '{}': {:?}",
            self.transformation.transformation_type, placement
        );
        Ok(placement)
    }
}
