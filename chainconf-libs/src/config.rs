//! Configuration structures for chainconf.
//!
//! Two groups of types live here:
//!
//! - Chain entities (`ChainConfig`, `ReaderConfig`, `WalkerConfig`,
//!   `WriterConfig`, `TransformationConfig`). They mirror the document tree
//!   and are used when a sub-tree has to be synthesized instead of edited.
//! - `ProviderSettings`, the tool's own settings file (defaults applied when
//!   a chain is synthesized, document file name).

use crate::defaults::DefaultsProvider;
use crate::document::{Attributes, DocumentTree, NodeId, NodeKind};
use crate::error::ConfError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the chain used when none is given.
pub const DEFAULT_CHAIN: &str = "default";

/// A single transformation declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformationConfig {
    /// Transformation type identifier (e.g. "imports-cleaner")
    #[serde(rename = "type")]
    pub transformation_type: String,

    /// Optional instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Transformation parameters
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl TransformationConfig {
    pub fn new(transformation_type: impl Into<String>) -> Self {
        Self {
            transformation_type: transformation_type.into(),
            name: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Read a transformation back from a Transformation node
    pub fn from_node(tree: &DocumentTree, id: NodeId) -> Self {
        let mut attributes = tree.attributes(id).clone();
        let transformation_type = attributes.remove("type").unwrap_or_default();
        let name = attributes.remove("name");
        Self {
            transformation_type,
            name,
            attributes,
        }
    }
}

/// Source stage of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub reader_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl ReaderConfig {
    pub fn from_node(tree: &DocumentTree, id: NodeId) -> Self {
        let (reader_type, path, attributes) = split_stage_attributes(tree, id);
        Self {
            reader_type,
            path,
            attributes,
        }
    }
}

/// Sink stage of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriterConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub writer_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl WriterConfig {
    pub fn from_node(tree: &DocumentTree, id: NodeId) -> Self {
        let (writer_type, path, attributes) = split_stage_attributes(tree, id);
        Self {
            writer_type,
            path,
            attributes,
        }
    }
}

/// Walker stage: owns the ordered transformation list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalkerConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub walker_type: Option<String>,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    /// Transformations in execution order
    #[serde(default)]
    pub transformations: Vec<TransformationConfig>,
}

impl WalkerConfig {
    /// Read a Walker node. The transformation list comes from its
    /// TransformationsList child, if any.
    pub fn from_node(tree: &DocumentTree, id: NodeId) -> Self {
        let mut attributes = tree.attributes(id).clone();
        let walker_type = attributes.remove("type");
        let transformations = tree
            .first_child_of_kind(id, NodeKind::TransformationsList)
            .map(|list| transformations_under(tree, list))
            .unwrap_or_default();
        Self {
            walker_type,
            attributes,
            transformations,
        }
    }
}

/// A named pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader: Option<ReaderConfig>,

    #[serde(default)]
    pub walker: WalkerConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<WriterConfig>,
}

impl ChainConfig {
    /// Empty chain with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reader: None,
            walker: WalkerConfig::default(),
            writer: None,
        }
    }

    /// Chain built from the defaults, holding `transformations`
    pub fn with_defaults(
        name: impl Into<String>,
        defaults: &dyn DefaultsProvider,
        transformations: Vec<TransformationConfig>,
    ) -> Self {
        let mut walker = defaults.default_walker_config();
        walker.transformations = transformations;
        Self {
            name: name.into(),
            reader: Some(defaults.default_reader_config()),
            walker,
            writer: Some(defaults.default_writer_config()),
        }
    }

    /// Point both reader and writer at `path`
    pub fn set_path(&mut self, path: &str) {
        self.reader.get_or_insert_with(ReaderConfig::default).path = Some(path.to_string());
        self.writer.get_or_insert_with(WriterConfig::default).path = Some(path.to_string());
    }

    /// Insert `transformation` at `order` when it lands inside the list,
    /// append otherwise
    pub fn insert_transformation(&mut self, transformation: TransformationConfig, order: Option<usize>) {
        let transformations = &mut self.walker.transformations;
        match order {
            Some(index) if index < transformations.len() => transformations.insert(index, transformation),
            _ => transformations.push(transformation),
        }
    }

    /// Read a Chain node.
    ///
    /// Walker-less chains keep their transformations as direct children;
    /// those are collected into the walker config.
    pub fn from_node(tree: &DocumentTree, id: NodeId) -> Self {
        let walker = match tree.first_child_of_kind(id, NodeKind::Walker) {
            Some(walker) => WalkerConfig::from_node(tree, walker),
            None => WalkerConfig {
                transformations: transformations_under(tree, id),
                ..WalkerConfig::default()
            },
        };
        Self {
            name: chain_name(tree, id).to_string(),
            reader: tree
                .first_child_of_kind(id, NodeKind::Reader)
                .map(|r| ReaderConfig::from_node(tree, r)),
            walker,
            writer: tree
                .first_child_of_kind(id, NodeKind::Writer)
                .map(|w| WriterConfig::from_node(tree, w)),
        }
    }
}

/// Name of a Chain node; a missing or empty name means the default chain
pub fn chain_name(tree: &DocumentTree, id: NodeId) -> &str {
    match tree.attr(id, "name") {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_CHAIN,
    }
}

fn transformations_under(tree: &DocumentTree, parent: NodeId) -> Vec<TransformationConfig> {
    tree.children_of_kind(parent, NodeKind::Transformation)
        .into_iter()
        .map(|t| TransformationConfig::from_node(tree, t))
        .collect()
}

fn split_stage_attributes(
    tree: &DocumentTree,
    id: NodeId,
) -> (Option<String>, Option<String>, Attributes) {
    let mut attributes = tree.attributes(id).clone();
    let stage_type = attributes.remove("type");
    let path = attributes.remove("path");
    (stage_type, path, attributes)
}

/// Build the structured chain model of a document.
///
/// One `ChainConfig` per Chain child of the root, in document order. A
/// document in the legacy flat format (no chains, bare transformations under
/// the root) yields a single default chain holding those transformations.
pub fn load_chain_model(tree: &DocumentTree, defaults: &dyn DefaultsProvider) -> Vec<ChainConfig> {
    let root = tree.root();
    let chains: Vec<ChainConfig> = tree
        .children_of_kind(root, NodeKind::Chain)
        .into_iter()
        .map(|c| ChainConfig::from_node(tree, c))
        .collect();
    if !chains.is_empty() {
        return chains;
    }

    let bare = transformations_under(tree, root);
    if bare.is_empty() {
        return Vec::new();
    }
    vec![ChainConfig::with_defaults(DEFAULT_CHAIN, defaults, bare)]
}

/// Settings of the configuration provider.
///
/// # Example YAML
///
/// ```yaml
/// default_reader_type: "walkmod:commons:file-reader"
/// default_writer_type: "walkmod:commons:file-writer"
/// default_path: "src/main/java"
/// document_file_name: "chainconf.yml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Reader type written into synthesized chains (omitted when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_reader_type: Option<String>,

    /// Writer type written into synthesized chains (omitted when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_writer_type: Option<String>,

    /// Walker type written into synthesized chains (omitted when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_walker_type: Option<String>,

    /// Path read and written by synthesized chains
    #[serde(default = "default_path")]
    pub default_path: String,

    /// File name of a configuration document inside a module directory
    #[serde(default = "default_document_file_name")]
    pub document_file_name: String,
}

fn default_path() -> String {
    "src/main/java".to_string()
}

fn default_document_file_name() -> String {
    "chainconf.yml".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            default_reader_type: None,
            default_writer_type: None,
            default_walker_type: None,
            default_path: default_path(),
            document_file_name: default_document_file_name(),
        }
    }
}

/// Load and validate provider settings from a YAML file.
///
/// # Returns
///
/// * `Ok(ProviderSettings)` - Successfully parsed settings
/// * `Err(ConfError)` - Failed to read file, parse YAML or validate
pub fn load_settings<P: AsRef<Path>>(settings_path: P) -> Result<ProviderSettings, ConfError> {
    let path = settings_path.as_ref();

    let contents = fs::read_to_string(path).map_err(|e| {
        ConfError::ConfigError(format!("Failed to read settings file at {:?}: {}", path, e))
    })?;

    let settings: ProviderSettings = serde_yaml::from_str(&contents).map_err(|e| {
        ConfError::ConfigError(format!("Failed to parse settings YAML at {:?}: {}", path, e))
    })?;

    if settings.default_path.trim().is_empty() {
        return Err(ConfError::ConfigError(
            "default_path cannot be empty".to_string(),
        ));
    }

    if settings.document_file_name.trim().is_empty() {
        return Err(ConfError::ConfigError(
            "document_file_name cannot be empty".to_string(),
        ));
    }

    Ok(settings)
}
