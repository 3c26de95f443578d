//! # chainconf Libraries
//!
//! Core library for editing chain configuration documents. A document holds
//! named chains, each made of a reader, a walker with an ordered list of
//! transformations, and a writer. This crate places new transformations in
//! such documents, creating chains and migrating legacy flat documents as
//! needed.
//!
//! ## Main Components
//!
//! - `DocumentTree` / `ConfigNode`: the in-memory document
//! - Chain entities and provider settings (`config`)
//! - `resolve`, `insert_into`, `migrate_flat_to_chain`: the placement steps
//! - `AddTransformation`: the add-transformation operation
//! - `ActionExecutor`: load / apply / persist, optionally across sub-modules
//! - `YamlConfigurationProvider`: documents stored as YAML files
//! - `ConfError`: standardized error handling

pub mod action;
pub mod add_transformation;
pub mod config;
pub mod defaults;
pub mod document;
pub mod error;
pub mod factory;
pub mod migration;
pub mod planner;
pub mod provider;
pub mod resolver;

// Re-export main types for convenience
pub use action::{ActionExecutor, ConfigurationAction, DocumentReport};
pub use add_transformation::{AddTransformation, Placement};
pub use config::{
    load_chain_model, load_settings, ChainConfig, ProviderSettings, ReaderConfig,
    TransformationConfig, WalkerConfig, WriterConfig, DEFAULT_CHAIN,
};
pub use defaults::{DefaultsProvider, SettingsDefaults};
pub use document::{ConfigNode, DocumentTree, NodeId, NodeKind};
pub use error::ConfError;
pub use provider::{ConfigurationProvider, YamlConfigurationProvider};

/// Result type alias using ConfError
pub type Result<T> = std::result::Result<T, ConfError>;
