//! Loading and persisting configuration documents.
//!
//! [`ConfigurationProvider`] is the boundary between the in-memory editing
//! code and storage. [`YamlConfigurationProvider`] stores a document as a
//! YAML file on disk.

use crate::config::ProviderSettings;
use crate::defaults::{DefaultsProvider, SettingsDefaults};
use crate::document::{ConfigNode, DocumentTree, NodeKind};
use crate::error::ConfError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage of one configuration document.
pub trait ConfigurationProvider {
    /// Where the document lives (used in logs and error reports)
    fn location(&self) -> &Path;

    /// Parse the stored document
    fn load_document(&self) -> Result<DocumentTree, ConfError>;

    /// Write `tree` back. Either the whole document is written or an error
    /// is returned.
    fn persist(&self, tree: &DocumentTree) -> Result<(), ConfError>;

    /// Defaults for chains synthesized in this document
    fn defaults(&self) -> &dyn DefaultsProvider;

    /// Provider for the document of the sub-module `module`. A missing
    /// document loads as empty and is written on the first persist.
    fn for_module(&self, module: &str) -> Result<Box<dyn ConfigurationProvider>, ConfError>;
}

/// Provider backed by a YAML file.
#[derive(Debug, Clone)]
pub struct YamlConfigurationProvider {
    /// Path of the document file
    path: PathBuf,
    /// Defaults built from the provider settings
    defaults: SettingsDefaults,
    /// Load a missing document as empty instead of failing
    create_if_missing: bool,
}

impl YamlConfigurationProvider {
    /// Create a provider for the document at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Document file (need not exist yet)
    /// * `settings` - Provider settings, inherited by module providers
    pub fn new(path: impl Into<PathBuf>, settings: ProviderSettings) -> Self {
        Self {
            path: path.into(),
            defaults: SettingsDefaults::new(settings),
            create_if_missing: false,
        }
    }

    /// Treat a missing document as empty; the file (and its directory) is
    /// created by the first persist
    pub fn create_if_missing(mut self) -> Self {
        self.create_if_missing = true;
        self
    }

    pub fn settings(&self) -> &ProviderSettings {
        self.defaults.settings()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write an empty document, creating parent directories as needed
    pub fn create_config(&self) -> Result<(), ConfError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        info!("Creating empty configuration at {:?}", self.path);
        self.persist(&DocumentTree::new())
    }

    fn parse_error(&self, message: impl Into<String>) -> ConfError {
        ConfError::Parse {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn persist_error(&self, source: std::io::Error) -> ConfError {
        ConfError::Persist {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigurationProvider for YamlConfigurationProvider {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> Result<DocumentTree, ConfError> {
        if !self.exists() {
            if self.create_if_missing {
                debug!("No document at {:?}, starting from an empty one", self.path);
                return Ok(DocumentTree::new());
            }
            return Err(ConfError::NotFound(self.path.clone()));
        }

        debug!("Loading configuration from {:?}", self.path);
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(DocumentTree::new());
        }

        let node: ConfigNode = serde_yaml::from_str(&contents).map_err(|e| self.parse_error(e.to_string()))?;
        if node.kind != NodeKind::Root {
            return Err(self.parse_error(format!(
                "top-level node must be '{}', found '{}'",
                NodeKind::Root.as_str(),
                node.kind.as_str()
            )));
        }

        Ok(DocumentTree::from_node(node))
    }

    fn persist(&self, tree: &DocumentTree) -> Result<(), ConfError> {
        let yaml = serde_yaml::to_string(&tree.to_node())?;

        if self.create_if_missing {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| self.persist_error(e))?;
                }
            }
        }

        // Write next to the target, then rename over it
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chainconf.yml".to_string());
        let temp_path = self.path.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&temp_path, yaml).map_err(|e| self.persist_error(e))?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.persist_error(e));
        }

        info!("Configuration saved to {:?}", self.path);
        Ok(())
    }

    fn defaults(&self) -> &dyn DefaultsProvider {
        &self.defaults
    }

    fn for_module(&self, module: &str) -> Result<Box<dyn ConfigurationProvider>, ConfError> {
        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        let module_path = base
            .join(module)
            .join(&self.settings().document_file_name);

        Ok(Box::new(Self::new(module_path, self.settings().clone()).create_if_missing()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider(temp_dir: &TempDir) -> YamlConfigurationProvider {
        YamlConfigurationProvider::new(temp_dir.path().join("chainconf.yml"), ProviderSettings::default())
    }

    #[test]
    fn test_create_and_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let provider = provider(&temp_dir);

        assert!(!provider.exists());
        provider.create_config().unwrap();
        assert!(provider.exists());

        let tree = provider.load_document().unwrap();
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let provider = provider(&temp_dir);
        let node = ConfigNode::new(NodeKind::Root).with_child(
            ConfigNode::new(NodeKind::Chain)
                .with_attr("name", "default")
                .with_child(ConfigNode::new(NodeKind::Reader).with_attr("path", "src")),
        );

        provider.persist(&DocumentTree::from_node(node.clone())).unwrap();
        assert_eq!(provider.load_document().unwrap().to_node(), node);

        // no temp file left behind
        let entries = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_load_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let result = provider(&temp_dir).load_document();
        assert!(matches!(result, Err(ConfError::NotFound(_))));
    }

    #[test]
    fn test_load_malformed_document() {
        let temp_dir = TempDir::new().unwrap();
        let provider = provider(&temp_dir);
        fs::write(provider.location(), "kind: chainz\n").unwrap();

        let result = provider.load_document();
        assert!(matches!(result, Err(ConfError::Parse { .. })));
    }

    #[test]
    fn test_load_rejects_non_root_top_level() {
        let temp_dir = TempDir::new().unwrap();
        let provider = provider(&temp_dir);
        fs::write(provider.location(), "kind: chain\n").unwrap();

        match provider.load_document() {
            Err(ConfError::Parse { message, .. }) => assert!(message.contains("root")),
            other => panic!("unexpected result: {:?}", other.map(|t| t.to_node())),
        }
    }

    #[test]
    fn test_persist_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let provider = YamlConfigurationProvider::new(
            temp_dir.path().join("missing").join("chainconf.yml"),
            ProviderSettings::default(),
        );
        let result = provider.persist(&DocumentTree::new());
        assert!(matches!(result, Err(ConfError::Persist { .. })));
    }

    #[test]
    fn test_for_module_defers_creation_to_persist() {
        let temp_dir = TempDir::new().unwrap();
        let provider = provider(&temp_dir);

        let module = provider.for_module("module1").unwrap();
        assert_eq!(module.location(), temp_dir.path().join("module1").join("chainconf.yml"));
        assert!(!temp_dir.path().join("module1").exists());

        let tree = module.load_document().unwrap();
        assert!(tree.children(tree.root()).is_empty());
        assert!(!module.location().exists());

        module.persist(&tree).unwrap();
        assert!(module.location().is_file());
    }

    #[test]
    fn test_create_if_missing_loads_existing_document() {
        let temp_dir = TempDir::new().unwrap();
        let node = ConfigNode::new(NodeKind::Root).with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "m"));
        provider(&temp_dir).persist(&DocumentTree::from_node(node.clone())).unwrap();

        let lenient = provider(&temp_dir).create_if_missing();
        assert_eq!(lenient.load_document().unwrap().to_node(), node);
    }
}
