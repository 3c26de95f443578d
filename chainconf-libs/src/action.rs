//! Configuration actions and their execution.
//!
//! An action edits one document in memory. The [`ActionExecutor`] owns the
//! rest of the lifecycle: load the document, optionally fan out to the
//! documents of its sub-modules, apply the action and persist exactly once.

use crate::defaults::DefaultsProvider;
use crate::document::{DocumentTree, NodeKind};
use crate::error::ConfError;
use crate::provider::ConfigurationProvider;
use std::collections::HashSet;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Core trait of every document edit.
///
/// Editing happens in two phases:
/// 1. **Validation** (`validate`): checks the request itself, before any
///    document is loaded
/// 2. **Application** (`apply`): mutates the in-memory document
///
/// `apply` must not leave a half-edited tree behind when it fails: the
/// executor drops the tree without persisting it, but implementations are
/// expected to run their checks before the first mutation.
pub trait ConfigurationAction {
    /// What `apply` reports back
    type Outcome: Debug;

    /// Label used in logs and error reports
    fn subject(&self) -> &str;

    /// Validates the request before any document is touched
    fn validate(&self) -> Result<(), ConfError> {
        Ok(())
    }

    /// Applies the action to one document
    fn apply(&self, tree: &mut DocumentTree, defaults: &dyn DefaultsProvider) -> Result<Self::Outcome, ConfError>;
}

/// Result of applying an action to one document
#[derive(Debug, Clone)]
pub struct DocumentReport<O> {
    /// Location of the edited document
    pub path: PathBuf,

    /// What the action did there
    pub outcome: O,
}

/// Runs actions against a provider, one document at a time.
///
/// In recursive mode a document that declares modules is not edited itself;
/// the action runs against each module's document instead (and recursively
/// against theirs). Every document is edited at most once: a module that
/// leads back to a document already visited is reported as a cycle. The
/// first failure aborts the run. Documents persisted before the failure keep
/// their changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionExecutor {
    recursive: bool,
}

impl ActionExecutor {
    pub fn new(recursive: bool) -> Self {
        Self { recursive }
    }

    /// Execute `action` starting at `provider`'s document
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<DocumentReport>)` - One report per edited document, in
    ///   processing order
    /// * `Err(ConfError)` - The first failure, tagged with the document path
    ///   and the action subject
    pub fn execute<A: ConfigurationAction>(
        &self,
        provider: &dyn ConfigurationProvider,
        action: &A,
    ) -> Result<Vec<DocumentReport<A::Outcome>>, ConfError> {
        action
            .validate()
            .map_err(|e| e.in_document(provider.location(), action.subject()))?;

        let mut reports = Vec::new();
        let mut visited = HashSet::new();
        self.execute_into(provider, action, &mut reports, &mut visited)?;
        Ok(reports)
    }

    fn execute_into<A: ConfigurationAction>(
        &self,
        provider: &dyn ConfigurationProvider,
        action: &A,
        reports: &mut Vec<DocumentReport<A::Outcome>>,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<(), ConfError> {
        let location = provider.location().to_path_buf();
        if !visited.insert(document_key(&location)) {
            return Err(ConfError::ConfigError(format!("module cycle: {:?} is reached more than once", location))
                .in_document(&location, action.subject()));
        }

        let mut tree = provider
            .load_document()
            .map_err(|e| e.in_document(&location, action.subject()))?;

        if self.recursive {
            let modules = module_names(&tree);
            if !modules.is_empty() {
                info!(
                    "Applying '{}' to {} module(s) of {:?}",
                    action.subject(),
                    modules.len(),
                    location
                );
                for module in modules {
                    let module_provider = provider
                        .for_module(&module)
                        .map_err(|e| e.in_document(&location, action.subject()))?;
                    if let Err(e) = self.execute_into(module_provider.as_ref(), action, reports, visited) {
                        if !reports.is_empty() {
                            warn!(
                                "{} document(s) were already updated and keep their changes",
                                reports.len()
                            );
                        }
                        return Err(e);
                    }
                }
                return Ok(());
            }
        }

        let outcome = action
            .apply(&mut tree, provider.defaults())
            .map_err(|e| e.in_document(&location, action.subject()))?;
        provider
            .persist(&tree)
            .map_err(|e| e.in_document(&location, action.subject()))?;

        info!("Updated {:?}: {:?}", location, outcome);
        reports.push(DocumentReport {
            path: location,
            outcome,
        });
        Ok(())
    }
}

/// Identity of a document on disk; `a/./b` and `a/x/../b` name the same one
fn document_key(location: &Path) -> PathBuf {
    fs::canonicalize(location).unwrap_or_else(|_| location.to_path_buf())
}

/// Names of the modules declared at the top of a document, in order
pub fn module_names(tree: &DocumentTree) -> Vec<String> {
    tree.children_of_kind(tree.root(), NodeKind::Module)
        .into_iter()
        .filter_map(|m| tree.attr(m, "name"))
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::add_transformation::{AddTransformation, Placement};
    use crate::config::{ProviderSettings, TransformationConfig};
    use crate::defaults::SettingsDefaults;
    use crate::document::ConfigNode;
    use crate::provider::YamlConfigurationProvider;
    use std::cell::{Cell, RefCell};
    use tempfile::TempDir;

    /// Provider keeping its document in memory and counting persists
    struct MemoryProvider {
        location: PathBuf,
        document: RefCell<ConfigNode>,
        persists: Cell<usize>,
        defaults: SettingsDefaults,
    }

    impl MemoryProvider {
        fn new(document: ConfigNode) -> Self {
            Self {
                location: PathBuf::from("memory.yml"),
                document: RefCell::new(document),
                persists: Cell::new(0),
                defaults: SettingsDefaults::default(),
            }
        }
    }

    impl ConfigurationProvider for MemoryProvider {
        fn location(&self) -> &Path {
            &self.location
        }

        fn load_document(&self) -> Result<DocumentTree, ConfError> {
            Ok(DocumentTree::from_node(self.document.borrow().clone()))
        }

        fn persist(&self, tree: &DocumentTree) -> Result<(), ConfError> {
            self.persists.set(self.persists.get() + 1);
            *self.document.borrow_mut() = tree.to_node();
            Ok(())
        }

        fn defaults(&self) -> &dyn DefaultsProvider {
            &self.defaults
        }

        fn for_module(&self, module: &str) -> Result<Box<dyn ConfigurationProvider>, ConfError> {
            Err(ConfError::ConfigError(format!("no module {module} in memory")))
        }
    }

    fn add(kind: &str) -> AddTransformation {
        AddTransformation::new(TransformationConfig::new(kind))
    }

    fn contains_type(node: &ConfigNode, kind: &str) -> bool {
        node.attr("type") == Some(kind) || node.children.iter().any(|c| contains_type(c, kind))
    }

    #[test]
    fn test_execute_persists_once() {
        let provider = MemoryProvider::new(ConfigNode::new(NodeKind::Root));
        let reports = ActionExecutor::new(false)
            .execute(&provider, &add("imports-cleaner"))
            .unwrap();

        assert_eq!(provider.persists.get(), 1);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, Placement::NewDefaultChain);
        assert!(contains_type(&provider.document.borrow(), "imports-cleaner"));
    }

    #[test]
    fn test_failed_apply_does_not_persist() {
        let provider = MemoryProvider::new(ConfigNode::new(NodeKind::Root));
        let executor = ActionExecutor::new(false);
        executor.execute(&provider, &add("a").path("src")).unwrap();
        let snapshot = provider.document.borrow().clone();

        let err = executor.execute(&provider, &add("b").path("other")).unwrap_err();
        assert!(err.is_path_mismatch());
        assert!(err.to_string().contains("memory.yml"));
        assert_eq!(provider.persists.get(), 1);
        assert_eq!(*provider.document.borrow(), snapshot);
    }

    #[test]
    fn test_invalid_request_never_loads() {
        let provider = MemoryProvider::new(ConfigNode::new(NodeKind::Root));
        let result = ActionExecutor::new(false).execute(&provider, &add(""));
        assert!(result.is_err());
        assert_eq!(provider.persists.get(), 0);
    }

    #[test]
    fn test_non_recursive_edits_parent_with_modules() {
        let provider = MemoryProvider::new(
            ConfigNode::new(NodeKind::Root).with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "m")),
        );
        ActionExecutor::new(false).execute(&provider, &add("x")).unwrap();
        assert!(contains_type(&provider.document.borrow(), "x"));
    }

    #[test]
    fn test_recursive_edits_modules_only() {
        let temp_dir = TempDir::new().unwrap();
        let root_path = temp_dir.path().join("chainconf.yml");
        let provider = YamlConfigurationProvider::new(&root_path, ProviderSettings::default());
        provider
            .persist(&DocumentTree::from_node(
                ConfigNode::new(NodeKind::Root)
                    .with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "module1"))
                    .with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "module2")),
            ))
            .unwrap();

        let reports = ActionExecutor::new(true)
            .execute(&provider, &add("imports-cleaner"))
            .unwrap();
        assert_eq!(reports.len(), 2);

        let root_content = std::fs::read_to_string(&root_path).unwrap();
        assert!(!root_content.contains("imports-cleaner"));
        for module in ["module1", "module2"] {
            let content = std::fs::read_to_string(temp_dir.path().join(module).join("chainconf.yml")).unwrap();
            assert!(content.contains("imports-cleaner"));
        }
    }

    #[test]
    fn test_recursive_failure_keeps_earlier_modules() {
        let temp_dir = TempDir::new().unwrap();
        let root_path = temp_dir.path().join("chainconf.yml");
        let provider = YamlConfigurationProvider::new(&root_path, ProviderSettings::default());
        provider
            .persist(&DocumentTree::from_node(
                ConfigNode::new(NodeKind::Root)
                    .with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "good"))
                    .with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "broken")),
            ))
            .unwrap();
        let broken_dir = temp_dir.path().join("broken");
        std::fs::create_dir_all(&broken_dir).unwrap();
        std::fs::write(broken_dir.join("chainconf.yml"), "kind: [not, a, kind\n").unwrap();

        let err = ActionExecutor::new(true)
            .execute(&provider, &add("imports-cleaner"))
            .unwrap_err();
        match err {
            ConfError::Document {
                path,
                transformation_type,
                source,
            } => {
                assert_eq!(path, broken_dir.join("chainconf.yml"));
                assert_eq!(transformation_type, "imports-cleaner");
                assert!(matches!(*source, ConfError::Parse { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        let good = std::fs::read_to_string(temp_dir.path().join("good").join("chainconf.yml")).unwrap();
        assert!(good.contains("imports-cleaner"));
    }

    #[test]
    fn test_module_names() {
        let tree = DocumentTree::from_node(
            ConfigNode::new(NodeKind::Root)
                .with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "a"))
                .with_child(ConfigNode::new(NodeKind::Module))
                .with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "b")),
        );
        assert_eq!(module_names(&tree), vec!["a", "b"]);
    }

    fn write_root(temp_dir: &TempDir, modules: &[&str]) -> YamlConfigurationProvider {
        let provider = YamlConfigurationProvider::new(temp_dir.path().join("chainconf.yml"), ProviderSettings::default());
        let root = modules.iter().fold(ConfigNode::new(NodeKind::Root), |n, m| {
            n.with_child(ConfigNode::new(NodeKind::Module).with_attr("name", *m))
        });
        provider.persist(&DocumentTree::from_node(root)).unwrap();
        provider
    }

    #[test]
    fn test_recursive_module_pointing_at_itself() {
        let temp_dir = TempDir::new().unwrap();
        let provider = write_root(&temp_dir, &["."]);
        let before = std::fs::read_to_string(provider.location()).unwrap();

        let err = ActionExecutor::new(true)
            .execute(&provider, &add("imports-cleaner"))
            .unwrap_err();
        match err {
            ConfError::Document { source, .. } => {
                assert!(matches!(*source, ConfError::ConfigError(ref m) if m.contains("cycle")))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(provider.location()).unwrap(), before);
    }

    #[test]
    fn test_recursive_modules_listing_each_other() {
        let temp_dir = TempDir::new().unwrap();
        let provider = write_root(&temp_dir, &["a"]);
        let module_dir = temp_dir.path().join("a");
        std::fs::create_dir_all(&module_dir).unwrap();
        YamlConfigurationProvider::new(module_dir.join("chainconf.yml"), ProviderSettings::default())
            .persist(&DocumentTree::from_node(
                ConfigNode::new(NodeKind::Root).with_child(ConfigNode::new(NodeKind::Module).with_attr("name", "..")),
            ))
            .unwrap();

        let err = ActionExecutor::new(true)
            .execute(&provider, &add("imports-cleaner"))
            .unwrap_err();
        assert!(err.to_string().contains("chainconf.yml"));
        assert!(matches!(err, ConfError::Document { ref source, .. } if matches!(**source, ConfError::ConfigError(_))));
    }
}
