//! Defaults applied when a chain is synthesized from scratch.

use crate::config::{ProviderSettings, ReaderConfig, WalkerConfig, WriterConfig};

/// Supplies the reader, writer and walker of a freshly synthesized chain.
pub trait DefaultsProvider {
    fn default_reader_config(&self) -> ReaderConfig;

    fn default_writer_config(&self) -> WriterConfig;

    /// Walker without transformations
    fn default_walker_config(&self) -> WalkerConfig;
}

/// [`DefaultsProvider`] backed by [`ProviderSettings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsDefaults {
    settings: ProviderSettings,
}

impl SettingsDefaults {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

impl DefaultsProvider for SettingsDefaults {
    fn default_reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            reader_type: self.settings.default_reader_type.clone(),
            path: Some(self.settings.default_path.clone()),
            ..ReaderConfig::default()
        }
    }

    fn default_writer_config(&self) -> WriterConfig {
        WriterConfig {
            writer_type: self.settings.default_writer_type.clone(),
            path: Some(self.settings.default_path.clone()),
            ..WriterConfig::default()
        }
    }

    fn default_walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            walker_type: self.settings.default_walker_type.clone(),
            ..WalkerConfig::default()
        }
    }
}
