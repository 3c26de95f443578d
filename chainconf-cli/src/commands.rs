//! Command implementations
//!
//! Turns parsed command-line arguments into library calls and reports what
//! happened to each document.

use anyhow::{Context, Result, bail};
use chainconf_libs::{
    ActionExecutor, AddTransformation, ConfigurationProvider, DocumentReport, Placement,
    ProviderSettings, TransformationConfig, YamlConfigurationProvider, load_settings,
};
use clap::Args;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// Arguments of `chainconf add-transformation`
#[derive(Debug, Clone, Args)]
pub struct AddTransformationArgs {
    /// Transformation type (e.g. "imports-cleaner")
    pub transformation_type: String,

    /// Chain to add the transformation to (default chain when omitted)
    #[arg(long)]
    pub chain: Option<String>,

    /// Directory the chain reads from and writes to
    #[arg(long)]
    pub path: Option<String>,

    /// Position inside the chain's transformation list
    #[arg(long)]
    pub order: Option<usize>,

    /// Name of the chain a newly created chain must precede
    #[arg(long)]
    pub before: Option<String>,

    /// Instance name of the transformation
    #[arg(long)]
    pub name: Option<String>,

    /// Transformation parameters as a JSON object
    #[arg(long)]
    pub params: Option<String>,

    /// Apply to every sub-module document instead of this one
    #[arg(long, short = 'r')]
    pub recursive: bool,
}

impl AddTransformationArgs {
    /// Build the library request from the arguments
    pub fn to_request(&self) -> Result<AddTransformation> {
        let mut transformation = TransformationConfig::new(self.transformation_type.as_str());
        if let Some(name) = &self.name {
            transformation = transformation.with_name(name.as_str());
        }
        if let Some(params) = &self.params {
            for (key, value) in parse_params(params)? {
                transformation = transformation.with_param(key, value);
            }
        }

        Ok(AddTransformation {
            chain: self.chain.clone(),
            path: self.path.clone(),
            transformation,
            order: self.order,
            before: self.before.clone(),
        })
    }
}

/// Parse `--params`: a JSON object whose values become string attributes.
///
/// Strings are kept as-is, any other value is stored as its JSON text.
pub fn parse_params(raw: &str) -> Result<Vec<(String, String)>> {
    let map: Map<String, Value> =
        serde_json::from_str(raw).context("--params must be a JSON object")?;
    Ok(map
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, s),
            other => (key, other.to_string()),
        })
        .collect())
}

/// Build the provider for `config`, with settings from `settings` if given
pub fn provider(config: &Path, settings: Option<&Path>) -> Result<YamlConfigurationProvider> {
    let settings = match settings {
        Some(path) => load_settings(path).with_context(|| format!("loading settings {:?}", path))?,
        None => ProviderSettings::default(),
    };
    Ok(YamlConfigurationProvider::new(config, settings))
}

/// `chainconf init`: write an empty document
pub fn init(provider: &YamlConfigurationProvider) -> Result<()> {
    if provider.exists() {
        bail!("{:?} already exists", provider.location());
    }
    provider.create_config()?;
    Ok(())
}

/// `chainconf add-transformation`
///
/// A missing document is started empty and written once, with the edit.
pub fn add_transformation(
    provider: &YamlConfigurationProvider,
    args: &AddTransformationArgs,
) -> Result<Vec<DocumentReport<Placement>>> {
    let request = args.to_request()?;
    if !provider.exists() {
        info!("No configuration found, creating one");
    }
    let provider = provider.clone().create_if_missing();

    match ActionExecutor::new(args.recursive).execute(&provider, &request) {
        Ok(reports) => Ok(reports),
        Err(e) if e.is_path_mismatch() => Err(anyhow::Error::new(e).context(format!(
            "adding transformation '{}': the default chain reads another path, pass --chain to add it to a separate chain",
            args.transformation_type
        ))),
        Err(e) => Err(anyhow::Error::new(e).context(format!(
            "adding transformation '{}' (documents updated before the failure keep their changes)",
            args.transformation_type
        ))),
    }
}

/// One line per edited document
pub fn describe(report: &DocumentReport<Placement>) -> String {
    let what = match &report.outcome {
        Placement::ExistingChain { chain, migrated, .. } if *migrated => {
            format!("added to chain '{}' (legacy transformations moved to 'default')", chain)
        }
        Placement::ExistingChain { chain, .. } => format!("added to chain '{}'", chain),
        Placement::NewChain { chain, migrated } if *migrated => {
            format!("created chain '{}' (legacy transformations moved to 'default')", chain)
        }
        Placement::NewChain { chain, .. } => format!("created chain '{}'", chain),
        Placement::DefaultChain { slot: Some(_) } => "added to chain 'default'".to_string(),
        Placement::DefaultChain { slot: None } => "chain 'default' is empty, nothing added".to_string(),
        Placement::NewDefaultChain => "created chain 'default'".to_string(),
        Placement::BareRoot => "added to the flat transformation list".to_string(),
        Placement::Normalized { .. } => "rewrote the document into chain 'default'".to_string(),
    };
    format!("{}: {}", report.path.display(), what)
}
