//! # chainconf
//!
//! Command line front end for editing chain configuration documents:
//! - `init`: write an empty document
//! - `add-transformation`: place a transformation in a chain, creating or
//!   migrating chains as needed
//! - `show`: print the chains of a document as JSON
//!
//! Logging goes through `tracing`; set `RUST_LOG` to change the level.

mod commands;

use anyhow::{Context, Result};
use chainconf_libs::{ConfigurationProvider, load_chain_model};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use commands::AddTransformationArgs;

#[derive(Debug, Parser)]
#[command(name = "chainconf", version, about = "Edit chain configuration documents")]
struct Cli {
    /// Configuration document to edit
    #[arg(long, global = true, env = "CHAINCONF_CONFIG", default_value = "chainconf.yml")]
    config: PathBuf,

    /// Provider settings file (YAML)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty configuration document
    Init,

    /// Add a transformation to a chain
    AddTransformation(AddTransformationArgs),

    /// Print the chains of the document as JSON
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainconf_cli=info,chainconf_libs=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let provider = commands::provider(&cli.config, cli.settings.as_deref())?;

    match &cli.command {
        Command::Init => {
            commands::init(&provider)?;
            info!("Initialized {:?}", cli.config);
        }
        Command::AddTransformation(args) => {
            for report in commands::add_transformation(&provider, args)? {
                println!("{}", commands::describe(&report));
            }
        }
        Command::Show => {
            let tree = provider
                .load_document()
                .with_context(|| format!("loading {:?}", cli.config))?;
            let chains = load_chain_model(&tree, provider.defaults());
            println!("{}", serde_json::to_string_pretty(&chains)?);
        }
    }

    Ok(())
}
