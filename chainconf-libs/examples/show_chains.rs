// Example: load a chain configuration and print its chains
use chainconf_libs::{ConfigurationProvider, ProviderSettings, YamlConfigurationProvider, load_chain_model};

fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "chainconf.yml".to_string());
    let provider = YamlConfigurationProvider::new(&config_path, ProviderSettings::default());

    match provider.load_document() {
        Ok(tree) => {
            let chains = load_chain_model(&tree, provider.defaults());
            println!("✓ Loaded {} ({} chain(s))", config_path, chains.len());

            for chain in &chains {
                println!("\n  Chain: {}", chain.name);
                if let Some(reader) = &chain.reader {
                    println!("    Reader: {:?} ({:?})", reader.reader_type, reader.path);
                }
                println!("    Walker: {:?}", chain.walker.walker_type);
                for (i, t) in chain.walker.transformations.iter().enumerate() {
                    println!("      {}. {}", i + 1, t.transformation_type);
                }
                if let Some(writer) = &chain.writer {
                    println!("    Writer: {:?} ({:?})", writer.writer_type, writer.path);
                }
            }
        }
        Err(e) => {
            eprintln!("✗ Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}
