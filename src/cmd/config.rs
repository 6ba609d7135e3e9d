//! Configuration view and validation commands: `leadboard config`.

use anyhow::Result;

use super::super::ConfigCommands;
use leadboard::config::{LeadboardConfig, LeadboardToml};

pub fn cmd_config(config: &LeadboardConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = &config.path;

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Leadboard Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No leadboard.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[backend]");
            println!("  url = \"{}\"", toml.backend.url);
            println!("  timeout_secs = {}", toml.backend.timeout_secs);
            println!();
            println!("[board]");
            println!("  show_empty_stages = {}", toml.board.show_empty_stages);
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  backend_url = \"{}\"", config.backend_url());
            println!("  timeout_secs = {}", config.timeout().as_secs());
            println!(
                "  token = {}",
                if super::token_store(config).load().is_some() {
                    "present"
                } else {
                    "missing"
                }
            );
            println!();

            if !config_path.exists() {
                println!("Run 'leadboard config init' to create a leadboard.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No leadboard.toml found. Using defaults (valid).");
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("leadboard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            LeadboardToml::default().save(config_path)?;

            println!("Created leadboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [backend] url, timeout_secs");
            println!("  - [board] show_empty_stages");
            println!();
        }
    }

    Ok(())
}
