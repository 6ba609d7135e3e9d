use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use leadboard::config::LeadboardConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "leadboard")]
#[command(version, about = "Lead pipeline board for the CRM backend")]
pub struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to leadboard.toml (defaults to LEADBOARD_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL. Overrides LEADBOARD_BACKEND_URL and leadboard.toml.
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the lead pipeline board
    Board {
        /// Print the board as JSON instead of columns
        #[arg(long)]
        json: bool,
    },
    /// Move a lead to a stage, as a drag on the board would
    Move {
        /// Lead id
        lead_id: String,
        /// Destination stage: new, contacted, proposalsent, negotiation, won, lost
        stage: String,
        /// Position in the destination column (defaults to the end)
        #[arg(short, long)]
        index: Option<usize>,
        /// Product line for a won move as <id>:<qty>; repeatable
        #[arg(short, long = "product")]
        products: Vec<String>,
        /// Dismiss the won confirmation instead of confirming
        #[arg(long)]
        cancel_won: bool,
    },
    /// List the product catalog
    Products,
    /// Store a bearer token for the backend
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default leadboard.toml file
    Init,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("leadboard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = LeadboardConfig::with_cli_args(cli.config.clone(), cli.backend_url.clone())?;

    match cli.command {
        Commands::Board { json } => cmd::cmd_board(&config, json).await?,
        Commands::Move {
            lead_id,
            stage,
            index,
            products,
            cancel_won,
        } => {
            cmd::cmd_move(
                &config,
                cmd::MoveArgs {
                    lead_id,
                    stage,
                    index,
                    products,
                    cancel_won,
                },
            )
            .await?
        }
        Commands::Products => cmd::cmd_products(&config).await?,
        Commands::Login { token } => cmd::cmd_login(&config, &token)?,
        Commands::Logout => cmd::cmd_logout(&config)?,
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
