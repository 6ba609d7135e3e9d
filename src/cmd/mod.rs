//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled        |
//! |-------------|-------------------------|
//! | `board`     | `Board`                 |
//! | `move_lead` | `Move`                  |
//! | `products`  | `Products`              |
//! | `auth`      | `Login`, `Logout`       |
//! | `config`    | `Config`                |

pub mod auth;
pub mod board;
pub mod config;
pub mod move_lead;
pub mod products;

pub use auth::{cmd_login, cmd_logout};
pub use board::cmd_board;
pub use config::cmd_config;
pub use move_lead::{MoveArgs, cmd_move};
pub use products::cmd_products;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use leadboard::auth::FileTokenStore;
use leadboard::board::{CommitCoordinator, ConsoleNotifier, HttpLeadApi};
use leadboard::config::LeadboardConfig;

/// Token store that lives next to the active config file.
pub fn token_store(config: &LeadboardConfig) -> FileTokenStore {
    FileTokenStore::beside(&config.path)
}

/// Build the commit coordinator for the configured backend.
pub fn connect(config: &LeadboardConfig) -> Result<Arc<CommitCoordinator<HttpLeadApi>>> {
    for warning in config.validate() {
        warn!("config: {}", warning);
    }
    let tokens = token_store(config);
    if tokens.load().is_none() {
        warn!("no valid token found; run 'leadboard login --token <jwt>'");
    }
    let api = HttpLeadApi::new(&config.backend_url(), config.timeout(), Arc::new(tokens))
        .context("Failed to create backend client")?;
    Ok(Arc::new(CommitCoordinator::new(
        Arc::new(api),
        Arc::new(ConsoleNotifier),
    )))
}
