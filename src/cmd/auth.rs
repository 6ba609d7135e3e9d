//! Token commands: `leadboard login` / `leadboard logout`.

use anyhow::{Result, bail};

use leadboard::auth::is_token_valid;
use leadboard::config::LeadboardConfig;
use leadboard::ui::icons::CHECK;

pub fn cmd_login(config: &LeadboardConfig, token: &str) -> Result<()> {
    let token = token.trim();
    if !is_token_valid(token) {
        bail!("Token is malformed or expired");
    }
    let store = super::token_store(config);
    store.save(token)?;
    println!("{}Token stored at {}", CHECK, store.path().display());
    Ok(())
}

pub fn cmd_logout(config: &LeadboardConfig) -> Result<()> {
    let store = super::token_store(config);
    if store.clear()? {
        println!("Logged out.");
    } else {
        println!("No stored token.");
    }
    Ok(())
}
