//! Product catalog command: `leadboard products`.

use anyhow::{Context, Result};

use leadboard::board::LeadApi;
use leadboard::config::LeadboardConfig;
use leadboard::ui::render_products;

pub async fn cmd_products(config: &LeadboardConfig) -> Result<()> {
    let coordinator = super::connect(config)?;
    let products = coordinator
        .api()
        .fetch_products()
        .await
        .context("Failed to load products")?;
    print!("{}", render_products(&products));
    Ok(())
}
