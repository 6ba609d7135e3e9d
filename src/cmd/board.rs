//! Board display command: `leadboard board`.

use anyhow::{Context, Result};

use leadboard::board::BoardController;
use leadboard::config::LeadboardConfig;
use leadboard::ui::render_board;

pub async fn cmd_board(config: &LeadboardConfig, json: bool) -> Result<()> {
    let coordinator = super::connect(config)?;
    let controller = BoardController::open(coordinator)
        .await
        .context("Failed to load lead tracking")?;

    if json {
        let out = serde_json::to_string_pretty(controller.board())
            .context("Failed to serialize board")?;
        println!("{}", out);
    } else {
        print!("{}", render_board(controller.board(), config.show_empty_stages()));
    }
    Ok(())
}
