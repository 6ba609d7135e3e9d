//! Drag emulation command: `leadboard move`.
//!
//! Moves a lead from wherever the board currently shows it to `stage[index]`,
//! goes through the same optimistic path a drag does, then waits for the
//! commit to settle and prints the resulting board.

use anyhow::{Context, Result, bail};
use tracing::warn;

use leadboard::board::{
    BoardController, CommitEvent, DragEnd, DragResponse, HttpLeadApi, LeadApi, LeadId, Slot,
    Stage, WonConfirmation,
};
use leadboard::config::LeadboardConfig;
use leadboard::errors::BoardError;
use leadboard::ui::icons::{CHECK, CROSS};
use leadboard::ui::{prompt_won_confirmation, render_board, resolve_products};

pub struct MoveArgs {
    pub lead_id: String,
    pub stage: String,
    pub index: Option<usize>,
    pub products: Vec<String>,
    pub cancel_won: bool,
}

pub async fn cmd_move(config: &LeadboardConfig, args: MoveArgs) -> Result<()> {
    let stage: Stage = args
        .stage
        .parse()
        .map_err(|message| BoardError::InvalidStage {
            stage: args.stage.clone(),
            message,
        })?;
    let lead_id = LeadId::new(args.lead_id.trim());

    let coordinator = super::connect(config)?;
    let mut controller = BoardController::open(coordinator)
        .await
        .context("Failed to load lead tracking")?;

    let source = controller
        .board()
        .position_of(&lead_id)
        .ok_or_else(|| BoardError::UnknownLead { id: lead_id.clone() })?;
    let index = args
        .index
        .unwrap_or_else(|| controller.board().column(stage).len());

    let drag = DragEnd {
        lead_id: lead_id.clone(),
        source,
        destination: Some(Slot::new(stage, index)),
    };

    match controller.handle_drag_end(drag) {
        DragResponse::Ignored => {
            println!("{} is already at {}[{}]; nothing to do.", lead_id, source.stage, source.index);
            return Ok(());
        }
        DragResponse::Committing => {}
        DragResponse::NeedsWonConfirmation(_) => {
            if args.cancel_won {
                controller.cancel_won()?;
            } else {
                let confirmation = match collect_confirmation(&controller, &args.products).await {
                    Ok(confirmation) => confirmation,
                    Err(e) => {
                        discard_pending(&mut controller).await?;
                        return Err(e);
                    }
                };
                match confirmation {
                    Some(confirmation) => {
                        if let Err(e) = controller.confirm_won(confirmation) {
                            discard_pending(&mut controller).await?;
                            return Err(e).context("Won confirmation rejected");
                        }
                    }
                    None => controller.cancel_won()?,
                }
            }
        }
    }

    let events = controller.settle().await;
    if controller.is_stale() {
        warn!("board could not be reloaded; showing last known state");
    }
    print!("{}", render_board(controller.board(), config.show_empty_stages()));

    if events.iter().any(CommitEvent::is_failure) {
        bail!("{}Move of {} was not committed", CROSS, lead_id);
    }
    if events
        .iter()
        .any(|e| matches!(e, CommitEvent::Committed { .. } | CommitEvent::WonCommitted { .. }))
    {
        let slot = controller.board().position_of(&lead_id).unwrap_or(source);
        println!("{}Moved {} to {}[{}]", CHECK, lead_id, slot.stage, slot.index);
    }
    Ok(())
}

/// Dismiss the open won confirmation and wait for the board to be restored.
async fn discard_pending(controller: &mut BoardController<HttpLeadApi>) -> Result<()> {
    controller.cancel_won()?;
    controller.settle().await;
    Ok(())
}

/// Product lines from `--product` flags, or from an interactive prompt on a terminal.
async fn collect_confirmation(
    controller: &BoardController<HttpLeadApi>,
    product_args: &[String],
) -> Result<Option<WonConfirmation>> {
    let catalog = match controller.coordinator().api().fetch_products().await {
        Ok(products) => products,
        Err(e) => {
            warn!("could not load product catalog: {}", e);
            Vec::new()
        }
    };

    if !product_args.is_empty() {
        return resolve_products(product_args, &catalog).map(Some);
    }
    if !console::user_attended() {
        bail!("Moving to won needs product lines: pass --product <id>:<qty> or use --cancel-won");
    }
    prompt_won_confirmation(&catalog)
}
