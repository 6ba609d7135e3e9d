use tracing::debug;

use super::models::{DragEnd, PendingMove, StageChange};
use super::state::BoardState;

/// What the controller must do after the optimistic move is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitDecision {
    /// Send the stage change to the backend now.
    Commit(StageChange),
    /// Collect a won confirmation first; nothing is sent yet.
    AwaitWonConfirmation(PendingMove),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing changes and nothing is sent.
    Ignored,
    /// The board to display right away, plus the commit decision.
    Moved {
        board: BoardState,
        decision: CommitDecision,
    },
}

/// Turns drag-end events into board transitions and commit decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReorderEngine;

impl ReorderEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn on_drag_end(&self, board: &BoardState, drag: &DragEnd) -> DragOutcome {
        let Some(destination) = drag.destination else {
            debug!(lead_id = %drag.lead_id, "dropped outside any column");
            return DragOutcome::Ignored;
        };

        let Some(current) = board.position_of(&drag.lead_id) else {
            debug!(lead_id = %drag.lead_id, "dragged lead is not on the board");
            return DragOutcome::Ignored;
        };

        let dest = board.effective_slot(&drag.lead_id, destination);
        if dest == current {
            debug!(lead_id = %drag.lead_id, "dropped back onto its own slot");
            return DragOutcome::Ignored;
        }

        let pending = PendingMove {
            lead_id: drag.lead_id.clone(),
            source: current,
            dest,
        };
        let next = board.move_lead(&pending);

        let decision = if dest.stage.requires_confirmation() {
            CommitDecision::AwaitWonConfirmation(pending)
        } else {
            CommitDecision::Commit(StageChange {
                lead_id: pending.lead_id,
                stage: dest.stage,
                index: dest.index,
            })
        };

        DragOutcome::Moved {
            board: next,
            decision,
        }
    }
}
