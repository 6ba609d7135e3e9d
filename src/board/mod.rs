//! Lead pipeline board.
//!
//! ## Overview
//!
//! Leads sit in one ordered column per [`Stage`]. A drag is applied to the
//! local board immediately, committed to the backend in the background, and
//! reconciled by a full reload if the backend rejects it.
//!
//! ## Module Map
//!
//! ```text
//!  DragEnd ──> controller.rs  (BoardController: owns BoardState)
//!                 │
//!                 │ ReorderEngine::on_drag_end()
//!                 v
//!              reorder.rs ──> state.rs  (BoardState::move_lead, clamp policy)
//!                 │
//!                 │ Commit / AwaitWonConfirmation
//!                 v
//!              commit.rs  (CommitCoordinator) ──> notify.rs  (Notifier)
//!                 │
//!                 │ LeadApi
//!                 v
//!              api.rs  (HttpLeadApi over reqwest)
//! ```
//!
//! Commit results travel back to the controller as [`CommitEvent`]s over a
//! tokio mpsc channel and are applied one at a time.

pub mod api;
pub mod commit;
pub mod controller;
pub mod models;
pub mod notify;
pub mod reorder;
pub mod state;

pub use api::{HttpLeadApi, LeadApi};
pub use commit::{CommitCoordinator, CommitEvent};
pub use controller::{BoardController, DragResponse};
pub use models::{
    BoardSnapshot, ConfirmedProduct, DragEnd, Lead, LeadId, PendingMove, Product, Slot, Stage,
    StageChange, WonConfirmation,
};
pub use notify::{ConsoleNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier};
pub use reorder::{CommitDecision, DragOutcome, ReorderEngine};
pub use state::BoardState;
