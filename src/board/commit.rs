use std::sync::Arc;

use tracing::{info, warn};

use super::api::LeadApi;
use super::models::{BoardSnapshot, ConfirmedProduct, LeadId, StageChange, WonConfirmation};
use super::notify::{Notification, Notifier};
use crate::errors::BackendError;

pub const COMMIT_FAILED_TITLE: &str = "Issue in status Update";
pub const MOVE_FAILED_FALLBACK: &str = "Failed to update lead status.";
pub const WON_FAILED_FALLBACK: &str = "Failed to confirm products.";
pub const RELOAD_FAILED_MESSAGE: &str = "Failed to load lead tracking. Please try again.";

/// Result of a commit or reload, delivered back to the board owner.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitEvent {
    /// The backend accepted a stage change; the optimistic board already matches.
    Committed { lead_id: LeadId },
    /// The backend accepted a won move; the products belong on the lead card.
    WonCommitted {
        lead_id: LeadId,
        products: Vec<ConfirmedProduct>,
    },
    /// A commit failed. `reload` is the fresh fetch that replaces the board.
    Reconciled {
        lead_id: LeadId,
        error: BackendError,
        reload: Result<BoardSnapshot, BackendError>,
    },
    /// A plain reload finished (initial load, cancelled confirmation, retry).
    Reloaded(Result<BoardSnapshot, BackendError>),
}

impl CommitEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Reconciled { .. } | Self::Reloaded(Err(_)))
    }
}

/// Sends confirmed moves to the backend and reconciles on failure.
///
/// There is no retry and no partial rollback: any failure is reported once
/// through the notifier and answered with a full board fetch.
pub struct CommitCoordinator<A: LeadApi> {
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
}

impl<A: LeadApi> CommitCoordinator<A> {
    pub fn new(api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn commit_move(&self, change: StageChange) -> CommitEvent {
        match self.api.update_stage(&change).await {
            Ok(()) => {
                info!(lead_id = %change.lead_id, stage = %change.stage, index = change.index, "stage change committed");
                CommitEvent::Committed {
                    lead_id: change.lead_id,
                }
            }
            Err(error) => {
                warn!(lead_id = %change.lead_id, stage = %change.stage, "stage change failed, reloading: {}", error);
                self.reconcile(change.lead_id, error, MOVE_FAILED_FALLBACK).await
            }
        }
    }

    /// Local check for a won confirmation. No I/O.
    pub fn validate_won(confirmation: &WonConfirmation) -> Result<(), BackendError> {
        confirmation
            .validate()
            .map_err(BackendError::local_validation)
    }

    /// Commit a won move with its product lines as one backend call.
    ///
    /// Local validation failures are returned as `Err` before any request is
    /// made; the caller still owns the pending move. Backend failures are
    /// reconciled like plain moves.
    pub async fn commit_won_move(
        &self,
        lead_id: LeadId,
        index: usize,
        confirmation: WonConfirmation,
    ) -> Result<CommitEvent, BackendError> {
        Self::validate_won(&confirmation)?;
        Ok(self.send_won_move(lead_id, index, confirmation).await)
    }

    /// Send a won move whose confirmation already passed `validate_won`.
    pub async fn send_won_move(
        &self,
        lead_id: LeadId,
        index: usize,
        confirmation: WonConfirmation,
    ) -> CommitEvent {
        match self
            .api
            .confirm_won(&lead_id, index, &confirmation.products)
            .await
        {
            Ok(()) => {
                info!(lead_id = %lead_id, products = confirmation.products.len(), "won move committed");
                CommitEvent::WonCommitted {
                    lead_id,
                    products: confirmation.products,
                }
            }
            Err(error) => {
                warn!(lead_id = %lead_id, "won move failed, reloading: {}", error);
                self.reconcile(lead_id, error, WON_FAILED_FALLBACK).await
            }
        }
    }

    /// Fetch the authoritative board. Reports a notification if that fails.
    pub async fn reload(&self) -> Result<BoardSnapshot, BackendError> {
        let result = self.api.fetch_board().await;
        if let Err(ref e) = result {
            warn!("board reload failed: {}", e);
            self.notifier
                .notify(Notification::error(COMMIT_FAILED_TITLE, RELOAD_FAILED_MESSAGE));
        }
        result
    }

    async fn reconcile(&self, lead_id: LeadId, error: BackendError, fallback: &str) -> CommitEvent {
        self.notifier
            .notify(Notification::error(COMMIT_FAILED_TITLE, error.user_message(fallback)));
        let reload = self.reload().await;
        CommitEvent::Reconciled {
            lead_id,
            error,
            reload,
        }
    }
}
