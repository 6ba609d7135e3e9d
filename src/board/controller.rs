//! Single owner of the board.
//!
//! `BoardController` holds the only `BoardState`. Drag events are applied
//! optimistically and synchronously; commits run as spawned tokio tasks whose
//! results come back over an mpsc channel and are applied one at a time, the
//! way a UI event loop would handle network callbacks. Two commits may be in
//! flight at once; there is no queueing between them, and every failure ends
//! in a full reload, so the last applied reload wins.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::api::LeadApi;
use super::commit::{CommitCoordinator, CommitEvent};
use super::models::{BoardSnapshot, DragEnd, PendingMove, WonConfirmation};
use super::reorder::{CommitDecision, DragOutcome, ReorderEngine};
use super::state::BoardState;
use crate::errors::{BackendError, BoardError};

/// What a drag did, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragResponse {
    /// Nothing moved and nothing was sent.
    Ignored,
    /// The board moved and a commit is in flight.
    Committing,
    /// The board moved into won; call `confirm_won` or `cancel_won`.
    NeedsWonConfirmation(PendingMove),
}

pub struct BoardController<A: LeadApi + 'static> {
    board: BoardState,
    engine: ReorderEngine,
    coordinator: Arc<CommitCoordinator<A>>,
    pending_won: Option<PendingMove>,
    stale: bool,
    in_flight: usize,
    events_tx: mpsc::UnboundedSender<CommitEvent>,
    events_rx: mpsc::UnboundedReceiver<CommitEvent>,
}

impl<A: LeadApi + 'static> BoardController<A> {
    /// Controller with an empty board. Call `reload` or `open` to populate it.
    pub fn new(coordinator: Arc<CommitCoordinator<A>>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            board: BoardState::new(),
            engine: ReorderEngine::new(),
            coordinator,
            pending_won: None,
            stale: false,
            in_flight: 0,
            events_tx,
            events_rx,
        }
    }

    /// Create a controller and perform the initial load.
    pub async fn open(coordinator: Arc<CommitCoordinator<A>>) -> Result<Self, BackendError> {
        let mut controller = Self::new(coordinator);
        controller.reload().await?;
        Ok(controller)
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn coordinator(&self) -> &CommitCoordinator<A> {
        &self.coordinator
    }

    pub fn pending_won(&self) -> Option<&PendingMove> {
        self.pending_won.as_ref()
    }

    /// True when the last reload failed and the board may not match the backend.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Fetch and load the board, waiting for the result.
    pub async fn reload(&mut self) -> Result<(), BackendError> {
        let result = self.coordinator.reload().await;
        self.apply_reload(result.clone());
        result.map(|_| ())
    }

    /// Apply a drag end. Never waits on the network.
    pub fn handle_drag_end(&mut self, drag: DragEnd) -> DragResponse {
        if self.pending_won.is_some() {
            debug!(lead_id = %drag.lead_id, "won confirmation open; ignoring drag");
            return DragResponse::Ignored;
        }

        match self.engine.on_drag_end(&self.board, &drag) {
            DragOutcome::Ignored => DragResponse::Ignored,
            DragOutcome::Moved { board, decision } => {
                self.board = board;
                match decision {
                    CommitDecision::Commit(change) => {
                        debug!(lead_id = %change.lead_id, stage = %change.stage, index = change.index, "optimistic move applied");
                        let coordinator = Arc::clone(&self.coordinator);
                        self.spawn(async move { coordinator.commit_move(change).await });
                        DragResponse::Committing
                    }
                    CommitDecision::AwaitWonConfirmation(pending) => {
                        debug!(lead_id = %pending.lead_id, "awaiting won confirmation");
                        self.pending_won = Some(pending.clone());
                        DragResponse::NeedsWonConfirmation(pending)
                    }
                }
            }
        }
    }

    /// Commit the pending won move with the user's product lines.
    ///
    /// An invalid confirmation is rejected without a request and the pending
    /// move stays open so the user can correct it.
    pub fn confirm_won(&mut self, confirmation: WonConfirmation) -> Result<(), BoardError> {
        let Some(pending) = self.pending_won.as_ref() else {
            return Err(BoardError::NoPendingConfirmation);
        };
        CommitCoordinator::<A>::validate_won(&confirmation)?;

        let lead_id = pending.lead_id.clone();
        let index = pending.dest.index;
        self.pending_won = None;

        let coordinator = Arc::clone(&self.coordinator);
        self.spawn(async move { coordinator.send_won_move(lead_id, index, confirmation).await });
        Ok(())
    }

    /// Dismiss the won confirmation. The speculative move is discarded by reloading.
    pub fn cancel_won(&mut self) -> Result<(), BoardError> {
        let Some(pending) = self.pending_won.take() else {
            return Err(BoardError::NoPendingConfirmation);
        };
        info!(lead_id = %pending.lead_id, "won confirmation cancelled, reloading board");
        let coordinator = Arc::clone(&self.coordinator);
        self.spawn(async move { CommitEvent::Reloaded(coordinator.reload().await) });
        Ok(())
    }

    /// Wait for the next commit or reload result. `None` when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<CommitEvent> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.in_flight -= 1;
        Some(event)
    }

    /// Fold a commit result into the board.
    pub fn apply(&mut self, event: &CommitEvent) {
        match event {
            CommitEvent::Committed { lead_id } => {
                debug!(lead_id = %lead_id, "commit confirmed; keeping optimistic board");
            }
            CommitEvent::WonCommitted { lead_id, products } => {
                let tags = WonConfirmation::new(products.clone()).to_tags();
                self.board.attach_products(lead_id, tags);
            }
            CommitEvent::Reconciled { reload, .. } | CommitEvent::Reloaded(reload) => {
                self.apply_reload(reload.clone());
            }
        }
    }

    /// Process results until nothing is in flight. Returns them in arrival order.
    pub async fn settle(&mut self) -> Vec<CommitEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            self.apply(&event);
            events.push(event);
        }
        events
    }

    fn apply_reload(&mut self, result: Result<BoardSnapshot, BackendError>) {
        match result {
            Ok(snapshot) => {
                self.board.load(snapshot);
                self.stale = false;
                // the loaded board no longer shows the speculative won move
                if let Some(pending) = self.pending_won.take() {
                    info!(lead_id = %pending.lead_id, "board reloaded; won confirmation discarded");
                }
            }
            Err(_) => {
                self.stale = true;
            }
        }
    }

    fn spawn<F>(&mut self, fut: F)
    where
        F: std::future::Future<Output = CommitEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = fut.await;
            // receiver gone means the controller was dropped; the request still completed
            let _ = tx.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::commit::{COMMIT_FAILED_TITLE, MOVE_FAILED_FALLBACK};
    use crate::board::models::{ConfirmedProduct, Lead, LeadId, Product, Slot, Stage, StageChange};
    use crate::board::notify::RecordingNotifier;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{Barrier, Notify};

    /// In-memory backend. `board` is what every fetch returns.
    struct FakeBackend {
        board: Mutex<BoardSnapshot>,
        fail_updates: bool,
        fetches: AtomicUsize,
        updates: Mutex<Vec<StageChange>>,
        won: Mutex<Vec<(LeadId, usize)>>,
        barrier: Option<Barrier>,
        gate: Option<Notify>,
    }

    impl FakeBackend {
        fn new(board: BoardSnapshot) -> Self {
            Self {
                board: Mutex::new(board),
                fail_updates: false,
                fetches: AtomicUsize::new(0),
                updates: Mutex::new(Vec::new()),
                won: Mutex::new(Vec::new()),
                barrier: None,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl LeadApi for FakeBackend {
        async fn fetch_board(&self) -> Result<BoardSnapshot, BackendError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.board.lock().unwrap().clone())
        }

        async fn update_stage(&self, change: &StageChange) -> Result<(), BackendError> {
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.updates.lock().unwrap().push(change.clone());
            if self.fail_updates {
                return Err(BackendError::Network {
                    message: "connection reset".into(),
                });
            }
            Ok(())
        }

        async fn confirm_won(
            &self,
            lead_id: &LeadId,
            index: usize,
            _products: &[ConfirmedProduct],
        ) -> Result<(), BackendError> {
            self.won.lock().unwrap().push((lead_id.clone(), index));
            Ok(())
        }

        async fn fetch_products(&self) -> Result<Vec<Product>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn snapshot(entries: &[(Stage, &[&str])]) -> BoardSnapshot {
        entries
            .iter()
            .map(|(stage, ids)| (*stage, ids.iter().map(|id| Lead::new(*id, *id)).collect()))
            .collect()
    }

    fn ids(board: &BoardState, stage: Stage) -> Vec<String> {
        board.column(stage).iter().map(|l| l.id.to_string()).collect()
    }

    fn drag(id: &str, from: (Stage, usize), to: Option<(Stage, usize)>) -> DragEnd {
        DragEnd {
            lead_id: LeadId::new(id),
            source: Slot::new(from.0, from.1),
            destination: to.map(|(s, i)| Slot::new(s, i)),
        }
    }

    async fn open(
        backend: FakeBackend,
    ) -> (BoardController<FakeBackend>, Arc<FakeBackend>, Arc<RecordingNotifier>) {
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = Arc::new(CommitCoordinator::new(backend.clone(), notifier.clone()));
        let controller = BoardController::open(coordinator).await.unwrap();
        (controller, backend, notifier)
    }

    #[tokio::test]
    async fn test_open_loads_board() {
        let (controller, backend, _) =
            open(FakeBackend::new(snapshot(&[(Stage::New, &["L1", "L2"])]))).await;
        assert_eq!(ids(controller.board(), Stage::New), vec!["L1", "L2"]);
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_move_to_contacted_commits() {
        let (mut controller, backend, notifier) = open(FakeBackend::new(snapshot(&[
            (Stage::New, &["L1", "L2"]),
            (Stage::Contacted, &[]),
        ])))
        .await;

        let response = controller.handle_drag_end(drag("L1", (Stage::New, 0), Some((Stage::Contacted, 0))));
        assert_eq!(response, DragResponse::Committing);
        // optimistic, before any response
        assert_eq!(ids(controller.board(), Stage::New), vec!["L2"]);
        assert_eq!(ids(controller.board(), Stage::Contacted), vec!["L1"]);

        let events = controller.settle().await;
        assert_eq!(events, vec![CommitEvent::Committed { lead_id: LeadId::new("L1") }]);
        assert_eq!(ids(controller.board(), Stage::Contacted), vec!["L1"]);
        assert_eq!(
            backend.updates.lock().unwrap().clone(),
            vec![StageChange {
                lead_id: LeadId::new("L1"),
                stage: Stage::Contacted,
                index: 0,
            }]
        );
        // no reload on success
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
        assert!(notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_drop_outside_board_sends_nothing() {
        let (mut controller, backend, _) =
            open(FakeBackend::new(snapshot(&[(Stage::New, &["L1"])]))).await;
        let before = controller.board().clone();

        let response = controller.handle_drag_end(drag("L1", (Stage::New, 0), None));
        assert_eq!(response, DragResponse::Ignored);
        assert_eq!(controller.board(), &before);
        assert_eq!(controller.in_flight(), 0);
        assert!(controller.settle().await.is_empty());
        assert!(backend.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_reloads_authoritative_board() {
        let mut backend = FakeBackend::new(snapshot(&[(Stage::New, &["L1", "L2"])]));
        backend.fail_updates = true;
        let (mut controller, backend, notifier) = open(backend).await;

        controller.handle_drag_end(drag("L1", (Stage::New, 0), Some((Stage::Lost, 0))));
        assert_eq!(ids(controller.board(), Stage::Lost), vec!["L1"]);

        let events = controller.settle().await;
        assert!(matches!(events.as_slice(), [CommitEvent::Reconciled { .. }]));
        // optimistic move discarded
        assert_eq!(ids(controller.board(), Stage::New), vec!["L1", "L2"]);
        assert!(ids(controller.board(), Stage::Lost).is_empty());
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 2);

        let errors = notifier.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].title, COMMIT_FAILED_TITLE);
        assert_eq!(errors[0].message, MOVE_FAILED_FALLBACK);
    }

    #[tokio::test]
    async fn test_won_move_waits_for_confirmation() {
        let (mut controller, backend, _) = open(FakeBackend::new(snapshot(&[
            (Stage::Negotiation, &["L1"]),
            (Stage::Won, &[]),
        ])))
        .await;

        let response = controller.handle_drag_end(drag("L1", (Stage::Negotiation, 0), Some((Stage::Won, 0))));
        assert!(matches!(response, DragResponse::NeedsWonConfirmation(_)));
        assert_eq!(ids(controller.board(), Stage::Won), vec!["L1"]);
        assert_eq!(controller.in_flight(), 0);
        assert!(backend.updates.lock().unwrap().is_empty());

        // modal: other drags are ignored meanwhile
        let other = controller.handle_drag_end(drag("L1", (Stage::Won, 0), Some((Stage::New, 0))));
        assert_eq!(other, DragResponse::Ignored);

        controller
            .confirm_won(WonConfirmation::new(vec![ConfirmedProduct::new("p1", "Widget", 2)]))
            .unwrap();
        assert!(controller.pending_won().is_none());

        controller.settle().await;
        assert_eq!(backend.won.lock().unwrap().clone(), vec![(LeadId::new("L1"), 0)]);
        let lead = controller.board().lead(&LeadId::new("L1")).unwrap();
        assert_eq!(lead.products[0].name, "Widget");
        assert_eq!(lead.products[0].quantity, Some(2));
    }

    #[tokio::test]
    async fn test_empty_won_confirmation_is_rejected_locally() {
        let (mut controller, backend, _) =
            open(FakeBackend::new(snapshot(&[(Stage::New, &["L1"])]))).await;
        controller.handle_drag_end(drag("L1", (Stage::New, 0), Some((Stage::Won, 0))));

        let err = controller.confirm_won(WonConfirmation::default()).unwrap_err();
        assert!(matches!(err, BoardError::Backend(BackendError::Validation { status: None, .. })));
        // still pending, nothing sent
        assert!(controller.pending_won().is_some());
        assert_eq!(controller.in_flight(), 0);
        assert!(backend.won.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_confirmation_restores_board() {
        let (mut controller, backend, _) =
            open(FakeBackend::new(snapshot(&[(Stage::New, &["L1"])]))).await;
        controller.handle_drag_end(drag("L1", (Stage::New, 0), Some((Stage::Won, 0))));
        assert_eq!(ids(controller.board(), Stage::Won), vec!["L1"]);

        controller.cancel_won().unwrap();
        controller.settle().await;
        assert_eq!(ids(controller.board(), Stage::New), vec!["L1"]);
        assert!(ids(controller.board(), Stage::Won).is_empty());
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 2);
        assert!(backend.won.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reload_during_won_confirmation_discards_pending_move() {
        let mut backend = FakeBackend::new(snapshot(&[(Stage::New, &["A", "B"])]));
        backend.fail_updates = true;
        let (mut controller, backend, _) = open(backend).await;

        controller.handle_drag_end(drag("A", (Stage::New, 0), Some((Stage::Contacted, 0))));
        let response = controller.handle_drag_end(drag("B", (Stage::New, 0), Some((Stage::Won, 0))));
        assert!(matches!(response, DragResponse::NeedsWonConfirmation(_)));

        // A's failure reloads the board while the won dialog is open
        let events = controller.settle().await;
        assert!(matches!(events.as_slice(), [CommitEvent::Reconciled { .. }]));
        assert_eq!(controller.board().stage_of(&LeadId::new("B")), Some(Stage::New));
        assert!(controller.pending_won().is_none());

        let err = controller
            .confirm_won(WonConfirmation::new(vec![ConfirmedProduct::new("p1", "Widget", 1)]))
            .unwrap_err();
        assert!(matches!(err, BoardError::NoPendingConfirmation));
        assert_eq!(controller.in_flight(), 0);
        assert!(backend.won.lock().unwrap().is_empty());

        // drags are accepted again
        let retry = controller.handle_drag_end(drag("B", (Stage::New, 1), Some((Stage::Won, 0))));
        assert!(matches!(retry, DragResponse::NeedsWonConfirmation(_)));
    }

    #[tokio::test]
    async fn test_confirm_without_pending_move_errors() {
        let (mut controller, _, _) = open(FakeBackend::new(snapshot(&[]))).await;
        assert!(matches!(
            controller.confirm_won(WonConfirmation::default()),
            Err(BoardError::NoPendingConfirmation)
        ));
        assert!(matches!(controller.cancel_won(), Err(BoardError::NoPendingConfirmation)));
    }

    #[tokio::test]
    async fn test_two_rapid_moves_are_in_flight_together() {
        let mut backend = FakeBackend::new(snapshot(&[
            (Stage::New, &["A", "B"]),
            (Stage::Contacted, &[]),
            (Stage::Negotiation, &[]),
        ]));
        // each update blocks until the other one has also started
        backend.barrier = Some(Barrier::new(2));
        let (mut controller, backend, _) = open(backend).await;

        controller.handle_drag_end(drag("A", (Stage::New, 0), Some((Stage::Contacted, 0))));
        controller.handle_drag_end(drag("B", (Stage::New, 0), Some((Stage::Negotiation, 0))));
        assert_eq!(controller.in_flight(), 2);

        let events = tokio::time::timeout(Duration::from_secs(5), controller.settle())
            .await
            .expect("commits blocked each other");
        assert_eq!(events.len(), 2);
        assert_eq!(backend.updates.lock().unwrap().len(), 2);
        assert_eq!(ids(controller.board(), Stage::Contacted), vec!["A"]);
        assert_eq!(ids(controller.board(), Stage::Negotiation), vec!["B"]);
    }

    #[tokio::test]
    async fn test_dropped_controller_still_completes_request() {
        let mut backend = FakeBackend::new(snapshot(&[(Stage::New, &["A"])]));
        backend.gate = Some(Notify::new());
        let (mut controller, backend, _) = open(backend).await;

        controller.handle_drag_end(drag("A", (Stage::New, 0), Some((Stage::Lost, 0))));
        drop(controller);

        if let Some(gate) = &backend.gate {
            gate.notify_one();
        }
        tokio::time::timeout(Duration::from_secs(5), async {
            while backend.updates.lock().unwrap().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("request never reached the backend");
    }

    #[tokio::test]
    async fn test_move_invariant_holds_across_commits() {
        let (mut controller, _, _) = open(FakeBackend::new(snapshot(&[
            (Stage::New, &["a", "b", "c"]),
            (Stage::ProposalSent, &["d"]),
        ])))
        .await;
        let before = controller.board().lead_ids();

        controller.handle_drag_end(drag("a", (Stage::New, 0), Some((Stage::ProposalSent, 1))));
        controller.handle_drag_end(drag("d", (Stage::ProposalSent, 0), Some((Stage::New, 9))));
        controller.handle_drag_end(drag("b", (Stage::New, 0), Some((Stage::Lost, 0))));
        controller.settle().await;

        assert_eq!(controller.board().lead_ids(), before);
    }
}
