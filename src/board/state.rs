//! In-memory snapshot of the lead pipeline.
//!
//! `BoardState` holds one ordered lead list per [`Stage`]. A lead id appears in
//! exactly one list at any time, and the union of all lists is the set of
//! leads most recently loaded from the backend.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use super::models::{BoardSnapshot, Lead, LeadId, PendingMove, ProductTag, Slot, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BoardState {
    columns: BTreeMap<Stage, Vec<Lead>>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            columns: Stage::ALL.into_iter().map(|s| (s, Vec::new())).collect(),
        }
    }
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state straight from a snapshot.
    pub fn from_snapshot(snapshot: BoardSnapshot) -> Self {
        let mut state = Self::default();
        state.load(snapshot);
        state
    }

    /// Replace the entire board with `snapshot`.
    ///
    /// Stages absent from the snapshot become empty. A lead id listed more than
    /// once keeps its first occurrence (column order, then list order).
    pub fn load(&mut self, mut snapshot: BoardSnapshot) {
        let mut seen: HashSet<LeadId> = HashSet::new();
        let mut columns = BTreeMap::new();

        for stage in Stage::ALL {
            let incoming = snapshot.remove(&stage).unwrap_or_default();
            let mut kept = Vec::with_capacity(incoming.len());
            for lead in incoming {
                if seen.insert(lead.id.clone()) {
                    kept.push(lead);
                } else {
                    warn!(lead_id = %lead.id, stage = %stage, "dropping duplicate lead from board payload");
                }
            }
            columns.insert(stage, kept);
        }

        debug!(leads = seen.len(), "board loaded");
        self.columns = columns;
    }

    /// Return a new state with the lead moved to `mv.dest`.
    ///
    /// The lead is located by id; `mv.source` is only a hint. The destination
    /// index is clamped to the column bounds after removal. An unknown lead id
    /// yields an unchanged copy.
    pub fn move_lead(&self, mv: &PendingMove) -> BoardState {
        let mut next = self.clone();

        let Some(from) = self.position_of(&mv.lead_id) else {
            warn!(lead_id = %mv.lead_id, "move requested for lead not on the board");
            return next;
        };
        if from != mv.source {
            debug!(
                lead_id = %mv.lead_id,
                reported = ?mv.source,
                actual = ?from,
                "drag source disagrees with board; using actual position"
            );
        }

        let lead = match next.columns.get_mut(&from.stage) {
            Some(column) => column.remove(from.index),
            None => return next,
        };

        let dest = next.columns.entry(mv.dest.stage).or_default();
        let index = mv.dest.index.min(dest.len());
        dest.insert(index, lead);
        next
    }

    /// Where the lead would land for a drop at `dest`, after clamping.
    pub fn effective_slot(&self, lead_id: &LeadId, dest: Slot) -> Slot {
        let len = self.column(dest.stage).len();
        let len_after_removal = match self.stage_of(lead_id) {
            Some(stage) if stage == dest.stage => len.saturating_sub(1),
            _ => len,
        };
        Slot::new(dest.stage, dest.index.min(len_after_removal))
    }

    pub fn column(&self, stage: Stage) -> &[Lead] {
        self.columns.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn columns(&self) -> impl Iterator<Item = (Stage, &[Lead])> {
        self.columns.iter().map(|(s, leads)| (*s, leads.as_slice()))
    }

    pub fn position_of(&self, lead_id: &LeadId) -> Option<Slot> {
        self.columns.iter().find_map(|(stage, leads)| {
            leads
                .iter()
                .position(|l| &l.id == lead_id)
                .map(|index| Slot::new(*stage, index))
        })
    }

    pub fn stage_of(&self, lead_id: &LeadId) -> Option<Stage> {
        self.position_of(lead_id).map(|slot| slot.stage)
    }

    pub fn lead(&self, lead_id: &LeadId) -> Option<&Lead> {
        self.columns
            .values()
            .flat_map(|leads| leads.iter())
            .find(|l| &l.id == lead_id)
    }

    /// Every lead id on the board, sorted. Duplicates would show up here.
    pub fn lead_ids(&self) -> Vec<LeadId> {
        let mut ids: Vec<LeadId> = self
            .columns
            .values()
            .flat_map(|leads| leads.iter().map(|l| l.id.clone()))
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record confirmed products on a lead. Returns false if the lead is unknown.
    pub fn attach_products(&mut self, lead_id: &LeadId, products: Vec<ProductTag>) -> bool {
        let lead = self
            .columns
            .values_mut()
            .flat_map(|leads| leads.iter_mut())
            .find(|l| &l.id == lead_id);
        match lead {
            Some(lead) => {
                lead.products = products;
                true
            }
            None => false,
        }
    }
}
