use crate::domain::{
    dedupe_deals, resolve_drag, BoardMove, Client, ClientId, Deal, DealId, DealStage, DragEnd, StageOrder,
};
use crate::error::{NexusError, Result};
use crate::remote::{BoardPayload, Collection, DataSource, FieldPatch, RemoteSync};
use crate::store::SyncHandle;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Snapshot of the deal pipeline board
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DealBoardState {
    pub deals: Vec<Deal>,
    pub clients: Vec<Client>,
    pub order: StageOrder,
}

impl DealBoardState {
    /// Builds a board whose order groups deals per stage in input order.
    ///
    /// Repeated deal ids keep their last record.
    pub fn new(deals: Vec<Deal>, clients: Vec<Client>) -> Self {
        let received = deals.len();
        let deals = dedupe_deals(deals);
        if deals.len() < received {
            warn!(dropped = received - deals.len(), "duplicate deal ids, keeping the last record");
        }
        let order = StageOrder::from_deals(&deals);
        Self {
            deals,
            clients,
            order,
        }
    }

    pub fn deal(&self, id: &DealId) -> Option<&Deal> {
        self.deals.iter().find(|deal| &deal.id == id)
    }

    pub fn client(&self, id: &ClientId) -> Option<&Client> {
        self.clients.iter().find(|client| &client.id == id)
    }

    /// Deals of one stage, in board order
    pub fn column_deals(&self, stage: DealStage) -> Vec<&Deal> {
        self.order
            .column(stage)
            .iter()
            .filter_map(|id| self.deal(id))
            .collect()
    }
}

/// Observable deal board.
///
/// Mutations apply synchronously and notify subscribers. Stage changes are
/// then pushed to the remote through the sync worker; position within a
/// column stays local.
pub struct DealStore {
    state: watch::Sender<Arc<DealBoardState>>,
    sync: SyncHandle,
}

impl DealStore {
    /// Creates an empty board
    pub fn new(sync: SyncHandle) -> Self {
        Self::with_state(DealBoardState::new(Vec::new(), Vec::new()), sync)
    }

    pub fn with_state(state: DealBoardState, sync: SyncHandle) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self { state: tx, sync }
    }

    /// Current board snapshot
    pub fn snapshot(&self) -> Arc<DealBoardState> {
        self.state.borrow().clone()
    }

    /// Receiver notified after every effective mutation
    pub fn subscribe(&self) -> watch::Receiver<Arc<DealBoardState>> {
        self.state.subscribe()
    }

    /// Replaces deals and clients and rebuilds the order index
    pub fn load(&self, deals: Vec<Deal>, clients: Vec<Client>) {
        debug!(deals = deals.len(), clients = clients.len(), "loading deal board");
        self.state.send_replace(Arc::new(DealBoardState::new(deals, clients)));
    }

    /// Loads the board from the remote, falling back to sample data
    pub async fn refresh(&self, remote: &RemoteSync) -> DataSource {
        let BoardPayload {
            deals,
            clients,
            source,
        } = remote.fetch_board().await;
        info!(source = ?source, deals = deals.len(), "deal board refreshed");
        self.load(deals, clients);
        source
    }

    /// Moves a deal into another stage at `new_index` (clamped).
    ///
    /// Fails with `SameStageMove` when both stages are equal and with
    /// `DealNotInStage` when the deal is not in `from`; the board is left
    /// untouched in both cases.
    pub fn move_deal(
        &self,
        deal_id: &DealId,
        from: DealStage,
        to: DealStage,
        new_index: usize,
    ) -> Result<()> {
        let mut outcome = Ok(None);
        self.state.send_if_modified(|state| {
            let mut order = state.order.clone();
            if let Err(err) = order.move_deal(deal_id, from, to, new_index) {
                outcome = Err(err);
                return false;
            }

            let board = Arc::make_mut(state);
            board.order = order;
            let updated_at = board
                .deals
                .iter_mut()
                .find(|deal| &deal.id == deal_id)
                .map(|deal| {
                    deal.set_stage(to);
                    deal.updated_at
                });
            outcome = Ok(updated_at);
            true
        });

        let updated_at = outcome?.unwrap_or_else(chrono::Utc::now);
        debug!(deal = %deal_id, from = %from, to = %to, "deal moved");

        let mut patch = FieldPatch::new();
        patch.insert("stage".to_string(), json!(to.as_str()));
        patch.insert("updatedAt".to_string(), json!(updated_at.to_rfc3339()));
        self.sync.enqueue_patch(Collection::Deals, deal_id.as_str(), patch);
        Ok(())
    }

    /// Reorders a deal within one stage column.
    ///
    /// Equal indices leave the snapshot untouched, including its `Arc`
    /// identity. Nothing is written remotely.
    pub fn reorder_deal(&self, stage: DealStage, old_index: usize, new_index: usize) -> Result<()> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            let len = state.order.column(stage).len();
            if old_index >= len {
                outcome = Err(NexusError::IndexOutOfBounds {
                    stage: stage.to_string(),
                    index: old_index,
                    len,
                });
                return false;
            }
            if old_index == new_index {
                return false;
            }

            let board = Arc::make_mut(state);
            match board.order.reorder(stage, old_index, new_index) {
                Ok(changed) => changed,
                Err(err) => {
                    outcome = Err(err);
                    false
                }
            }
        });
        outcome
    }

    /// Applies a finished drag gesture and returns the mutation it produced
    pub fn apply_drag(&self, event: &DragEnd) -> Result<Option<BoardMove>> {
        let resolved = resolve_drag(&self.snapshot().order, event);
        match &resolved {
            Some(BoardMove::Reorder {
                stage,
                old_index,
                new_index,
            }) => self.reorder_deal(*stage, *old_index, *new_index)?,
            Some(BoardMove::Move {
                deal_id,
                from,
                to,
                new_index,
            }) => self.move_deal(deal_id, *from, *to, *new_index)?,
            None => debug!(deal = %event.active, "drag ended without a board change"),
        }
        Ok(resolved)
    }
}
