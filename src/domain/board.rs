use crate::domain::deal::{Deal, DealId, DealStage};
use crate::error::{NexusError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-stage ordering of the deal board.
///
/// Every stage always has a (possibly empty) column. Each loaded deal id
/// appears in exactly one column, exactly once, and that column is the
/// deal's stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOrder {
    columns: BTreeMap<DealStage, Vec<DealId>>,
}

impl StageOrder {
    /// Creates an order with every stage column empty
    pub fn new() -> Self {
        Self {
            columns: DealStage::ALL
                .into_iter()
                .map(|stage| (stage, Vec::new()))
                .collect(),
        }
    }

    /// Builds the order by grouping deals per stage, keeping input order.
    ///
    /// A repeated id is filed once, at its first position, under the stage
    /// of its last record.
    pub fn from_deals(deals: &[Deal]) -> Self {
        let mut last_stage: HashMap<&DealId, DealStage> = HashMap::with_capacity(deals.len());
        for deal in deals {
            last_stage.insert(&deal.id, deal.stage);
        }

        let mut order = Self::new();
        for deal in deals {
            if let Some(stage) = last_stage.remove(&deal.id) {
                order.column_mut(stage).push(deal.id.clone());
            }
        }
        order
    }

    /// Ids in a stage column, in board order
    pub fn column(&self, stage: DealStage) -> &[DealId] {
        self.columns.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    fn column_mut(&mut self, stage: DealStage) -> &mut Vec<DealId> {
        self.columns.entry(stage).or_default()
    }

    /// Iterates over all columns in pipeline order
    pub fn iter(&self) -> impl Iterator<Item = (DealStage, &[DealId])> {
        self.columns
            .iter()
            .map(|(stage, ids)| (*stage, ids.as_slice()))
    }

    /// Total number of ids across all columns
    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the stage whose column holds the id
    pub fn stage_of(&self, deal_id: &DealId) -> Option<DealStage> {
        self.columns
            .iter()
            .find(|(_, ids)| ids.contains(deal_id))
            .map(|(stage, _)| *stage)
    }

    /// Position of the id within a stage column
    pub fn position(&self, stage: DealStage, deal_id: &DealId) -> Option<usize> {
        self.column(stage).iter().position(|id| id == deal_id)
    }

    /// Moves an id from one stage column into another.
    ///
    /// The id is removed from `from` and inserted into `to` at `new_index`,
    /// clamped to `[0, len]`. Same-stage moves are rejected; use
    /// [`StageOrder::reorder`] for those.
    pub fn move_deal(
        &mut self,
        deal_id: &DealId,
        from: DealStage,
        to: DealStage,
        new_index: usize,
    ) -> Result<()> {
        if from == to {
            return Err(NexusError::SameStageMove {
                deal: deal_id.to_string(),
                stage: from.to_string(),
            });
        }

        let old_index =
            self.position(from, deal_id)
                .ok_or_else(|| NexusError::DealNotInStage {
                    deal: deal_id.to_string(),
                    stage: from.to_string(),
                })?;

        let id = self.column_mut(from).remove(old_index);
        let target = self.column_mut(to);
        let index = new_index.min(target.len());
        target.insert(index, id);
        Ok(())
    }

    /// Reorders an id within a single stage column.
    ///
    /// Returns `Ok(false)` without touching the column when the indices are
    /// equal. `new_index` is clamped to `[0, len - 1]`.
    pub fn reorder(&mut self, stage: DealStage, old_index: usize, new_index: usize) -> Result<bool> {
        let len = self.column(stage).len();
        if old_index >= len {
            return Err(NexusError::IndexOutOfBounds {
                stage: stage.to_string(),
                index: old_index,
                len,
            });
        }
        if old_index == new_index {
            return Ok(false);
        }

        let column = self.column_mut(stage);
        let id = column.remove(old_index);
        let index = new_index.min(column.len());
        column.insert(index, id);
        Ok(true)
    }

    /// Keeps only ids accepted by the predicate, preserving order
    pub fn retain(&self, mut keep: impl FnMut(DealStage, &DealId) -> bool) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(stage, ids)| {
                    let kept = ids.iter().filter(|id| keep(*stage, *id)).cloned().collect();
                    (*stage, kept)
                })
                .collect(),
        }
    }

    /// Checks the order against the loaded deals.
    ///
    /// Fails when an id is duplicated, missing, unknown, or filed under a
    /// stage other than the deal's own.
    pub fn validate(&self, deals: &[Deal]) -> Result<()> {
        let mut seen: HashSet<&DealId> = HashSet::new();
        for (stage, ids) in self.iter() {
            for id in ids {
                if !seen.insert(id) {
                    return Err(NexusError::OrderInconsistent(format!(
                        "deal {} appears more than once",
                        id
                    )));
                }
                match deals.iter().find(|deal| &deal.id == id) {
                    None => {
                        return Err(NexusError::OrderInconsistent(format!(
                            "deal {} is ordered but not loaded",
                            id
                        )))
                    }
                    Some(deal) if deal.stage != stage => {
                        return Err(NexusError::OrderInconsistent(format!(
                            "deal {} is filed under {} but its stage is {}",
                            id, stage, deal.stage
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        if let Some(missing) = deals.iter().find(|deal| !seen.contains(&deal.id)) {
            return Err(NexusError::OrderInconsistent(format!(
                "deal {} is loaded but not ordered",
                missing.id
            )));
        }
        Ok(())
    }
}

/// Collapses repeated deal ids: the last record wins and keeps the
/// position of the first.
pub fn dedupe_deals(deals: Vec<Deal>) -> Vec<Deal> {
    let mut slots: HashMap<DealId, usize> = HashMap::with_capacity(deals.len());
    let mut unique: Vec<Deal> = Vec::with_capacity(deals.len());
    for deal in deals {
        match slots.get(&deal.id) {
            Some(&slot) => unique[slot] = deal,
            None => {
                slots.insert(deal.id.clone(), unique.len());
                unique.push(deal);
            }
        }
    }
    unique
}

impl Default for StageOrder {
    fn default() -> Self {
        Self::new()
    }
}
