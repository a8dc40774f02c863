//! Drag-and-drop resolution for the deal board.
//!
//! A drag gesture picks up one deal card. When it ends, the view reports
//! what the card was dropped on and [`resolve_drag`] turns that into the
//! board mutation to apply, if any.

use crate::domain::board::StageOrder;
use crate::domain::deal::{DealId, DealStage};
use serde::{Deserialize, Serialize};

/// What a dragged card was released over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum DropTarget {
    /// A stage column, empty or not
    Column(DealStage),
    /// Another card on the board
    Card(DealId),
}

/// End of a drag gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub active: DealId,
    pub over: Option<DropTarget>,
}

impl DragEnd {
    pub fn new(active: DealId, over: Option<DropTarget>) -> Self {
        Self { active, over }
    }
}

/// Board mutation produced by a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardMove {
    Reorder {
        stage: DealStage,
        old_index: usize,
        new_index: usize,
    },
    Move {
        deal_id: DealId,
        from: DealStage,
        to: DealStage,
        new_index: usize,
    },
}

/// Resolves a drag-end event against the current order.
///
/// Returns `None` for drops with no target, drops onto the dragged card
/// itself, ids missing from the board, and same-position reorders.
pub fn resolve_drag(order: &StageOrder, event: &DragEnd) -> Option<BoardMove> {
    let over = event.over.as_ref()?;
    if matches!(over, DropTarget::Card(id) if *id == event.active) {
        return None;
    }

    let from = order.stage_of(&event.active)?;
    let to = match over {
        DropTarget::Column(stage) => *stage,
        DropTarget::Card(id) => order.stage_of(id)?,
    };

    if from == to {
        let old_index = order.position(from, &event.active)?;
        let new_index = match over {
            // Dropping on the card's own column sends it to the bottom
            DropTarget::Column(_) => order.column(from).len().saturating_sub(1),
            DropTarget::Card(id) => order.position(from, id)?,
        };
        if old_index == new_index {
            return None;
        }
        return Some(BoardMove::Reorder {
            stage: from,
            old_index,
            new_index,
        });
    }

    let new_index = match over {
        DropTarget::Column(_) => order.column(to).len(),
        DropTarget::Card(id) => order.position(to, id)?,
    };
    Some(BoardMove::Move {
        deal_id: event.active.clone(),
        from,
        to,
        new_index,
    })
}
