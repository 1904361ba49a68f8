//! Consumed collaborator interfaces: repository, activity log, cache.
//!
//! The kernel never talks to a database directly. Services read through the
//! chain/sibling queries below and write by committing one [`WriteBatch`] per
//! logical operation. Implementations must apply a batch atomically - a
//! partially applied reassignment plan corrupts the contiguity invariant -
//! and must enforce a per-parent uniqueness constraint on `order` so
//! invariant violations fail loudly. Serializing concurrent batches that
//! touch the same parent key (row locks, optimistic retry) is likewise the
//! implementation's contract; batches on different parents may run fully in
//! parallel.

use crate::activity::ActivityEntry;
use crate::error::Result;
use crate::ordering::Reassignment;
use crate::types::{
    BoardChain, BoardId, BoardMember, Card, CardChain, CardId, Checklist, ChecklistChain,
    ChecklistId, ChecklistItem, ChecklistItemId, CustomField, ItemChain, ItemCompletion, Label,
    List, ListChain, ListId, UserId, Workspace, WorkspaceChain, WorkspaceId, WorkspaceMember,
};
use async_trait::async_trait;

/// One write inside an atomic batch
#[derive(Debug, Clone)]
pub enum WriteOp {
    InsertList(List),
    UpdateList(List),
    DeleteList(ListId),

    InsertCard(Card),
    UpdateCard(Card),
    DeleteCard(CardId),

    InsertChecklist(Checklist),
    UpdateChecklist(Checklist),
    DeleteChecklist(ChecklistId),

    InsertItem(ChecklistItem),
    UpdateItem(ChecklistItem),
    DeleteItem(ChecklistItemId),

    UpsertCompletion(ItemCompletion),
    DeleteCompletion {
        item_id: ChecklistItemId,
        user_id: UserId,
    },

    /// Apply an ordering-engine plan to the lists of a board
    ReassignListOrders {
        board_id: BoardId,
        plan: Vec<Reassignment<ListId>>,
    },
    /// Apply an ordering-engine plan to the cards of a list
    ReassignCardOrders {
        list_id: ListId,
        plan: Vec<Reassignment<CardId>>,
    },
    /// Apply an ordering-engine plan to the checklists of a card
    ReassignChecklistOrders {
        card_id: CardId,
        plan: Vec<Reassignment<ChecklistId>>,
    },
    /// Apply an ordering-engine plan to the items of a checklist
    ReassignItemOrders {
        checklist_id: ChecklistId,
        plan: Vec<Reassignment<ChecklistItemId>>,
    },

    UpdateWorkspace(Workspace),
    UpsertWorkspaceMember(WorkspaceMember),
    DeleteWorkspaceMember {
        workspace_id: WorkspaceId,
        user_id: UserId,
    },

    UpsertBoardMember(BoardMember),
    DeleteBoardMember {
        board_id: BoardId,
        user_id: UserId,
    },
}

/// All writes of one logical operation, applied all-or-nothing
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a write
    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Number of writes in the batch
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch carries no writes
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate the writes in application order
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}

impl IntoIterator for WriteBatch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Transactional storage for the board hierarchy.
///
/// Chain loaders return the entity plus its full ownership path with both
/// membership tables; sibling queries return all non-deleted rows (archived
/// included - archived siblings keep their order slot) sorted ascending by
/// `order`.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn workspace_chain(&self, id: &WorkspaceId) -> Result<WorkspaceChain>;
    async fn board_chain(&self, id: &BoardId) -> Result<BoardChain>;
    async fn list_chain(&self, id: &ListId) -> Result<ListChain>;
    async fn card_chain(&self, id: &CardId) -> Result<CardChain>;
    async fn checklist_chain(&self, id: &ChecklistId) -> Result<ChecklistChain>;
    async fn item_chain(&self, id: &ChecklistItemId) -> Result<ItemChain>;

    async fn lists_in_board(&self, board_id: &BoardId) -> Result<Vec<List>>;
    async fn cards_in_list(&self, list_id: &ListId) -> Result<Vec<Card>>;
    async fn checklists_in_card(&self, card_id: &CardId) -> Result<Vec<Checklist>>;
    async fn items_in_checklist(&self, checklist_id: &ChecklistId) -> Result<Vec<ChecklistItem>>;

    async fn board_labels(&self, board_id: &BoardId) -> Result<Vec<Label>>;
    async fn board_custom_fields(&self, board_id: &BoardId) -> Result<Vec<CustomField>>;
    async fn item_completions(&self, item_id: &ChecklistItemId) -> Result<Vec<ItemCompletion>>;

    /// Apply every write in the batch inside one transaction
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// Fire-and-forget activity sink. Failures are logged by the caller and never
/// affect the primary operation.
#[async_trait]
pub trait ActivityLogger: Send + Sync {
    async fn record(&self, entry: ActivityEntry) -> Result<()>;
}

/// Best-effort cache invalidation, called after a successful commit
#[async_trait]
pub trait BoardCache: Send + Sync {
    async fn invalidate_board(&self, board_id: &BoardId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_batch_collects_in_order() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());

        batch.push(WriteOp::DeleteCard(CardId::from_string("c1")));
        batch.push(WriteOp::ReassignCardOrders {
            list_id: ListId::from_string("l1"),
            plan: vec![],
        });

        assert_eq!(batch.len(), 2);
        assert!(matches!(batch.ops()[0], WriteOp::DeleteCard(_)));
        assert!(matches!(batch.ops()[1], WriteOp::ReassignCardOrders { .. }));
    }
}
