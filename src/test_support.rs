//! Test doubles for the consumed collaborator interfaces.
//!
//! Available to this crate's own tests and, behind the `test-support`
//! feature, to integration tests and downstream crates. The in-memory
//! repository enforces the same contracts a production implementation must:
//! atomic batches, dense per-parent ordering, referential integrity - so a
//! service bug that would trip a database constraint trips here too.

use crate::activity::ActivityEntry;
use crate::error::{BoardwalkError, Result};
use crate::repo::{ActivityLogger, BoardCache, EntityRepository, WriteBatch, WriteOp};
use crate::types::{
    Board, BoardChain, BoardId, BoardMember, BoardRole, Card, CardChain, CardId, Checklist,
    ChecklistChain, ChecklistId, ChecklistItem, ChecklistItemId, CustomField, CustomFieldId,
    ItemChain, ItemCompletion, Label, LabelId, List, ListChain, ListId, UserId, Visibility,
    Workspace, WorkspaceChain, WorkspaceId, WorkspaceMember, WorkspaceRole,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory state behind [`MemoryRepository`]
#[derive(Debug, Default, Clone)]
struct State {
    workspaces: HashMap<WorkspaceId, Workspace>,
    workspace_members: Vec<WorkspaceMember>,
    boards: HashMap<BoardId, Board>,
    board_members: Vec<BoardMember>,
    labels: HashMap<LabelId, Label>,
    custom_fields: HashMap<CustomFieldId, CustomField>,
    lists: HashMap<ListId, List>,
    cards: HashMap<CardId, Card>,
    checklists: HashMap<ChecklistId, Checklist>,
    items: HashMap<ChecklistItemId, ChecklistItem>,
    completions: Vec<ItemCompletion>,
}

/// In-memory [`EntityRepository`] with all-or-nothing commits.
///
/// `commit` applies the batch to a scratch copy, verifies the ordering and
/// referential-integrity invariants, and only then swaps the state in. A
/// rejected batch leaves the repository exactly as it was.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for fixtures; these bypass batch validation on purpose
    // so tests can construct arbitrary starting states.

    pub fn put_workspace(&self, workspace: Workspace) {
        self.state
            .lock()
            .unwrap()
            .workspaces
            .insert(workspace.id.clone(), workspace);
    }

    pub fn put_workspace_member(&self, member: WorkspaceMember) {
        let mut state = self.state.lock().unwrap();
        state
            .workspace_members
            .retain(|m| !(m.workspace_id == member.workspace_id && m.user_id == member.user_id));
        state.workspace_members.push(member);
    }

    pub fn put_board(&self, board: Board) {
        self.state
            .lock()
            .unwrap()
            .boards
            .insert(board.id.clone(), board);
    }

    pub fn put_board_member(&self, member: BoardMember) {
        let mut state = self.state.lock().unwrap();
        state
            .board_members
            .retain(|m| !(m.board_id == member.board_id && m.user_id == member.user_id));
        state.board_members.push(member);
    }

    pub fn put_label(&self, label: Label) {
        self.state
            .lock()
            .unwrap()
            .labels
            .insert(label.id.clone(), label);
    }

    pub fn put_custom_field(&self, field: CustomField) {
        self.state
            .lock()
            .unwrap()
            .custom_fields
            .insert(field.id.clone(), field);
    }

    pub fn put_list(&self, list: List) {
        self.state.lock().unwrap().lists.insert(list.id.clone(), list);
    }

    pub fn put_card(&self, card: Card) {
        self.state.lock().unwrap().cards.insert(card.id.clone(), card);
    }

    pub fn put_checklist(&self, checklist: Checklist) {
        self.state
            .lock()
            .unwrap()
            .checklists
            .insert(checklist.id.clone(), checklist);
    }

    pub fn put_item(&self, item: ChecklistItem) {
        self.state.lock().unwrap().items.insert(item.id.clone(), item);
    }

    /// Read a card back (test assertions)
    pub fn get_card(&self, id: &CardId) -> Option<Card> {
        self.state.lock().unwrap().cards.get(id).cloned()
    }

    /// Read a list back (test assertions)
    pub fn get_list(&self, id: &ListId) -> Option<List> {
        self.state.lock().unwrap().lists.get(id).cloned()
    }

    /// Read an item back (test assertions)
    pub fn get_item(&self, id: &ChecklistItemId) -> Option<ChecklistItem> {
        self.state.lock().unwrap().items.get(id).cloned()
    }

    /// Read a checklist back (test assertions)
    pub fn get_checklist(&self, id: &ChecklistId) -> Option<Checklist> {
        self.state.lock().unwrap().checklists.get(id).cloned()
    }

    /// Current workspace member rows (test assertions)
    pub fn workspace_members_of(&self, id: &WorkspaceId) -> Vec<WorkspaceMember> {
        self.state
            .lock()
            .unwrap()
            .workspace_members
            .iter()
            .filter(|m| &m.workspace_id == id)
            .cloned()
            .collect()
    }

    /// Current board member rows (test assertions)
    pub fn board_members_of(&self, id: &BoardId) -> Vec<BoardMember> {
        self.state
            .lock()
            .unwrap()
            .board_members
            .iter()
            .filter(|m| &m.board_id == id)
            .cloned()
            .collect()
    }

    fn board_chain_locked(state: &State, id: &BoardId) -> Result<BoardChain> {
        let board = state
            .boards
            .get(id)
            .cloned()
            .ok_or_else(|| BoardwalkError::BoardNotFound { id: id.to_string() })?;
        let workspace = state
            .workspaces
            .get(&board.workspace_id)
            .cloned()
            .ok_or_else(|| BoardwalkError::storage(format!("board {} has no workspace", id)))?;
        Ok(BoardChain {
            board_members: state
                .board_members
                .iter()
                .filter(|m| &m.board_id == id)
                .cloned()
                .collect(),
            workspace_members: state
                .workspace_members
                .iter()
                .filter(|m| m.workspace_id == workspace.id)
                .cloned()
                .collect(),
            board,
            workspace,
        })
    }

    fn list_chain_locked(state: &State, id: &ListId) -> Result<ListChain> {
        let list = state
            .lists
            .get(id)
            .cloned()
            .ok_or_else(|| BoardwalkError::ListNotFound { id: id.to_string() })?;
        let board = Self::board_chain_locked(state, &list.board_id)?;
        Ok(ListChain { list, board })
    }

    fn card_chain_locked(state: &State, id: &CardId) -> Result<CardChain> {
        let card = state
            .cards
            .get(id)
            .cloned()
            .ok_or_else(|| BoardwalkError::CardNotFound { id: id.to_string() })?;
        let list_chain = Self::list_chain_locked(state, &card.list_id)?;
        Ok(CardChain {
            card,
            list: list_chain.list,
            board: list_chain.board,
        })
    }

    /// Validate the invariants a relational schema would enforce with
    /// constraints: dense unique orders per parent, no dangling parents, and
    /// card.board_id in sync with its list.
    fn validate(state: &State) -> Result<()> {
        for list in state.lists.values() {
            if !state.boards.contains_key(&list.board_id) {
                return Err(BoardwalkError::storage(format!(
                    "list {} references missing board {}",
                    list.id, list.board_id
                )));
            }
        }
        for card in state.cards.values() {
            let Some(list) = state.lists.get(&card.list_id) else {
                return Err(BoardwalkError::storage(format!(
                    "card {} references missing list {}",
                    card.id, card.list_id
                )));
            };
            if list.board_id != card.board_id {
                return Err(BoardwalkError::storage(format!(
                    "card {} board_id out of sync with its list",
                    card.id
                )));
            }
        }
        for checklist in state.checklists.values() {
            if !state.cards.contains_key(&checklist.card_id) {
                return Err(BoardwalkError::storage(format!(
                    "checklist {} references missing card {}",
                    checklist.id, checklist.card_id
                )));
            }
        }
        for item in state.items.values() {
            if !state.checklists.contains_key(&item.checklist_id) {
                return Err(BoardwalkError::storage(format!(
                    "item {} references missing checklist {}",
                    item.id, item.checklist_id
                )));
            }
        }
        for completion in &state.completions {
            if !state.items.contains_key(&completion.item_id) {
                return Err(BoardwalkError::storage(format!(
                    "completion references missing item {}",
                    completion.item_id
                )));
            }
        }

        let mut by_board: HashMap<&BoardId, Vec<usize>> = HashMap::new();
        for list in state.lists.values() {
            by_board.entry(&list.board_id).or_default().push(list.order);
        }
        for (board_id, orders) in by_board {
            check_dense(orders)
                .map_err(|msg| BoardwalkError::storage(format!("lists of board {}: {}", board_id, msg)))?;
        }

        let mut by_list: HashMap<&ListId, Vec<usize>> = HashMap::new();
        for card in state.cards.values() {
            by_list.entry(&card.list_id).or_default().push(card.order);
        }
        for (list_id, orders) in by_list {
            check_dense(orders)
                .map_err(|msg| BoardwalkError::storage(format!("cards of list {}: {}", list_id, msg)))?;
        }

        let mut by_card: HashMap<&CardId, Vec<usize>> = HashMap::new();
        for checklist in state.checklists.values() {
            by_card.entry(&checklist.card_id).or_default().push(checklist.order);
        }
        for (card_id, orders) in by_card {
            check_dense(orders).map_err(|msg| {
                BoardwalkError::storage(format!("checklists of card {}: {}", card_id, msg))
            })?;
        }

        let mut by_checklist: HashMap<&ChecklistId, Vec<usize>> = HashMap::new();
        for item in state.items.values() {
            by_checklist.entry(&item.checklist_id).or_default().push(item.order);
        }
        for (checklist_id, orders) in by_checklist {
            check_dense(orders).map_err(|msg| {
                BoardwalkError::storage(format!("items of checklist {}: {}", checklist_id, msg))
            })?;
        }

        Ok(())
    }

    fn apply(state: &mut State, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::InsertList(list) => {
                if state.lists.insert(list.id.clone(), list).is_some() {
                    return Err(BoardwalkError::storage("duplicate list id on insert"));
                }
            }
            WriteOp::UpdateList(list) => {
                if state.lists.insert(list.id.clone(), list).is_none() {
                    return Err(BoardwalkError::storage("update of missing list"));
                }
            }
            WriteOp::DeleteList(id) => {
                if state.lists.remove(&id).is_none() {
                    return Err(BoardwalkError::storage("delete of missing list"));
                }
            }
            WriteOp::InsertCard(card) => {
                if state.cards.insert(card.id.clone(), card).is_some() {
                    return Err(BoardwalkError::storage("duplicate card id on insert"));
                }
            }
            WriteOp::UpdateCard(card) => {
                if state.cards.insert(card.id.clone(), card).is_none() {
                    return Err(BoardwalkError::storage("update of missing card"));
                }
            }
            WriteOp::DeleteCard(id) => {
                if state.cards.remove(&id).is_none() {
                    return Err(BoardwalkError::storage("delete of missing card"));
                }
            }
            WriteOp::InsertChecklist(checklist) => {
                if state
                    .checklists
                    .insert(checklist.id.clone(), checklist)
                    .is_some()
                {
                    return Err(BoardwalkError::storage("duplicate checklist id on insert"));
                }
            }
            WriteOp::UpdateChecklist(checklist) => {
                if state
                    .checklists
                    .insert(checklist.id.clone(), checklist)
                    .is_none()
                {
                    return Err(BoardwalkError::storage("update of missing checklist"));
                }
            }
            WriteOp::DeleteChecklist(id) => {
                if state.checklists.remove(&id).is_none() {
                    return Err(BoardwalkError::storage("delete of missing checklist"));
                }
            }
            WriteOp::InsertItem(item) => {
                if state.items.insert(item.id.clone(), item).is_some() {
                    return Err(BoardwalkError::storage("duplicate item id on insert"));
                }
            }
            WriteOp::UpdateItem(item) => {
                if state.items.insert(item.id.clone(), item).is_none() {
                    return Err(BoardwalkError::storage("update of missing item"));
                }
            }
            WriteOp::DeleteItem(id) => {
                if state.items.remove(&id).is_none() {
                    return Err(BoardwalkError::storage("delete of missing item"));
                }
            }
            WriteOp::UpsertCompletion(completion) => {
                state
                    .completions
                    .retain(|c| !(c.item_id == completion.item_id && c.user_id == completion.user_id));
                state.completions.push(completion);
            }
            WriteOp::DeleteCompletion { item_id, user_id } => {
                state
                    .completions
                    .retain(|c| !(c.item_id == item_id && c.user_id == user_id));
            }
            WriteOp::ReassignListOrders { board_id, plan } => {
                for r in plan {
                    let list = state
                        .lists
                        .get_mut(&r.id)
                        .filter(|l| l.board_id == board_id)
                        .ok_or_else(|| BoardwalkError::storage("reassign of unknown list"))?;
                    list.order = r.order;
                }
            }
            WriteOp::ReassignCardOrders { list_id, plan } => {
                for r in plan {
                    let card = state
                        .cards
                        .get_mut(&r.id)
                        .filter(|c| c.list_id == list_id)
                        .ok_or_else(|| BoardwalkError::storage("reassign of unknown card"))?;
                    card.order = r.order;
                }
            }
            WriteOp::ReassignChecklistOrders { card_id, plan } => {
                for r in plan {
                    let checklist = state
                        .checklists
                        .get_mut(&r.id)
                        .filter(|c| c.card_id == card_id)
                        .ok_or_else(|| BoardwalkError::storage("reassign of unknown checklist"))?;
                    checklist.order = r.order;
                }
            }
            WriteOp::ReassignItemOrders { checklist_id, plan } => {
                for r in plan {
                    let item = state
                        .items
                        .get_mut(&r.id)
                        .filter(|i| i.checklist_id == checklist_id)
                        .ok_or_else(|| BoardwalkError::storage("reassign of unknown item"))?;
                    item.order = r.order;
                }
            }
            WriteOp::UpdateWorkspace(workspace) => {
                if state
                    .workspaces
                    .insert(workspace.id.clone(), workspace)
                    .is_none()
                {
                    return Err(BoardwalkError::storage("update of missing workspace"));
                }
            }
            WriteOp::UpsertWorkspaceMember(member) => {
                state.workspace_members.retain(|m| {
                    !(m.workspace_id == member.workspace_id && m.user_id == member.user_id)
                });
                state.workspace_members.push(member);
            }
            WriteOp::DeleteWorkspaceMember { workspace_id, user_id } => {
                let before = state.workspace_members.len();
                state
                    .workspace_members
                    .retain(|m| !(m.workspace_id == workspace_id && m.user_id == user_id));
                if state.workspace_members.len() == before {
                    return Err(BoardwalkError::storage("delete of missing workspace member"));
                }
            }
            WriteOp::UpsertBoardMember(member) => {
                state
                    .board_members
                    .retain(|m| !(m.board_id == member.board_id && m.user_id == member.user_id));
                state.board_members.push(member);
            }
            WriteOp::DeleteBoardMember { board_id, user_id } => {
                let before = state.board_members.len();
                state
                    .board_members
                    .retain(|m| !(m.board_id == board_id && m.user_id == user_id));
                if state.board_members.len() == before {
                    return Err(BoardwalkError::storage("delete of missing board member"));
                }
            }
        }
        Ok(())
    }
}

fn check_dense(mut orders: Vec<usize>) -> std::result::Result<(), String> {
    orders.sort_unstable();
    for (index, order) in orders.iter().enumerate() {
        if *order != index {
            return Err(format!("orders not dense at index {}: {:?}", index, orders));
        }
    }
    Ok(())
}

#[async_trait]
impl EntityRepository for MemoryRepository {
    async fn workspace_chain(&self, id: &WorkspaceId) -> Result<WorkspaceChain> {
        let state = self.state.lock().unwrap();
        let workspace = state
            .workspaces
            .get(id)
            .cloned()
            .ok_or_else(|| BoardwalkError::WorkspaceNotFound { id: id.to_string() })?;
        Ok(WorkspaceChain {
            members: state
                .workspace_members
                .iter()
                .filter(|m| &m.workspace_id == id)
                .cloned()
                .collect(),
            workspace,
        })
    }

    async fn board_chain(&self, id: &BoardId) -> Result<BoardChain> {
        Self::board_chain_locked(&self.state.lock().unwrap(), id)
    }

    async fn list_chain(&self, id: &ListId) -> Result<ListChain> {
        Self::list_chain_locked(&self.state.lock().unwrap(), id)
    }

    async fn card_chain(&self, id: &CardId) -> Result<CardChain> {
        Self::card_chain_locked(&self.state.lock().unwrap(), id)
    }

    async fn checklist_chain(&self, id: &ChecklistId) -> Result<ChecklistChain> {
        let state = self.state.lock().unwrap();
        let checklist = state
            .checklists
            .get(id)
            .cloned()
            .ok_or_else(|| BoardwalkError::ChecklistNotFound { id: id.to_string() })?;
        let card_chain = Self::card_chain_locked(&state, &checklist.card_id)?;
        Ok(ChecklistChain {
            checklist,
            card: card_chain.card,
            list: card_chain.list,
            board: card_chain.board,
        })
    }

    async fn item_chain(&self, id: &ChecklistItemId) -> Result<ItemChain> {
        let state = self.state.lock().unwrap();
        let item = state
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| BoardwalkError::ItemNotFound { id: id.to_string() })?;
        let checklist = state
            .checklists
            .get(&item.checklist_id)
            .cloned()
            .ok_or_else(|| BoardwalkError::storage("item has no checklist"))?;
        let card_chain = Self::card_chain_locked(&state, &checklist.card_id)?;
        Ok(ItemChain {
            item,
            checklist,
            card: card_chain.card,
            list: card_chain.list,
            board: card_chain.board,
        })
    }

    async fn lists_in_board(&self, board_id: &BoardId) -> Result<Vec<List>> {
        let state = self.state.lock().unwrap();
        let mut lists: Vec<List> = state
            .lists
            .values()
            .filter(|l| &l.board_id == board_id)
            .cloned()
            .collect();
        lists.sort_by_key(|l| l.order);
        Ok(lists)
    }

    async fn cards_in_list(&self, list_id: &ListId) -> Result<Vec<Card>> {
        let state = self.state.lock().unwrap();
        let mut cards: Vec<Card> = state
            .cards
            .values()
            .filter(|c| &c.list_id == list_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.order);
        Ok(cards)
    }

    async fn checklists_in_card(&self, card_id: &CardId) -> Result<Vec<Checklist>> {
        let state = self.state.lock().unwrap();
        let mut checklists: Vec<Checklist> = state
            .checklists
            .values()
            .filter(|c| &c.card_id == card_id)
            .cloned()
            .collect();
        checklists.sort_by_key(|c| c.order);
        Ok(checklists)
    }

    async fn items_in_checklist(&self, checklist_id: &ChecklistId) -> Result<Vec<ChecklistItem>> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<ChecklistItem> = state
            .items
            .values()
            .filter(|i| &i.checklist_id == checklist_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.order);
        Ok(items)
    }

    async fn board_labels(&self, board_id: &BoardId) -> Result<Vec<Label>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .labels
            .values()
            .filter(|l| &l.board_id == board_id)
            .cloned()
            .collect())
    }

    async fn board_custom_fields(&self, board_id: &BoardId) -> Result<Vec<CustomField>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .custom_fields
            .values()
            .filter(|f| &f.board_id == board_id)
            .cloned()
            .collect())
    }

    async fn item_completions(&self, item_id: &ChecklistItemId) -> Result<Vec<ItemCompletion>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .completions
            .iter()
            .filter(|c| &c.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut scratch = state.clone();
        for op in batch {
            Self::apply(&mut scratch, op)?;
        }
        Self::validate(&scratch)?;
        *state = scratch;
        Ok(())
    }
}

/// Activity logger that records entries for assertions
#[derive(Debug, Default)]
pub struct RecordingActivityLogger {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl RecordingActivityLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded so far
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Actions recorded so far, in order
    pub fn actions(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }
}

#[async_trait]
impl ActivityLogger for RecordingActivityLogger {
    async fn record(&self, entry: ActivityEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

/// Activity logger that always fails, for verifying fire-and-forget behavior
#[derive(Debug, Default)]
pub struct FailingActivityLogger;

#[async_trait]
impl ActivityLogger for FailingActivityLogger {
    async fn record(&self, _entry: ActivityEntry) -> Result<()> {
        Err(BoardwalkError::storage("activity sink unavailable"))
    }
}

/// Cache double that counts invalidations per board
#[derive(Debug, Default)]
pub struct CountingCache {
    invalidations: Mutex<Vec<BoardId>>,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boards invalidated so far, in order
    pub fn invalidated(&self) -> Vec<BoardId> {
        self.invalidations.lock().unwrap().clone()
    }
}

#[async_trait]
impl BoardCache for CountingCache {
    async fn invalidate_board(&self, board_id: &BoardId) -> Result<()> {
        self.invalidations.lock().unwrap().push(board_id.clone());
        Ok(())
    }
}

/// A seeded workspace/board graph plus the service collaborators, so tests
/// read as scenarios instead of setup noise.
///
/// Layout: workspace "Acme" owned by `alice` (workspace Owner and board
/// Owner), board "Launch" with Workspace visibility and three lists
/// "To Do"/"Doing"/"Done".
pub struct BoardFixture {
    pub repo: Arc<MemoryRepository>,
    pub activity: Arc<RecordingActivityLogger>,
    pub cache: Arc<CountingCache>,
    pub workspace: Workspace,
    pub board: Board,
    pub lists: Vec<List>,
    pub owner: UserId,
}

impl BoardFixture {
    /// Build the standard fixture graph
    pub fn new() -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let owner = UserId::from_string("alice");
        let workspace = Workspace::new("Acme", "acme", owner.clone());
        let board = Board::new(workspace.id.clone(), "Launch", owner.clone());
        let lists = Board::default_lists(&board.id);

        repo.put_workspace(workspace.clone());
        repo.put_workspace_member(WorkspaceMember::new(
            workspace.id.clone(),
            owner.clone(),
            WorkspaceRole::Owner,
        ));
        repo.put_board(board.clone());
        repo.put_board_member(BoardMember::new(
            board.id.clone(),
            owner.clone(),
            BoardRole::Owner,
        ));
        for list in &lists {
            repo.put_list(list.clone());
        }

        Self {
            repo,
            activity: Arc::new(RecordingActivityLogger::new()),
            cache: Arc::new(CountingCache::new()),
            workspace,
            board,
            lists,
            owner,
        }
    }

    /// Add a workspace member
    pub fn with_workspace_member(self, user: &str, role: WorkspaceRole) -> Self {
        self.repo.put_workspace_member(WorkspaceMember::new(
            self.workspace.id.clone(),
            UserId::from_string(user),
            role,
        ));
        self
    }

    /// Add a board member
    pub fn with_board_member(self, user: &str, role: BoardRole) -> Self {
        self.repo.put_board_member(BoardMember::new(
            self.board.id.clone(),
            UserId::from_string(user),
            role,
        ));
        self
    }

    /// Change the board's visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.board.visibility = visibility;
        self.repo.put_board(self.board.clone());
        self
    }

    /// Seed a card at the end of the given list (by index into `lists`)
    pub fn seed_card(&self, list_index: usize, name: &str) -> Card {
        let list = &self.lists[list_index];
        let order = self
            .repo
            .state
            .lock()
            .unwrap()
            .cards
            .values()
            .filter(|c| c.list_id == list.id)
            .count();
        let card = Card::new(list.id.clone(), self.board.id.clone(), name, order);
        self.repo.put_card(card.clone());
        card
    }

    /// Seed a checklist at the end of the given card
    pub fn seed_checklist(&self, card: &Card, title: &str) -> Checklist {
        let order = self
            .repo
            .state
            .lock()
            .unwrap()
            .checklists
            .values()
            .filter(|c| c.card_id == card.id)
            .count();
        let checklist = Checklist::new(card.id.clone(), title, order);
        self.repo.put_checklist(checklist.clone());
        checklist
    }

    /// Seed an item at the end of the given checklist
    pub fn seed_item(&self, checklist: &Checklist, name: &str) -> ChecklistItem {
        let order = self
            .repo
            .state
            .lock()
            .unwrap()
            .items
            .values()
            .filter(|i| i.checklist_id == checklist.id)
            .count();
        let item = ChecklistItem::new(checklist.id.clone(), name, order);
        self.repo.put_item(item.clone());
        item
    }
}

impl Default for BoardFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::Reassignment;

    #[tokio::test]
    async fn test_commit_is_atomic() {
        let fixture = BoardFixture::new();
        let repo = &fixture.repo;

        // Batch whose second op fails: the first op must not stick
        let mut batch = WriteBatch::new();
        let list = List::new(fixture.board.id.clone(), "Blocked", 3);
        let doomed_id = list.id.clone();
        batch.push(WriteOp::InsertList(list));
        batch.push(WriteOp::DeleteCard(CardId::from_string("ghost")));

        assert!(repo.commit(batch).await.is_err());
        assert!(repo.get_list(&doomed_id).is_none());
    }

    #[tokio::test]
    async fn test_commit_rejects_order_gaps() {
        let fixture = BoardFixture::new();

        // Inserting a list at order 5 leaves a gap - the constraint trips
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertList(List::new(
            fixture.board.id.clone(),
            "Gap",
            5,
        )));
        let err = fixture.repo.commit(batch).await.unwrap_err();
        assert!(err.to_string().contains("not dense"));
    }

    #[tokio::test]
    async fn test_commit_rejects_dangling_completion() {
        let fixture = BoardFixture::new();
        let card = fixture.seed_card(0, "Card");
        let checklist = fixture.seed_checklist(&card, "QA");
        let item = fixture.seed_item(&checklist, "Step");

        // Deleting the item while a completion still references it violates
        // referential integrity
        let mut seed = WriteBatch::new();
        seed.push(WriteOp::UpsertCompletion(ItemCompletion::new(
            item.id.clone(),
            UserId::from_string("alice"),
        )));
        fixture.repo.commit(seed).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::DeleteItem(item.id.clone()));
        batch.push(WriteOp::ReassignItemOrders {
            checklist_id: checklist.id.clone(),
            plan: vec![],
        });
        assert!(fixture.repo.commit(batch).await.is_err());
    }

    #[tokio::test]
    async fn test_reassign_applies_plan() {
        let fixture = BoardFixture::new();
        let ids: Vec<ListId> = fixture.lists.iter().map(|l| l.id.clone()).collect();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::ReassignListOrders {
            board_id: fixture.board.id.clone(),
            plan: vec![
                Reassignment { id: ids[0].clone(), order: 2 },
                Reassignment { id: ids[2].clone(), order: 0 },
            ],
        });
        fixture.repo.commit(batch).await.unwrap();

        let lists = fixture.repo.lists_in_board(&fixture.board.id).await.unwrap();
        assert_eq!(lists[0].id, ids[2]);
        assert_eq!(lists[2].id, ids[0]);
    }

    #[tokio::test]
    async fn test_chain_loading() {
        let fixture = BoardFixture::new();
        let card = fixture.seed_card(1, "Chained");
        let chain = fixture.repo.card_chain(&card.id).await.unwrap();
        assert_eq!(chain.card.id, card.id);
        assert_eq!(chain.list.id, fixture.lists[1].id);
        assert_eq!(chain.board.board.id, fixture.board.id);
        assert_eq!(chain.board.workspace.id, fixture.workspace.id);
        assert_eq!(chain.board.workspace_members.len(), 1);
    }
}
