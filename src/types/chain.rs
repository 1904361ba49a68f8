//! Loaded ownership chains used for permission resolution and archived guards.
//!
//! A chain is the path from an entity up to its workspace, loaded together
//! with both membership tables. Services fetch one chain per operation and
//! hand it to the permission resolver; nothing here touches storage.

use super::board::{Board, BoardMember, List};
use super::card::Card;
use super::checklist::{Checklist, ChecklistItem};
use super::ids::UserId;
use super::role::{BoardRole, WorkspaceRole};
use super::workspace::{Workspace, WorkspaceMember};

/// A node in a chain that is archived: `(resource, id)`.
pub type ArchivedNode = (&'static str, String);

/// A workspace loaded with its member rows
#[derive(Debug, Clone)]
pub struct WorkspaceChain {
    pub workspace: Workspace,
    pub members: Vec<WorkspaceMember>,
}

impl WorkspaceChain {
    /// The caller's workspace role, if any
    pub fn role(&self, user: &UserId) -> Option<WorkspaceRole> {
        self.members
            .iter()
            .find(|m| &m.user_id == user)
            .map(|m| m.role)
    }
}

/// Board → Workspace, with both member tables attached
#[derive(Debug, Clone)]
pub struct BoardChain {
    pub board: Board,
    pub workspace: Workspace,
    pub board_members: Vec<BoardMember>,
    pub workspace_members: Vec<WorkspaceMember>,
}

impl BoardChain {
    /// The caller's explicit board role, if any
    pub fn board_role(&self, user: &UserId) -> Option<BoardRole> {
        self.board_members
            .iter()
            .find(|m| &m.user_id == user)
            .map(|m| m.role)
    }

    /// The caller's workspace role, if any
    pub fn workspace_role(&self, user: &UserId) -> Option<WorkspaceRole> {
        self.workspace_members
            .iter()
            .find(|m| &m.user_id == user)
            .map(|m| m.role)
    }

    /// First archived node on this chain, outermost first
    pub fn archived_ancestor(&self) -> Option<ArchivedNode> {
        if self.board.is_archived {
            return Some(("board", self.board.id.to_string()));
        }
        None
    }
}

/// List → Board → Workspace
#[derive(Debug, Clone)]
pub struct ListChain {
    pub list: List,
    pub board: BoardChain,
}

impl ListChain {
    /// First archived node on this chain, outermost first
    pub fn archived_ancestor(&self) -> Option<ArchivedNode> {
        if let Some(node) = self.board.archived_ancestor() {
            return Some(node);
        }
        if self.list.is_archived {
            return Some(("list", self.list.id.to_string()));
        }
        None
    }
}

/// Card → List → Board → Workspace
#[derive(Debug, Clone)]
pub struct CardChain {
    pub card: Card,
    pub list: List,
    pub board: BoardChain,
}

impl CardChain {
    /// First archived node on this chain, outermost first
    pub fn archived_ancestor(&self) -> Option<ArchivedNode> {
        if let Some(node) = self.parent_archived() {
            return Some(node);
        }
        if self.card.is_archived {
            return Some(("card", self.card.id.to_string()));
        }
        None
    }

    /// First archived node strictly above the card. Restore uses this: a
    /// card cannot be un-archived while its list or board is archived.
    pub fn parent_archived(&self) -> Option<ArchivedNode> {
        if let Some(node) = self.board.archived_ancestor() {
            return Some(node);
        }
        if self.list.is_archived {
            return Some(("list", self.list.id.to_string()));
        }
        None
    }
}

/// Checklist → Card → List → Board → Workspace
#[derive(Debug, Clone)]
pub struct ChecklistChain {
    pub checklist: Checklist,
    pub card: Card,
    pub list: List,
    pub board: BoardChain,
}

impl ChecklistChain {
    /// First archived node on the card chain above this checklist
    pub fn archived_ancestor(&self) -> Option<ArchivedNode> {
        if let Some(node) = self.board.archived_ancestor() {
            return Some(node);
        }
        if self.list.is_archived {
            return Some(("list", self.list.id.to_string()));
        }
        if self.card.is_archived {
            return Some(("card", self.card.id.to_string()));
        }
        None
    }
}

/// ChecklistItem → Checklist → Card → List → Board → Workspace
#[derive(Debug, Clone)]
pub struct ItemChain {
    pub item: ChecklistItem,
    pub checklist: Checklist,
    pub card: Card,
    pub list: List,
    pub board: BoardChain,
}

impl ItemChain {
    /// First archived node on the card chain above this item
    pub fn archived_ancestor(&self) -> Option<ArchivedNode> {
        if let Some(node) = self.board.archived_ancestor() {
            return Some(node);
        }
        if self.list.is_archived {
            return Some(("list", self.list.id.to_string()));
        }
        if self.card.is_archived {
            return Some(("card", self.card.id.to_string()));
        }
        None
    }
}
