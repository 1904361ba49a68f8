//! Board-level types: Board, BoardMember, List, Label, CustomField

use super::ids::{BoardId, CustomFieldId, LabelId, ListId, UserId, WorkspaceId};
use super::role::{BoardRole, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project board inside a workspace. Owns lists, members, labels, and
/// custom field definitions. Name is unique within its workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub visibility: Visibility,
    pub owner_id: UserId,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Board {
    /// Create a new board with [`Visibility::Workspace`]
    pub fn new(workspace_id: WorkspaceId, name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            id: BoardId::new(),
            workspace_id,
            name: name.into(),
            visibility: Visibility::Workspace,
            owner_id,
            is_archived: false,
            archived_at: None,
        }
    }

    /// Override the visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// The lists a freshly created board is seeded with
    pub fn default_lists(board_id: &BoardId) -> Vec<List> {
        ["To Do", "Doing", "Done"]
            .iter()
            .enumerate()
            .map(|(order, name)| List {
                id: ListId::new(),
                board_id: board_id.clone(),
                name: (*name).into(),
                order,
                is_archived: false,
                archived_at: None,
            })
            .collect()
    }
}

/// Membership row joining a user to a board with a board-level role.
/// (board_id, user_id) is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardMember {
    pub board_id: BoardId,
    pub user_id: UserId,
    pub role: BoardRole,
}

impl BoardMember {
    /// Create a membership row
    pub fn new(board_id: BoardId, user_id: UserId, role: BoardRole) -> Self {
        Self {
            board_id,
            user_id,
            role,
        }
    }
}

/// An ordered column of cards on a board.
///
/// `order` values of the non-deleted lists of a board are always the dense
/// sequence `0..n`, maintained by the ordering engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub name: String,
    pub order: usize,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl List {
    /// Create a list at the given order slot
    pub fn new(board_id: BoardId, name: impl Into<String>, order: usize) -> Self {
        Self {
            id: ListId::new(),
            board_id,
            name: name.into(),
            order,
            is_archived: false,
            archived_at: None,
        }
    }
}

/// A board-scoped label that cards can carry.
///
/// Color defaults to a deterministic auto-color based on the name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub board_id: BoardId,
    pub name: String,
    /// 6-character hex color code without `#`
    pub color: String,
}

impl Label {
    /// Create a label with the auto-assigned color for its name
    pub fn new(board_id: BoardId, name: impl Into<String>) -> Self {
        let name = name.into();
        let color = crate::auto_color::label_color(&name).to_string();
        Self {
            id: LabelId::new(),
            board_id,
            name,
            color,
        }
    }

    /// Create a label with an explicit color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// What values a custom field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldKind {
    Text,
    Number,
    Date,
    Checkbox,
}

/// A board-scoped custom field definition. Cards store one value per field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomField {
    pub id: CustomFieldId,
    pub board_id: BoardId,
    pub name: String,
    pub kind: CustomFieldKind,
}

impl CustomField {
    /// Create a custom field definition
    pub fn new(board_id: BoardId, name: impl Into<String>, kind: CustomFieldKind) -> Self {
        Self {
            id: CustomFieldId::new(),
            board_id,
            name: name.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(
            WorkspaceId::from_string("w1"),
            "Launch",
            UserId::from_string("alice"),
        )
    }

    #[test]
    fn test_board_creation() {
        let b = board();
        assert_eq!(b.name, "Launch");
        assert_eq!(b.visibility, Visibility::Workspace);
        assert!(!b.is_archived);
        assert!(b.archived_at.is_none());
    }

    #[test]
    fn test_board_visibility_override() {
        let b = board().with_visibility(Visibility::Private);
        assert_eq!(b.visibility, Visibility::Private);
    }

    #[test]
    fn test_default_lists_are_dense() {
        let lists = Board::default_lists(&BoardId::from_string("b1"));
        assert_eq!(lists.len(), 3);
        assert_eq!(lists[0].name, "To Do");
        assert_eq!(lists[2].name, "Done");
        let orders: Vec<usize> = lists.iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_label_auto_color() {
        let label = Label::new(BoardId::from_string("b1"), "urgent");
        assert_eq!(label.color.len(), 6);
        let explicit = Label::new(BoardId::from_string("b1"), "urgent").with_color("ff0000");
        assert_eq!(explicit.color, "ff0000");
    }

    #[test]
    fn test_board_serialization() {
        let b = board();
        let json = serde_json::to_string(&b).unwrap();
        let parsed: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, b.name);
        // archived_at is omitted entirely while unset
        assert!(!json.contains("archived_at"));
    }
}
