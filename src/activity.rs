//! Activity records emitted after successful mutations

use crate::types::{ActivityId, BoardId, UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One activity record: who did what, where.
///
/// Emitted fire-and-forget after the primary transaction commits; a failed
/// activity write is logged and never rolls anything back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unique ID for this record
    pub id: ActivityId,

    /// When the operation occurred
    pub timestamp: DateTime<Utc>,

    /// Owning workspace
    pub workspace_id: WorkspaceId,

    /// Board scope, absent for workspace-level operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<BoardId>,

    /// Who performed the operation
    pub user_id: UserId,

    /// Canonical action string (e.g., "move card")
    pub action: String,

    /// Action-specific payload (names, positions, target ids)
    pub detail: Value,
}

impl ActivityEntry {
    /// Create a workspace-scoped record
    pub fn new(workspace_id: WorkspaceId, user_id: UserId, action: impl Into<String>) -> Self {
        Self {
            id: ActivityId::new(),
            timestamp: Utc::now(),
            workspace_id,
            board_id: None,
            user_id,
            action: action.into(),
            detail: Value::Null,
        }
    }

    /// Scope the record to a board
    pub fn with_board(mut self, board_id: BoardId) -> Self {
        self.board_id = Some(board_id);
        self
    }

    /// Attach the action payload
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_entry_creation() {
        let entry = ActivityEntry::new(
            WorkspaceId::from_string("w1"),
            UserId::from_string("alice"),
            "move card",
        )
        .with_board(BoardId::from_string("b1"))
        .with_detail(serde_json::json!({"card": "c1", "to_list": "l2", "position": 0}));

        assert_eq!(entry.action, "move card");
        assert_eq!(entry.board_id, Some(BoardId::from_string("b1")));
        assert_eq!(entry.detail["position"], 0);
        assert_eq!(entry.id.as_str().len(), 26);
    }

    #[test]
    fn test_workspace_scoped_entry_omits_board() {
        let entry = ActivityEntry::new(
            WorkspaceId::from_string("w1"),
            UserId::from_string("alice"),
            "transfer ownership",
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("board_id"));
    }
}
