//! Role and visibility enums for the layered membership model.

use serde::{Deserialize, Serialize};

/// Role of a user within a workspace.
///
/// Exactly one member per workspace holds `Owner` at any time; the owner can
/// only change via an atomic ownership transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl WorkspaceRole {
    /// Whether this role may create/update content in the workspace's boards.
    /// `Viewer` never grants write.
    pub fn grants_write(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Member)
    }

    /// Whether this role may administer the workspace scope
    pub fn grants_admin(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Hierarchy guard for member management: an `Admin` may only act on
    /// members strictly below `Admin`; only `Owner` may act on an `Admin`.
    /// `Owner` itself is never a valid target.
    pub fn can_manage(&self, target: WorkspaceRole) -> bool {
        match self {
            Self::Owner => target != Self::Owner,
            Self::Admin => matches!(target, Self::Member | Self::Viewer),
            Self::Member | Self::Viewer => false,
        }
    }
}

/// Role of a user on a specific board, independent of their workspace role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardRole {
    Owner,
    Admin,
    Member,
    Guest,
    Observer,
}

impl BoardRole {
    /// Whether this role may create/update board content.
    /// `Guest` and `Observer` never grant write.
    pub fn grants_write(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Member)
    }

    /// Whether this role may administer the board (archive, invite, re-role)
    pub fn grants_admin(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Hierarchy guard for board member management, same lattice as
    /// [`WorkspaceRole::can_manage`].
    pub fn can_manage(&self, target: BoardRole) -> bool {
        match self {
            Self::Owner => target != Self::Owner,
            Self::Admin => matches!(target, Self::Member | Self::Guest | Self::Observer),
            Self::Member | Self::Guest | Self::Observer => false,
        }
    }
}

/// Who can see a board without an explicit membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Explicit board members only; workspace membership is not enough
    Private,
    /// Any member of the owning workspace
    Workspace,
    /// Anyone, including users with no membership at all (read-only)
    Public,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_write_grants() {
        assert!(WorkspaceRole::Owner.grants_write());
        assert!(WorkspaceRole::Member.grants_write());
        assert!(!WorkspaceRole::Viewer.grants_write());
    }

    #[test]
    fn test_board_write_grants() {
        assert!(BoardRole::Member.grants_write());
        assert!(!BoardRole::Guest.grants_write());
        assert!(!BoardRole::Observer.grants_write());
    }

    #[test]
    fn test_owner_is_never_a_manageable_target() {
        assert!(!WorkspaceRole::Owner.can_manage(WorkspaceRole::Owner));
        assert!(!WorkspaceRole::Admin.can_manage(WorkspaceRole::Owner));
        assert!(!BoardRole::Owner.can_manage(BoardRole::Owner));
        assert!(!BoardRole::Admin.can_manage(BoardRole::Owner));
    }

    #[test]
    fn test_admin_manages_only_below_admin() {
        assert!(WorkspaceRole::Admin.can_manage(WorkspaceRole::Member));
        assert!(WorkspaceRole::Admin.can_manage(WorkspaceRole::Viewer));
        assert!(!WorkspaceRole::Admin.can_manage(WorkspaceRole::Admin));

        assert!(BoardRole::Admin.can_manage(BoardRole::Guest));
        assert!(!BoardRole::Admin.can_manage(BoardRole::Admin));
        assert!(BoardRole::Owner.can_manage(BoardRole::Admin));
    }

    #[test]
    fn test_visibility_serde() {
        let v: Visibility = serde_json::from_str("\"workspace\"").unwrap();
        assert_eq!(v, Visibility::Workspace);
    }
}
