//! Effective-permission resolution over loaded ownership chains.
//!
//! One resolver, consumed by every service, replacing per-endpoint membership
//! checks. The resolver never errors and never looks at archived state: it
//! answers what the caller's roles allow. Services translate a missing
//! capability into `NotFound` (no read relationship - existence stays hidden)
//! or `Forbidden` (readable but not permitted), and enforce the archived
//! guard separately as a `Conflict`.

use crate::types::{BoardChain, BoardRole, UserId, Visibility, WorkspaceChain, WorkspaceRole};

/// Resolved capability set for one user against one board chain.
///
/// The raw roles are exposed for the hierarchy guards in member management.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveAccess {
    pub can_read: bool,
    pub can_write: bool,
    pub can_administer: bool,
    pub board_role: Option<BoardRole>,
    pub workspace_role: Option<WorkspaceRole>,
}

impl EffectiveAccess {
    /// Access for a user with no relationship to the chain at all
    fn none() -> Self {
        Self {
            can_read: false,
            can_write: false,
            can_administer: false,
            board_role: None,
            workspace_role: None,
        }
    }
}

/// Resolve the caller's effective access against a board chain.
///
/// Rules, applied in order:
/// - An explicit board membership is the most specific grant and wins: its
///   role alone decides write/admin, whatever the workspace role says.
/// - Without a board row, workspace membership grants board access unless
///   the board is `Private`.
/// - `Public` boards are readable by anyone.
/// - `Guest`/`Observer` (board) and `Viewer` (workspace) never grant write.
pub fn resolve(user: &UserId, chain: &BoardChain) -> EffectiveAccess {
    let board_role = chain.board_role(user);
    let workspace_role = chain.workspace_role(user);

    let access = match (board_role, workspace_role) {
        (Some(role), _) => EffectiveAccess {
            can_read: true,
            can_write: role.grants_write(),
            can_administer: role.grants_admin(),
            board_role,
            workspace_role,
        },
        (None, Some(role)) if chain.board.visibility != Visibility::Private => EffectiveAccess {
            can_read: true,
            can_write: role.grants_write(),
            can_administer: role.grants_admin(),
            board_role,
            workspace_role,
        },
        (None, Some(_)) | (None, None) => EffectiveAccess {
            board_role,
            workspace_role,
            ..EffectiveAccess::none()
        },
    };

    if !access.can_read && chain.board.visibility == Visibility::Public {
        return EffectiveAccess {
            can_read: true,
            ..access
        };
    }
    access
}

/// Resolved capability set for workspace-scoped actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceAccess {
    pub can_read: bool,
    /// Plain member management (add members, re-role below Admin)
    pub can_administer: bool,
    /// Owner-only actions: ownership transfer, acting on Admins
    pub is_owner: bool,
    pub role: Option<WorkspaceRole>,
}

/// Resolve the caller's effective access against a workspace
pub fn resolve_workspace(user: &UserId, chain: &WorkspaceChain) -> WorkspaceAccess {
    let role = chain.role(user);
    WorkspaceAccess {
        can_read: role.is_some(),
        can_administer: role.is_some_and(|r| r.grants_admin()),
        is_owner: role == Some(WorkspaceRole::Owner),
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Board, BoardChain, BoardMember, Workspace, WorkspaceChain, WorkspaceMember,
    };

    fn chain(visibility: Visibility) -> BoardChain {
        let owner = UserId::from_string("alice");
        let workspace = Workspace::new("Acme", "acme", owner.clone());
        let board = Board::new(workspace.id.clone(), "Launch", owner.clone())
            .with_visibility(visibility);
        let mut chain = BoardChain {
            workspace_members: vec![WorkspaceMember::new(
                workspace.id.clone(),
                owner.clone(),
                WorkspaceRole::Owner,
            )],
            board_members: vec![BoardMember::new(board.id.clone(), owner, BoardRole::Owner)],
            board,
            workspace,
        };
        chain.workspace_members.push(WorkspaceMember::new(
            chain.workspace.id.clone(),
            UserId::from_string("wanda"),
            WorkspaceRole::Member,
        ));
        chain.workspace_members.push(WorkspaceMember::new(
            chain.workspace.id.clone(),
            UserId::from_string("vera"),
            WorkspaceRole::Viewer,
        ));
        chain.board_members.push(BoardMember::new(
            chain.board.id.clone(),
            UserId::from_string("gus"),
            BoardRole::Guest,
        ));
        chain
    }

    #[test]
    fn test_board_owner_has_everything() {
        let access = resolve(&UserId::from_string("alice"), &chain(Visibility::Workspace));
        assert!(access.can_read && access.can_write && access.can_administer);
        assert_eq!(access.board_role, Some(BoardRole::Owner));
    }

    #[test]
    fn test_workspace_member_writes_via_workspace_path() {
        let access = resolve(&UserId::from_string("wanda"), &chain(Visibility::Workspace));
        assert!(access.can_read);
        assert!(access.can_write);
        assert!(!access.can_administer);
        assert_eq!(access.board_role, None);
    }

    #[test]
    fn test_workspace_viewer_reads_but_never_writes() {
        let access = resolve(&UserId::from_string("vera"), &chain(Visibility::Workspace));
        assert!(access.can_read);
        assert!(!access.can_write);
    }

    #[test]
    fn test_private_board_requires_explicit_membership() {
        // wanda is a workspace member but has no board row
        let access = resolve(&UserId::from_string("wanda"), &chain(Visibility::Private));
        assert!(!access.can_read);
        assert!(!access.can_write);
        // gus has an explicit row, so the private board is visible to him
        let access = resolve(&UserId::from_string("gus"), &chain(Visibility::Private));
        assert!(access.can_read);
    }

    #[test]
    fn test_board_guest_never_writes() {
        let access = resolve(&UserId::from_string("gus"), &chain(Visibility::Workspace));
        assert!(access.can_read);
        assert!(!access.can_write);
    }

    #[test]
    fn test_explicit_board_role_wins_over_workspace_role() {
        // A workspace Admin demoted to board Observer must not write there
        let mut c = chain(Visibility::Workspace);
        c.workspace_members.push(WorkspaceMember::new(
            c.workspace.id.clone(),
            UserId::from_string("oscar"),
            WorkspaceRole::Admin,
        ));
        c.board_members.push(BoardMember::new(
            c.board.id.clone(),
            UserId::from_string("oscar"),
            BoardRole::Observer,
        ));
        let access = resolve(&UserId::from_string("oscar"), &c);
        assert!(access.can_read);
        assert!(!access.can_write);
        assert!(!access.can_administer);
    }

    #[test]
    fn test_stranger_sees_nothing_on_non_public_boards() {
        for visibility in [Visibility::Private, Visibility::Workspace] {
            let access = resolve(&UserId::from_string("mallory"), &chain(visibility));
            assert_eq!(access, EffectiveAccess::none());
        }
    }

    #[test]
    fn test_public_board_readable_by_anyone() {
        let access = resolve(&UserId::from_string("mallory"), &chain(Visibility::Public));
        assert!(access.can_read);
        assert!(!access.can_write);
        assert!(!access.can_administer);
    }

    #[test]
    fn test_workspace_access() {
        let owner = UserId::from_string("alice");
        let workspace = Workspace::new("Acme", "acme", owner.clone());
        let ws = WorkspaceChain {
            members: vec![
                WorkspaceMember::new(workspace.id.clone(), owner.clone(), WorkspaceRole::Owner),
                WorkspaceMember::new(
                    workspace.id.clone(),
                    UserId::from_string("adam"),
                    WorkspaceRole::Admin,
                ),
            ],
            workspace,
        };

        let access = resolve_workspace(&owner, &ws);
        assert!(access.is_owner && access.can_administer);

        let access = resolve_workspace(&UserId::from_string("adam"), &ws);
        assert!(!access.is_owner);
        assert!(access.can_administer);

        let access = resolve_workspace(&UserId::from_string("mallory"), &ws);
        assert!(!access.can_read);
        assert_eq!(access.role, None);
    }
}
