//! MembershipService: workspace and board member management.
//!
//! The capability checks come from the permission resolver; the hierarchy
//! guard (who may act on whom) and the self-action guards (leave, not kick,
//! yourself; never re-role yourself; never transfer to yourself) live here,
//! layered on top of the raw capabilities.

use super::{commit_batch, emit};
use crate::activity::ActivityEntry;
use crate::error::{BoardwalkError, Result};
use crate::permission;
use crate::repo::{ActivityLogger, BoardCache, EntityRepository, WriteBatch, WriteOp};
use crate::types::{
    BoardChain, BoardId, BoardMember, BoardRole, UserId, WorkspaceChain, WorkspaceId,
    WorkspaceMember, WorkspaceRole,
};
use serde_json::json;
use std::sync::Arc;

/// Orchestrates membership mutations at both scopes
pub struct MembershipService<R> {
    repo: Arc<R>,
    activity: Arc<dyn ActivityLogger>,
    cache: Arc<dyn BoardCache>,
}

impl<R: EntityRepository> MembershipService<R> {
    /// Create a service over the given collaborators
    pub fn new(repo: Arc<R>, activity: Arc<dyn ActivityLogger>, cache: Arc<dyn BoardCache>) -> Self {
        Self {
            repo,
            activity,
            cache,
        }
    }

    async fn emit(&self, entry: ActivityEntry) {
        emit(self.activity.as_ref(), self.cache.as_ref(), entry).await;
    }

    // =========================================================================
    // Workspace members
    // =========================================================================

    /// Add a member to a workspace. Granting `Owner` is not an add - use
    /// [`Self::transfer_workspace_ownership`].
    pub async fn add_workspace_member(
        &self,
        actor: &UserId,
        workspace_id: &WorkspaceId,
        user: &UserId,
        role: WorkspaceRole,
    ) -> Result<WorkspaceMember> {
        let chain = self.repo.workspace_chain(workspace_id).await?;
        let actor_role = self.workspace_gate(actor, &chain, "add workspace member")?;

        if role == WorkspaceRole::Owner {
            return Err(BoardwalkError::invalid_value(
                "role",
                "ownership is granted only by transfer",
            ));
        }
        if !actor_role.can_manage(role) {
            return Err(BoardwalkError::forbidden("grant a role at or above your own"));
        }
        if chain.role(user).is_some() {
            return Err(BoardwalkError::already_in_state("user is already a member"));
        }

        let member = WorkspaceMember::new(workspace_id.clone(), user.clone(), role);
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpsertWorkspaceMember(member.clone()));
        commit_batch(self.repo.as_ref(), "add workspace member", batch).await?;

        self.emit(
            ActivityEntry::new(workspace_id.clone(), actor.clone(), "add workspace member")
                .with_detail(json!({ "user": user, "role": role })),
        )
        .await;
        Ok(member)
    }

    /// Change a workspace member's role
    pub async fn change_workspace_role(
        &self,
        actor: &UserId,
        workspace_id: &WorkspaceId,
        user: &UserId,
        new_role: WorkspaceRole,
    ) -> Result<WorkspaceMember> {
        let chain = self.repo.workspace_chain(workspace_id).await?;
        let actor_role = self.workspace_gate(actor, &chain, "change workspace role")?;

        if actor == user {
            return Err(BoardwalkError::invalid_value(
                "member",
                "cannot change your own role",
            ));
        }
        if new_role == WorkspaceRole::Owner {
            return Err(BoardwalkError::invalid_value(
                "role",
                "ownership is granted only by transfer",
            ));
        }
        let target_role = chain
            .role(user)
            .ok_or_else(|| BoardwalkError::MemberNotFound { user_id: user.to_string() })?;
        if target_role == WorkspaceRole::Owner {
            return Err(BoardwalkError::forbidden("change the owner's role"));
        }
        if !actor_role.can_manage(target_role) || !actor_role.can_manage(new_role) {
            return Err(BoardwalkError::forbidden("act on a member at or above your rank"));
        }

        let member = WorkspaceMember::new(workspace_id.clone(), user.clone(), new_role);
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpsertWorkspaceMember(member.clone()));
        commit_batch(self.repo.as_ref(), "change workspace role", batch).await?;

        self.emit(
            ActivityEntry::new(workspace_id.clone(), actor.clone(), "change workspace role")
                .with_detail(json!({ "user": user, "from": target_role, "to": new_role })),
        )
        .await;
        Ok(member)
    }

    /// Remove another member from a workspace. Removing yourself is a leave,
    /// not a kick.
    pub async fn remove_workspace_member(
        &self,
        actor: &UserId,
        workspace_id: &WorkspaceId,
        user: &UserId,
    ) -> Result<()> {
        let chain = self.repo.workspace_chain(workspace_id).await?;
        let actor_role = self.workspace_gate(actor, &chain, "remove workspace member")?;

        if actor == user {
            return Err(BoardwalkError::invalid_value(
                "member",
                "cannot remove yourself, leave instead",
            ));
        }
        let target_role = chain
            .role(user)
            .ok_or_else(|| BoardwalkError::MemberNotFound { user_id: user.to_string() })?;
        if target_role == WorkspaceRole::Owner {
            return Err(BoardwalkError::forbidden("remove the owner"));
        }
        if !actor_role.can_manage(target_role) {
            return Err(BoardwalkError::forbidden("act on a member at or above your rank"));
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::DeleteWorkspaceMember {
            workspace_id: workspace_id.clone(),
            user_id: user.clone(),
        });
        commit_batch(self.repo.as_ref(), "remove workspace member", batch).await?;

        self.emit(
            ActivityEntry::new(workspace_id.clone(), actor.clone(), "remove workspace member")
                .with_detail(json!({ "user": user })),
        )
        .await;
        Ok(())
    }

    /// Leave a workspace. The owner must transfer ownership first.
    pub async fn leave_workspace(&self, actor: &UserId, workspace_id: &WorkspaceId) -> Result<()> {
        let chain = self.repo.workspace_chain(workspace_id).await?;
        let role = chain
            .role(actor)
            .ok_or_else(|| BoardwalkError::WorkspaceNotFound { id: workspace_id.to_string() })?;
        if role == WorkspaceRole::Owner {
            return Err(BoardwalkError::forbidden(
                "leave while owner, transfer ownership first",
            ));
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::DeleteWorkspaceMember {
            workspace_id: workspace_id.clone(),
            user_id: actor.clone(),
        });
        commit_batch(self.repo.as_ref(), "leave workspace", batch).await?;

        self.emit(
            ActivityEntry::new(workspace_id.clone(), actor.clone(), "leave workspace")
                .with_detail(json!({ "user": actor })),
        )
        .await;
        Ok(())
    }

    /// Atomically transfer workspace ownership: the old owner becomes Admin,
    /// the target becomes Owner, and the workspace's denormalized owner id
    /// follows, all in one batch.
    pub async fn transfer_workspace_ownership(
        &self,
        actor: &UserId,
        workspace_id: &WorkspaceId,
        new_owner: &UserId,
    ) -> Result<()> {
        let chain = self.repo.workspace_chain(workspace_id).await?;
        let access = permission::resolve_workspace(actor, &chain);
        if !access.can_read {
            return Err(BoardwalkError::WorkspaceNotFound { id: workspace_id.to_string() });
        }
        if !access.is_owner {
            return Err(BoardwalkError::forbidden("transfer ownership"));
        }
        if actor == new_owner {
            return Err(BoardwalkError::invalid_value(
                "new_owner",
                "cannot transfer to yourself",
            ));
        }
        if chain.role(new_owner).is_none() {
            return Err(BoardwalkError::MemberNotFound { user_id: new_owner.to_string() });
        }

        let mut workspace = chain.workspace.clone();
        workspace.owner_id = new_owner.clone();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpsertWorkspaceMember(WorkspaceMember::new(
            workspace_id.clone(),
            actor.clone(),
            WorkspaceRole::Admin,
        )));
        batch.push(WriteOp::UpsertWorkspaceMember(WorkspaceMember::new(
            workspace_id.clone(),
            new_owner.clone(),
            WorkspaceRole::Owner,
        )));
        batch.push(WriteOp::UpdateWorkspace(workspace));
        commit_batch(self.repo.as_ref(), "transfer ownership", batch).await?;

        tracing::debug!("workspace {} ownership moved to {}", workspace_id, new_owner);
        self.emit(
            ActivityEntry::new(workspace_id.clone(), actor.clone(), "transfer ownership")
                .with_detail(json!({ "from": actor, "to": new_owner })),
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Board members
    // =========================================================================

    /// Add a member to a board
    pub async fn add_board_member(
        &self,
        actor: &UserId,
        board_id: &BoardId,
        user: &UserId,
        role: BoardRole,
    ) -> Result<BoardMember> {
        let chain = self.repo.board_chain(board_id).await?;
        let actor_role = self.board_gate(actor, &chain, "add board member")?;

        if role == BoardRole::Owner {
            return Err(BoardwalkError::invalid_value(
                "role",
                "a board has exactly one owner",
            ));
        }
        if !actor_role.can_manage(role) {
            return Err(BoardwalkError::forbidden("grant a role at or above your own"));
        }
        if chain.board_role(user).is_some() {
            return Err(BoardwalkError::already_in_state("user is already a board member"));
        }

        let member = BoardMember::new(board_id.clone(), user.clone(), role);
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpsertBoardMember(member.clone()));
        commit_batch(self.repo.as_ref(), "add board member", batch).await?;

        self.emit(
            ActivityEntry::new(chain.workspace.id.clone(), actor.clone(), "add board member")
                .with_board(board_id.clone())
                .with_detail(json!({ "user": user, "role": role })),
        )
        .await;
        Ok(member)
    }

    /// Change a board member's role
    pub async fn change_board_role(
        &self,
        actor: &UserId,
        board_id: &BoardId,
        user: &UserId,
        new_role: BoardRole,
    ) -> Result<BoardMember> {
        let chain = self.repo.board_chain(board_id).await?;
        let actor_role = self.board_gate(actor, &chain, "change board role")?;

        if actor == user {
            return Err(BoardwalkError::invalid_value(
                "member",
                "cannot change your own role",
            ));
        }
        if new_role == BoardRole::Owner {
            return Err(BoardwalkError::invalid_value(
                "role",
                "a board has exactly one owner",
            ));
        }
        let target_role = chain
            .board_role(user)
            .ok_or_else(|| BoardwalkError::MemberNotFound { user_id: user.to_string() })?;
        if target_role == BoardRole::Owner {
            return Err(BoardwalkError::forbidden("change the owner's role"));
        }
        if !actor_role.can_manage(target_role) || !actor_role.can_manage(new_role) {
            return Err(BoardwalkError::forbidden("act on a member at or above your rank"));
        }

        let member = BoardMember::new(board_id.clone(), user.clone(), new_role);
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpsertBoardMember(member.clone()));
        commit_batch(self.repo.as_ref(), "change board role", batch).await?;

        self.emit(
            ActivityEntry::new(chain.workspace.id.clone(), actor.clone(), "change board role")
                .with_board(board_id.clone())
                .with_detail(json!({ "user": user, "from": target_role, "to": new_role })),
        )
        .await;
        Ok(member)
    }

    /// Remove another member from a board
    pub async fn remove_board_member(
        &self,
        actor: &UserId,
        board_id: &BoardId,
        user: &UserId,
    ) -> Result<()> {
        let chain = self.repo.board_chain(board_id).await?;
        let actor_role = self.board_gate(actor, &chain, "remove board member")?;

        if actor == user {
            return Err(BoardwalkError::invalid_value(
                "member",
                "cannot remove yourself, leave instead",
            ));
        }
        let target_role = chain
            .board_role(user)
            .ok_or_else(|| BoardwalkError::MemberNotFound { user_id: user.to_string() })?;
        if target_role == BoardRole::Owner {
            return Err(BoardwalkError::forbidden("remove the owner"));
        }
        if !actor_role.can_manage(target_role) {
            return Err(BoardwalkError::forbidden("act on a member at or above your rank"));
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::DeleteBoardMember {
            board_id: board_id.clone(),
            user_id: user.clone(),
        });
        commit_batch(self.repo.as_ref(), "remove board member", batch).await?;

        self.emit(
            ActivityEntry::new(chain.workspace.id.clone(), actor.clone(), "remove board member")
                .with_board(board_id.clone())
                .with_detail(json!({ "user": user })),
        )
        .await;
        Ok(())
    }

    /// Leave a board. The board owner cannot leave.
    pub async fn leave_board(&self, actor: &UserId, board_id: &BoardId) -> Result<()> {
        let chain = self.repo.board_chain(board_id).await?;
        let role = chain
            .board_role(actor)
            .ok_or_else(|| BoardwalkError::BoardNotFound { id: board_id.to_string() })?;
        if role == BoardRole::Owner {
            return Err(BoardwalkError::forbidden("leave a board you own"));
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::DeleteBoardMember {
            board_id: board_id.clone(),
            user_id: actor.clone(),
        });
        commit_batch(self.repo.as_ref(), "leave board", batch).await?;

        self.emit(
            ActivityEntry::new(chain.workspace.id.clone(), actor.clone(), "leave board")
                .with_board(board_id.clone())
                .with_detail(json!({ "user": actor })),
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Gate a workspace-scoped management action and return the actor's role
    fn workspace_gate(
        &self,
        actor: &UserId,
        chain: &WorkspaceChain,
        action: &str,
    ) -> Result<WorkspaceRole> {
        let access = permission::resolve_workspace(actor, chain);
        if !access.can_read {
            return Err(BoardwalkError::WorkspaceNotFound {
                id: chain.workspace.id.to_string(),
            });
        }
        match access.role.filter(|_| access.can_administer) {
            Some(role) => Ok(role),
            None => Err(BoardwalkError::forbidden(action)),
        }
    }

    /// Gate a board-scoped management action and return the actor's
    /// effective board rank. A workspace Owner/Admin with no explicit board
    /// row manages at the matching board rank.
    fn board_gate(&self, actor: &UserId, chain: &BoardChain, action: &str) -> Result<BoardRole> {
        let access = permission::resolve(actor, chain);
        if !access.can_read {
            return Err(BoardwalkError::BoardNotFound {
                id: chain.board.id.to_string(),
            });
        }
        if !access.can_administer {
            return Err(BoardwalkError::forbidden(action));
        }
        Ok(match access.board_role {
            Some(role) => role,
            None => match access.workspace_role {
                Some(WorkspaceRole::Owner) => BoardRole::Owner,
                _ => BoardRole::Admin,
            },
        })
    }
}
