//! Workspace types: Workspace and its membership rows

use super::ids::{UserId, WorkspaceId};
use super::role::WorkspaceRole;
use serde::{Deserialize, Serialize};

/// The top-level tenant. Owns boards and workspace members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    /// URL slug, unique service-wide
    pub slug: String,
    /// Denormalized copy of the single Owner member's user id
    pub owner_id: UserId,
}

impl Workspace {
    /// Create a new workspace owned by `owner_id`
    pub fn new(name: impl Into<String>, slug: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: name.into(),
            slug: slug.into(),
            owner_id,
        }
    }
}

/// Membership row joining a user to a workspace with a role.
///
/// (workspace_id, user_id) is unique; exactly one member per workspace holds
/// [`WorkspaceRole::Owner`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceMember {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: WorkspaceRole,
}

impl WorkspaceMember {
    /// Create a membership row
    pub fn new(workspace_id: WorkspaceId, user_id: UserId, role: WorkspaceRole) -> Self {
        Self {
            workspace_id,
            user_id,
            role,
        }
    }
}
