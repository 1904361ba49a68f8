//! Ordering and authorization kernel for the Boardwalk project-board service
//!
//! This crate is the state-consistency core behind the HTTP layer: it keeps
//! every sibling collection (lists in a board, cards in a list, checklists in
//! a card, items in a checklist) densely ordered under inserts, moves, and
//! deletes, and it resolves layered memberships (workspace role, board role,
//! board visibility) into effective permissions before any mutation runs.
//!
//! ## Overview
//!
//! - **One ordering engine** - every reorder path goes through
//!   [`ordering`]: contiguous integer orders from base 0, full renumbering
//!   on each mutation, no gaps or ties by construction.
//! - **One permission resolver** - [`permission::resolve`] turns a loaded
//!   ownership chain into `can_read` / `can_write` / `can_administer`.
//!   Strangers get `NotFound`, never `Forbidden`.
//! - **Injected collaborators** - storage, activity log, and cache are
//!   traits ([`repo`]); services commit one atomic [`repo::WriteBatch`] per
//!   operation and fire side effects only after the commit.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use boardwalk_core::{BoardHierarchyService, types::{BoardId, UserId}};
//! # use std::sync::Arc;
//! # async fn example<R: boardwalk_core::repo::EntityRepository>(
//! #     service: BoardHierarchyService<R>,
//! # ) -> boardwalk_core::Result<()> {
//! let user = UserId::from_string("alice");
//! let board_id = BoardId::from_string("01J0000000000000000000000A");
//!
//! // Create a list at the end of the board
//! let list = service.create_list(&user, &board_id, "In Review", None).await?;
//!
//! // Drag it to the front
//! service.move_list(&user, &list.id, 0).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Consistency model
//!
//! All writes of one logical operation travel in a single [`repo::WriteBatch`]
//! and the repository applies it transactionally; reassignment plans are
//! never half-applied. Concurrent operations on the same parent key must be
//! serialized by the repository (row locks or optimistic retry); operations
//! on different parents are independent.

pub mod activity;
pub mod auto_color;
mod error;
pub mod ordering;
pub mod permission;
pub mod repo;
pub mod types;

mod service;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{BoardwalkError, ErrorKind, Result};
pub use service::{
    BoardHierarchyService, CardPatch, ChecklistService, ListCardOrder, MembershipService,
};

// Re-export commonly used types
pub use activity::ActivityEntry;
pub use permission::EffectiveAccess;
pub use repo::{ActivityLogger, BoardCache, EntityRepository, WriteBatch, WriteOp};
pub use types::{
    Board, BoardChain, BoardId, BoardMember, BoardRole, Card, CardChain, CardId, Checklist,
    ChecklistId, ChecklistItem, ChecklistItemId, Comment, ItemCompletion, Label, List, ListChain,
    ListId, UserId, Visibility, Workspace, WorkspaceId, WorkspaceMember, WorkspaceRole,
};
