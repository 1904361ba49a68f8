//! Core types for the board kernel

mod board;
mod card;
mod chain;
mod checklist;
mod ids;
mod role;
mod workspace;

// Re-export all types
pub use board::{Board, BoardMember, CustomField, CustomFieldKind, Label, List};
pub use card::{Card, Comment};
pub use chain::{
    ArchivedNode, BoardChain, CardChain, ChecklistChain, ItemChain, ListChain, WorkspaceChain,
};
pub use checklist::{Checklist, ChecklistItem, ItemCompletion};
pub use ids::{
    ActivityId, BoardId, CardId, ChecklistId, ChecklistItemId, CommentId, CustomFieldId, LabelId,
    ListId, UserId, WorkspaceId,
};
pub use role::{BoardRole, Visibility, WorkspaceRole};
pub use workspace::{Workspace, WorkspaceMember};
