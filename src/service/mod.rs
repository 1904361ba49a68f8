//! Services orchestrating permission-gated, order-preserving mutations.
//!
//! Every operation follows one shape: load the ownership chain, resolve the
//! caller's effective access, enforce the archived guard, let the ordering
//! engine compute reassignment plans, commit one [`WriteBatch`], then emit an
//! activity record and invalidate the board cache (both best-effort, after
//! the commit).
//!
//! [`WriteBatch`]: crate::repo::WriteBatch

mod boards;
mod checklists;
mod members;

pub use boards::{BoardHierarchyService, CardPatch, ListCardOrder};
pub use checklists::ChecklistService;
pub use members::MembershipService;

use crate::activity::ActivityEntry;
use crate::error::{BoardwalkError, Result};
use crate::ordering::Sibling;
use crate::permission::EffectiveAccess;
use crate::repo::{ActivityLogger, BoardCache, EntityRepository, WriteBatch, WriteOp};
use crate::types::{
    ArchivedNode, Card, CardId, Checklist, ChecklistId, ChecklistItem, ChecklistItemId, List,
    ListId,
};

/// Gate a write: strangers get `missing` (existence stays hidden), readers
/// without write capability get `Forbidden`.
fn require_write(access: &EffectiveAccess, action: &str, missing: BoardwalkError) -> Result<()> {
    if !access.can_read {
        return Err(missing);
    }
    if !access.can_write {
        return Err(BoardwalkError::forbidden(action));
    }
    Ok(())
}

/// Gate an administer-level action (archive/delete/member management)
fn require_admin(access: &EffectiveAccess, action: &str, missing: BoardwalkError) -> Result<()> {
    if !access.can_read {
        return Err(missing);
    }
    if !access.can_administer {
        return Err(BoardwalkError::forbidden(action));
    }
    Ok(())
}

/// Archived guard: any archived node on the chain blocks the mutation
fn require_active(node: Option<ArchivedNode>) -> Result<()> {
    match node {
        Some((resource, id)) => Err(BoardwalkError::ArchivedAncestor {
            resource: resource.to_string(),
            id,
        }),
        None => Ok(()),
    }
}

fn list_siblings(lists: &[List]) -> Vec<Sibling<ListId>> {
    lists
        .iter()
        .map(|l| Sibling::new(l.id.clone(), l.order))
        .collect()
}

fn card_siblings(cards: &[Card]) -> Vec<Sibling<CardId>> {
    cards
        .iter()
        .map(|c| Sibling::new(c.id.clone(), c.order))
        .collect()
}

fn checklist_siblings(checklists: &[Checklist]) -> Vec<Sibling<ChecklistId>> {
    checklists
        .iter()
        .map(|c| Sibling::new(c.id.clone(), c.order))
        .collect()
}

fn item_siblings(items: &[ChecklistItem]) -> Vec<Sibling<ChecklistItemId>> {
    items
        .iter()
        .map(|i| Sibling::new(i.id.clone(), i.order))
        .collect()
}

/// Queue the full cascade for one card: completion rows before items, items
/// before checklists, checklists before the card itself.
async fn push_card_cascade<R: EntityRepository>(
    repo: &R,
    batch: &mut WriteBatch,
    card_id: &CardId,
) -> Result<()> {
    for checklist in repo.checklists_in_card(card_id).await? {
        push_checklist_cascade(repo, batch, &checklist.id).await?;
    }
    batch.push(WriteOp::DeleteCard(card_id.clone()));
    Ok(())
}

/// Queue the cascade for one checklist, completion rows first
async fn push_checklist_cascade<R: EntityRepository>(
    repo: &R,
    batch: &mut WriteBatch,
    checklist_id: &ChecklistId,
) -> Result<()> {
    for item in repo.items_in_checklist(checklist_id).await? {
        for completion in repo.item_completions(&item.id).await? {
            batch.push(WriteOp::DeleteCompletion {
                item_id: item.id.clone(),
                user_id: completion.user_id,
            });
        }
        batch.push(WriteOp::DeleteItem(item.id.clone()));
    }
    batch.push(WriteOp::DeleteChecklist(checklist_id.clone()));
    Ok(())
}

/// Commit a batch, logging storage failures with the failing action before
/// propagating - a half-applied plan must never disappear silently.
async fn commit_batch<R: EntityRepository>(
    repo: &R,
    action: &str,
    batch: WriteBatch,
) -> Result<()> {
    if let Err(err) = repo.commit(batch).await {
        tracing::error!("commit failed during {}: {}", action, err);
        return Err(err);
    }
    Ok(())
}

/// Post-commit side effects. Failures are logged, never propagated: the
/// primary transaction has already committed.
async fn emit(
    activity: &dyn ActivityLogger,
    cache: &dyn BoardCache,
    entry: ActivityEntry,
) {
    let board_id = entry.board_id.clone();
    let action = entry.action.clone();
    if let Err(err) = activity.record(entry).await {
        tracing::warn!("activity record failed for '{}': {}", action, err);
    }
    if let Some(board_id) = board_id {
        if let Err(err) = cache.invalidate_board(&board_id).await {
            tracing::warn!("cache invalidation failed for board {}: {}", board_id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::EffectiveAccess as Access;

    fn access(can_read: bool, can_write: bool, can_administer: bool) -> Access {
        Access {
            can_read,
            can_write,
            can_administer,
            board_role: None,
            workspace_role: None,
        }
    }

    #[test]
    fn test_require_write_hides_existence_from_strangers() {
        let err = require_write(
            &access(false, false, false),
            "create list",
            BoardwalkError::BoardNotFound { id: "b1".into() },
        )
        .unwrap_err();
        assert!(matches!(err, BoardwalkError::BoardNotFound { .. }));
    }

    #[test]
    fn test_require_write_forbids_readers() {
        let err = require_write(
            &access(true, false, false),
            "create list",
            BoardwalkError::BoardNotFound { id: "b1".into() },
        )
        .unwrap_err();
        assert!(matches!(err, BoardwalkError::Forbidden { .. }));
    }

    #[test]
    fn test_require_admin_rejects_plain_writers() {
        let err = require_admin(
            &access(true, true, false),
            "archive card",
            BoardwalkError::CardNotFound { id: "c1".into() },
        )
        .unwrap_err();
        assert!(matches!(err, BoardwalkError::Forbidden { .. }));
    }

    #[test]
    fn test_require_active_maps_to_conflict() {
        assert!(require_active(None).is_ok());
        let err = require_active(Some(("list", "l1".to_string()))).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
    }
}
