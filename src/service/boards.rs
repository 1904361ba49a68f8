//! BoardHierarchyService: list and card mutations, end to end.

use super::{
    card_siblings, commit_batch, emit, list_siblings, push_card_cascade, require_active,
    require_admin, require_write,
};
use crate::activity::ActivityEntry;
use crate::error::{BoardwalkError, Result};
use crate::ordering;
use crate::permission;
use crate::repo::{ActivityLogger, BoardCache, EntityRepository, WriteBatch, WriteOp};
use crate::types::{
    BoardId, Card, CardChain, CardId, Comment, CommentId, CustomFieldId, CustomFieldKind, LabelId,
    List, ListId, UserId,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Partial update for a card. `None` leaves the field untouched; the nested
/// `Option` on dates distinguishes "set" from "clear".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// One list's drag-and-drop end state in a bulk card reorder
#[derive(Debug, Clone, Deserialize)]
pub struct ListCardOrder {
    pub list_id: ListId,
    pub ordered_card_ids: Vec<CardId>,
}

/// Orchestrates list and card operations: chain loading, permission
/// resolution, archived guards, ordering plans, one atomic commit per
/// operation, and post-commit side effects.
pub struct BoardHierarchyService<R> {
    repo: Arc<R>,
    activity: Arc<dyn ActivityLogger>,
    cache: Arc<dyn BoardCache>,
}

impl<R: EntityRepository> BoardHierarchyService<R> {
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
    // Lists
    // =========================================================================

    /// Create a list, appended at the end or spliced in at `position`
    pub async fn create_list(
        &self,
        user: &UserId,
        board_id: &BoardId,
        name: &str,
        position: Option<usize>,
    ) -> Result<List> {
        let chain = self.repo.board_chain(board_id).await?;
        let access = permission::resolve(user, &chain);
        require_write(
            &access,
            "create list",
            BoardwalkError::BoardNotFound { id: board_id.to_string() },
        )?;
        require_active(chain.archived_ancestor())?;

        let lists = self.repo.lists_in_board(board_id).await?;
        if lists.iter().any(|l| l.name == name) {
            return Err(BoardwalkError::DuplicateName {
                resource: "list".to_string(),
                name: name.to_string(),
            });
        }

        let mut batch = WriteBatch::new();
        let order = match position {
            None => ordering::append_end(&list_siblings(&lists)),
            Some(position) => {
                let (order, plan) = ordering::insert_at(&list_siblings(&lists), position);
                if !plan.is_empty() {
                    batch.push(WriteOp::ReassignListOrders {
                        board_id: board_id.clone(),
                        plan,
                    });
                }
                order
            }
        };
        let list = List::new(board_id.clone(), name, order);
        batch.push(WriteOp::InsertList(list.clone()));
        commit_batch(self.repo.as_ref(), "create list", batch).await?;

        tracing::debug!("created list {} at {} on board {}", list.id, order, board_id);
        self.emit(
            ActivityEntry::new(chain.workspace.id.clone(), user.clone(), "create list")
                .with_board(board_id.clone())
                .with_detail(json!({ "list": list.id, "name": name, "position": order })),
        )
        .await;
        Ok(list)
    }

    /// Rename a list
    pub async fn rename_list(&self, user: &UserId, list_id: &ListId, name: &str) -> Result<List> {
        let chain = self.repo.list_chain(list_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_write(
            &access,
            "rename list",
            BoardwalkError::ListNotFound { id: list_id.to_string() },
        )?;
        require_active(chain.archived_ancestor())?;

        let lists = self.repo.lists_in_board(&chain.list.board_id).await?;
        if lists.iter().any(|l| l.name == name && &l.id != list_id) {
            return Err(BoardwalkError::DuplicateName {
                resource: "list".to_string(),
                name: name.to_string(),
            });
        }

        let mut list = chain.list.clone();
        let old_name = std::mem::replace(&mut list.name, name.to_string());
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateList(list.clone()));
        commit_batch(self.repo.as_ref(), "rename list", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "rename list")
                .with_board(list.board_id.clone())
                .with_detail(json!({ "list": list.id, "from": old_name, "to": name })),
        )
        .await;
        Ok(list)
    }

    /// Move a list to `position` within its board
    pub async fn move_list(&self, user: &UserId, list_id: &ListId, position: usize) -> Result<List> {
        let chain = self.repo.list_chain(list_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_write(
            &access,
            "move list",
            BoardwalkError::ListNotFound { id: list_id.to_string() },
        )?;
        require_active(chain.archived_ancestor())?;

        let lists = self.repo.lists_in_board(&chain.list.board_id).await?;
        let plan = ordering::move_within(&list_siblings(&lists), list_id, position)?;
        let mut list = chain.list.clone();
        if plan.is_empty() {
            return Ok(list);
        }
        if let Some(r) = plan.iter().find(|r| &r.id == list_id) {
            list.order = r.order;
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::ReassignListOrders {
            board_id: chain.list.board_id.clone(),
            plan,
        });
        commit_batch(self.repo.as_ref(), "move list", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "move list")
                .with_board(list.board_id.clone())
                .with_detail(json!({ "list": list.id, "position": list.order })),
        )
        .await;
        Ok(list)
    }

    /// Replace the board's list order with the supplied permutation
    pub async fn bulk_reorder_lists(
        &self,
        user: &UserId,
        board_id: &BoardId,
        ordered_list_ids: &[ListId],
    ) -> Result<()> {
        let chain = self.repo.board_chain(board_id).await?;
        let access = permission::resolve(user, &chain);
        require_write(
            &access,
            "reorder lists",
            BoardwalkError::BoardNotFound { id: board_id.to_string() },
        )?;
        require_active(chain.archived_ancestor())?;

        let lists = self.repo.lists_in_board(board_id).await?;
        let plan = ordering::bulk_replace(&list_siblings(&lists), ordered_list_ids)?;
        if !plan.is_empty() {
            let mut batch = WriteBatch::new();
            batch.push(WriteOp::ReassignListOrders {
                board_id: board_id.clone(),
                plan,
            });
            commit_batch(self.repo.as_ref(), "reorder lists", batch).await?;
        }

        self.emit(
            ActivityEntry::new(chain.workspace.id.clone(), user.clone(), "reorder lists")
                .with_board(board_id.clone())
                .with_detail(json!({ "count": ordered_list_ids.len() })),
        )
        .await;
        Ok(())
    }

    /// Archive a list. Its cards keep their order slots.
    pub async fn archive_list(&self, user: &UserId, list_id: &ListId) -> Result<List> {
        let chain = self.repo.list_chain(list_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_admin(
            &access,
            "archive list",
            BoardwalkError::ListNotFound { id: list_id.to_string() },
        )?;
        if chain.list.is_archived {
            return Err(BoardwalkError::AlreadyArchived {
                resource: "list".to_string(),
                id: list_id.to_string(),
            });
        }
        require_active(chain.board.archived_ancestor())?;

        let mut list = chain.list.clone();
        list.is_archived = true;
        list.archived_at = Some(Utc::now());
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateList(list.clone()));
        commit_batch(self.repo.as_ref(), "archive list", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "archive list")
                .with_board(list.board_id.clone())
                .with_detail(json!({ "list": list.id, "name": list.name })),
        )
        .await;
        Ok(list)
    }

    /// Un-archive a list; rejected while the board itself is archived
    pub async fn restore_list(&self, user: &UserId, list_id: &ListId) -> Result<List> {
        let chain = self.repo.list_chain(list_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_admin(
            &access,
            "restore list",
            BoardwalkError::ListNotFound { id: list_id.to_string() },
        )?;
        if !chain.list.is_archived {
            return Err(BoardwalkError::already_in_state("list is not archived"));
        }
        require_active(chain.board.archived_ancestor())?;

        let mut list = chain.list.clone();
        list.is_archived = false;
        list.archived_at = None;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateList(list.clone()));
        commit_batch(self.repo.as_ref(), "restore list", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "restore list")
                .with_board(list.board_id.clone())
                .with_detail(json!({ "list": list.id, "name": list.name })),
        )
        .await;
        Ok(list)
    }

    /// Hard-delete an archived list and everything under it, then compact
    /// the board's remaining list orders. Deleting an active list is
    /// rejected: archive first.
    pub async fn delete_list(&self, user: &UserId, list_id: &ListId) -> Result<()> {
        let chain = self.repo.list_chain(list_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_admin(
            &access,
            "delete list",
            BoardwalkError::ListNotFound { id: list_id.to_string() },
        )?;
        if !chain.list.is_archived {
            return Err(BoardwalkError::NotArchived {
                resource: "list".to_string(),
                id: list_id.to_string(),
            });
        }

        let mut batch = WriteBatch::new();
        for card in self.repo.cards_in_list(list_id).await? {
            push_card_cascade(self.repo.as_ref(), &mut batch, &card.id).await?;
        }
        batch.push(WriteOp::DeleteList(list_id.clone()));
        let lists = self.repo.lists_in_board(&chain.list.board_id).await?;
        let plan = ordering::delete_and_compact(&list_siblings(&lists), list_id)?;
        if !plan.is_empty() {
            batch.push(WriteOp::ReassignListOrders {
                board_id: chain.list.board_id.clone(),
                plan,
            });
        }
        commit_batch(self.repo.as_ref(), "delete list", batch).await?;

        tracing::debug!("deleted list {} from board {}", list_id, chain.list.board_id);
        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "delete list")
                .with_board(chain.list.board_id.clone())
                .with_detail(json!({ "list": list_id, "name": chain.list.name })),
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Cards
    // =========================================================================

    /// Create a card in a list, appended at the end or spliced in at `position`
    pub async fn create_card(
        &self,
        user: &UserId,
        list_id: &ListId,
        name: &str,
        position: Option<usize>,
    ) -> Result<Card> {
        let chain = self.repo.list_chain(list_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_write(
            &access,
            "create card",
            BoardwalkError::ListNotFound { id: list_id.to_string() },
        )?;
        require_active(chain.archived_ancestor())?;

        let cards = self.repo.cards_in_list(list_id).await?;
        let mut batch = WriteBatch::new();
        let order = match position {
            None => ordering::append_end(&card_siblings(&cards)),
            Some(position) => {
                let (order, plan) = ordering::insert_at(&card_siblings(&cards), position);
                if !plan.is_empty() {
                    batch.push(WriteOp::ReassignCardOrders {
                        list_id: list_id.clone(),
                        plan,
                    });
                }
                order
            }
        };
        let card = Card::new(list_id.clone(), chain.list.board_id.clone(), name, order);
        batch.push(WriteOp::InsertCard(card.clone()));
        commit_batch(self.repo.as_ref(), "create card", batch).await?;

        tracing::debug!("created card {} at {} in list {}", card.id, order, list_id);
        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "create card")
                .with_board(card.board_id.clone())
                .with_detail(json!({ "card": card.id, "name": name, "list": chain.list.name })),
        )
        .await;
        Ok(card)
    }

    /// Apply a partial update to a card's own fields
    pub async fn update_card(&self, user: &UserId, card_id: &CardId, patch: CardPatch) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "update card").await?;
        require_active(chain.archived_ancestor())?;

        let mut card = chain.card.clone();
        if let Some(name) = patch.name {
            card.name = name;
        }
        if let Some(description) = patch.description {
            card.description = description;
        }
        if let Some(start_date) = patch.start_date {
            card.start_date = start_date;
        }
        if let Some(due_date) = patch.due_date {
            card.due_date = due_date;
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateCard(card.clone()));
        commit_batch(self.repo.as_ref(), "update card", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "update card")
                .with_board(card.board_id.clone())
                .with_detail(json!({ "card": card.id, "name": card.name })),
        )
        .await;
        Ok(card)
    }

    /// Move a card within its list or to another list of the same board.
    ///
    /// `position` is absolute and 0-based; `None` means end of the target
    /// list. Cross-board card moves are not an operation of this service.
    pub async fn move_card(
        &self,
        user: &UserId,
        card_id: &CardId,
        target_list_id: &ListId,
        position: Option<usize>,
    ) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "move card").await?;
        require_active(chain.archived_ancestor())?;

        let mut card = chain.card.clone();
        let mut batch = WriteBatch::new();
        let detail;

        if target_list_id == &card.list_id {
            let cards = self.repo.cards_in_list(&card.list_id).await?;
            let target = position.unwrap_or_else(|| cards.len().saturating_sub(1));
            let plan = ordering::move_within(&card_siblings(&cards), card_id, target)?;
            if plan.is_empty() {
                return Ok(card);
            }
            if let Some(r) = plan.iter().find(|r| &r.id == card_id) {
                card.order = r.order;
            }
            batch.push(WriteOp::ReassignCardOrders {
                list_id: card.list_id.clone(),
                plan,
            });
            detail = json!({ "card": card.id, "list": chain.list.name, "position": card.order });
        } else {
            let target_chain = self.repo.list_chain(target_list_id).await?;
            if target_chain.list.board_id != card.board_id {
                return Err(BoardwalkError::invalid_order(
                    "target list is not on the same board",
                ));
            }
            require_active(target_chain.archived_ancestor())?;

            let source_cards = self.repo.cards_in_list(&card.list_id).await?;
            let dest_cards = self.repo.cards_in_list(target_list_id).await?;
            let target = position.unwrap_or(dest_cards.len());
            let mv = ordering::move_across(
                &card_siblings(&source_cards),
                &card_siblings(&dest_cards),
                card_id,
                target,
            )?;

            if !mv.source.is_empty() {
                batch.push(WriteOp::ReassignCardOrders {
                    list_id: card.list_id.clone(),
                    plan: mv.source,
                });
            }
            let dest_plan: Vec<_> = mv.dest.into_iter().filter(|r| &r.id != card_id).collect();
            if !dest_plan.is_empty() {
                batch.push(WriteOp::ReassignCardOrders {
                    list_id: target_list_id.clone(),
                    plan: dest_plan,
                });
            }
            card.list_id = target_list_id.clone();
            card.order = mv.moved_order;
            batch.push(WriteOp::UpdateCard(card.clone()));
            detail = json!({
                "card": card.id,
                "from": chain.list.name,
                "to": target_chain.list.name,
                "position": card.order,
            });
        }

        commit_batch(self.repo.as_ref(), "move card", batch).await?;
        tracing::debug!("moved card {} to list {} position {}", card.id, card.list_id, card.order);
        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "move card")
                .with_board(card.board_id.clone())
                .with_detail(detail),
        )
        .await;
        Ok(card)
    }

    /// Apply drag-and-drop end states for several lists at once.
    ///
    /// Every referenced list is validated (existence, permission, archived
    /// state, exact card permutation) before any write; all plans then
    /// commit in one transaction. One activity record per list that had
    /// cards submitted.
    pub async fn bulk_reorder_cards(&self, user: &UserId, reorders: &[ListCardOrder]) -> Result<()> {
        let mut seen_lists = std::collections::HashSet::new();
        let mut batch = WriteBatch::new();
        let mut records = Vec::new();

        for reorder in reorders {
            if !seen_lists.insert(reorder.list_id.clone()) {
                return Err(BoardwalkError::invalid_order(format!(
                    "list {} appears twice in the payload",
                    reorder.list_id
                )));
            }
            let chain = self.repo.list_chain(&reorder.list_id).await?;
            let access = permission::resolve(user, &chain.board);
            require_write(
                &access,
                "reorder cards",
                BoardwalkError::ListNotFound { id: reorder.list_id.to_string() },
            )?;
            require_active(chain.archived_ancestor())?;

            let cards = self.repo.cards_in_list(&reorder.list_id).await?;
            let plan = ordering::bulk_replace(&card_siblings(&cards), &reorder.ordered_card_ids)?;
            if !plan.is_empty() {
                batch.push(WriteOp::ReassignCardOrders {
                    list_id: reorder.list_id.clone(),
                    plan,
                });
            }
            if !reorder.ordered_card_ids.is_empty() {
                records.push(
                    ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "reorder cards")
                        .with_board(chain.list.board_id.clone())
                        .with_detail(json!({
                            "list": reorder.list_id,
                            "name": chain.list.name,
                            "count": reorder.ordered_card_ids.len(),
                        })),
                );
            }
        }

        if !batch.is_empty() {
            commit_batch(self.repo.as_ref(), "reorder cards", batch).await?;
        }
        for record in records {
            self.emit(record).await;
        }
        Ok(())
    }

    /// Archive a card. It keeps its order slot until deleted.
    pub async fn archive_card(&self, user: &UserId, card_id: &CardId) -> Result<Card> {
        let chain = self.repo.card_chain(card_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_admin(
            &access,
            "archive card",
            BoardwalkError::CardNotFound { id: card_id.to_string() },
        )?;
        if chain.card.is_archived {
            return Err(BoardwalkError::AlreadyArchived {
                resource: "card".to_string(),
                id: card_id.to_string(),
            });
        }
        require_active(chain.parent_archived())?;

        let mut card = chain.card.clone();
        card.is_archived = true;
        card.archived_at = Some(Utc::now());
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateCard(card.clone()));
        commit_batch(self.repo.as_ref(), "archive card", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "archive card")
                .with_board(card.board_id.clone())
                .with_detail(json!({ "card": card.id, "name": card.name })),
        )
        .await;
        Ok(card)
    }

    /// Un-archive a card; rejected while its list or board is archived - a
    /// card cannot be less archived than its container.
    pub async fn restore_card(&self, user: &UserId, card_id: &CardId) -> Result<Card> {
        let chain = self.repo.card_chain(card_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_admin(
            &access,
            "restore card",
            BoardwalkError::CardNotFound { id: card_id.to_string() },
        )?;
        if !chain.card.is_archived {
            return Err(BoardwalkError::already_in_state("card is not archived"));
        }
        require_active(chain.parent_archived())?;

        let mut card = chain.card.clone();
        card.is_archived = false;
        card.archived_at = None;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateCard(card.clone()));
        commit_batch(self.repo.as_ref(), "restore card", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "restore card")
                .with_board(card.board_id.clone())
                .with_detail(json!({ "card": card.id, "name": card.name })),
        )
        .await;
        Ok(card)
    }

    /// Hard-delete an archived card: cascade its checklists, items, and
    /// completion rows, then compact the list's remaining card orders.
    /// Deleting an active card is rejected - archive-then-delete is the only
    /// destructive path.
    pub async fn delete_card(&self, user: &UserId, card_id: &CardId) -> Result<()> {
        let chain = self.repo.card_chain(card_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_admin(
            &access,
            "delete card",
            BoardwalkError::CardNotFound { id: card_id.to_string() },
        )?;
        if !chain.card.is_archived {
            return Err(BoardwalkError::NotArchived {
                resource: "card".to_string(),
                id: card_id.to_string(),
            });
        }

        let mut batch = WriteBatch::new();
        push_card_cascade(self.repo.as_ref(), &mut batch, card_id).await?;
        let cards = self.repo.cards_in_list(&chain.card.list_id).await?;
        let plan = ordering::delete_and_compact(&card_siblings(&cards), card_id)?;
        if !plan.is_empty() {
            batch.push(WriteOp::ReassignCardOrders {
                list_id: chain.card.list_id.clone(),
                plan,
            });
        }
        commit_batch(self.repo.as_ref(), "delete card", batch).await?;

        tracing::debug!("deleted card {} from list {}", card_id, chain.card.list_id);
        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "delete card")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "card": card_id, "name": chain.card.name })),
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Card attributes
    // =========================================================================

    /// Attach a board label to a card
    pub async fn add_label(&self, user: &UserId, card_id: &CardId, label_id: &LabelId) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "add label").await?;
        require_active(chain.archived_ancestor())?;

        let labels = self.repo.board_labels(&chain.card.board_id).await?;
        if !labels.iter().any(|l| &l.id == label_id) {
            return Err(BoardwalkError::not_found("label", label_id.to_string()));
        }
        let mut card = chain.card.clone();
        if card.has_label(label_id) {
            return Err(BoardwalkError::already_in_state("label is already on this card"));
        }
        card.label_ids.push(label_id.clone());
        self.commit_card_update(user, &chain, card, "add label").await
    }

    /// Detach a label from a card
    pub async fn remove_label(
        &self,
        user: &UserId,
        card_id: &CardId,
        label_id: &LabelId,
    ) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "remove label").await?;
        require_active(chain.archived_ancestor())?;

        let mut card = chain.card.clone();
        if !card.has_label(label_id) {
            return Err(BoardwalkError::already_in_state("label is not on this card"));
        }
        card.label_ids.retain(|l| l != label_id);
        self.commit_card_update(user, &chain, card, "remove label").await
    }

    /// Assign a user to a card. The assignee must be able to read the board.
    pub async fn assign_member(
        &self,
        user: &UserId,
        card_id: &CardId,
        assignee: &UserId,
    ) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "assign member").await?;
        require_active(chain.archived_ancestor())?;

        let assignee_access = permission::resolve(assignee, &chain.board);
        if !assignee_access.can_read {
            return Err(BoardwalkError::invalid_value(
                "assignee",
                "user has no access to this board",
            ));
        }
        let mut card = chain.card.clone();
        if card.has_assignee(assignee) {
            return Err(BoardwalkError::already_in_state("user is already assigned"));
        }
        card.assignees.push(assignee.clone());
        self.commit_card_update(user, &chain, card, "assign member").await
    }

    /// Remove a user from a card's assignees
    pub async fn unassign_member(
        &self,
        user: &UserId,
        card_id: &CardId,
        assignee: &UserId,
    ) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "unassign member").await?;
        require_active(chain.archived_ancestor())?;

        let mut card = chain.card.clone();
        if !card.has_assignee(assignee) {
            return Err(BoardwalkError::already_in_state("user is not assigned"));
        }
        card.assignees.retain(|a| a != assignee);
        self.commit_card_update(user, &chain, card, "unassign member").await
    }

    /// Add a comment to a card's thread
    pub async fn add_comment(&self, user: &UserId, card_id: &CardId, body: &str) -> Result<Comment> {
        let chain = self.load_writable_card(user, card_id, "add comment").await?;
        require_active(chain.archived_ancestor())?;

        let comment = Comment::new(user.clone(), body);
        let mut card = chain.card.clone();
        card.comments.push(comment.clone());
        self.commit_card_update(user, &chain, card, "add comment").await?;
        Ok(comment)
    }

    /// Delete a comment. Allowed for its author or a board administrator.
    pub async fn delete_comment(
        &self,
        user: &UserId,
        card_id: &CardId,
        comment_id: &CommentId,
    ) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "delete comment").await?;
        require_active(chain.archived_ancestor())?;

        let access = permission::resolve(user, &chain.board);
        let comment = chain
            .card
            .find_comment(comment_id)
            .ok_or_else(|| BoardwalkError::not_found("comment", comment_id.to_string()))?;
        if &comment.author != user && !access.can_administer {
            return Err(BoardwalkError::forbidden("delete comment"));
        }

        let mut card = chain.card.clone();
        card.comments.retain(|c| &c.id != comment_id);
        self.commit_card_update(user, &chain, card, "delete comment").await
    }

    /// Set a custom field value on a card, typed per the field definition
    pub async fn set_custom_field(
        &self,
        user: &UserId,
        card_id: &CardId,
        field_id: &CustomFieldId,
        value: Value,
    ) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "set custom field").await?;
        require_active(chain.archived_ancestor())?;

        let fields = self.repo.board_custom_fields(&chain.card.board_id).await?;
        let field = fields
            .iter()
            .find(|f| &f.id == field_id)
            .ok_or_else(|| BoardwalkError::not_found("custom field", field_id.to_string()))?;

        let matches_kind = match field.kind {
            CustomFieldKind::Text => value.is_string(),
            CustomFieldKind::Number => value.is_number(),
            CustomFieldKind::Checkbox => value.is_boolean(),
            CustomFieldKind::Date => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
        };
        if !matches_kind {
            return Err(BoardwalkError::invalid_value(
                field.name.clone(),
                "value does not match the field type",
            ));
        }

        let mut card = chain.card.clone();
        card.custom_values.insert(field_id.clone(), value);
        self.commit_card_update(user, &chain, card, "set custom field").await
    }

    /// Clear a custom field value from a card
    pub async fn clear_custom_field(
        &self,
        user: &UserId,
        card_id: &CardId,
        field_id: &CustomFieldId,
    ) -> Result<Card> {
        let chain = self.load_writable_card(user, card_id, "clear custom field").await?;
        require_active(chain.archived_ancestor())?;

        let mut card = chain.card.clone();
        if card.custom_values.remove(field_id).is_none() {
            return Err(BoardwalkError::already_in_state("field is not set on this card"));
        }
        self.commit_card_update(user, &chain, card, "clear custom field").await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Load a card chain and apply the write gate for `action`
    async fn load_writable_card(
        &self,
        user: &UserId,
        card_id: &CardId,
        action: &str,
    ) -> Result<CardChain> {
        let chain = self.repo.card_chain(card_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_write(
            &access,
            action,
            BoardwalkError::CardNotFound { id: card_id.to_string() },
        )?;
        Ok(chain)
    }

    /// Commit a single-card update and emit the activity record for it
    async fn commit_card_update(
        &self,
        user: &UserId,
        chain: &CardChain,
        card: Card,
        action: &str,
    ) -> Result<Card> {
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateCard(card.clone()));
        commit_batch(self.repo.as_ref(), action, batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), action)
                .with_board(card.board_id.clone())
                .with_detail(json!({ "card": card.id, "name": card.name })),
        )
        .await;
        Ok(card)
    }

}
