//! ChecklistService: checklist and checklist-item mutations, including the
//! per-user completion ledger.

use super::{
    checklist_siblings, commit_batch, emit, item_siblings, push_checklist_cascade, require_active,
    require_write,
};
use crate::activity::ActivityEntry;
use crate::error::{BoardwalkError, Result};
use crate::ordering;
use crate::permission;
use crate::repo::{ActivityLogger, BoardCache, EntityRepository, WriteBatch, WriteOp};
use crate::types::{
    CardId, Checklist, ChecklistChain, ChecklistId, ChecklistItem, ChecklistItemId, ItemChain,
    ItemCompletion, UserId,
};
use serde_json::json;
use std::sync::Arc;

/// Orchestrates checklist and item operations with the same shape as the
/// board hierarchy service: chain, permission, archived guard, ordering
/// plan, one commit, side effects.
pub struct ChecklistService<R> {
    repo: Arc<R>,
    activity: Arc<dyn ActivityLogger>,
    cache: Arc<dyn BoardCache>,
}

impl<R: EntityRepository> ChecklistService<R> {
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
    // Checklists
    // =========================================================================

    /// Add a checklist to a card, appended or spliced in at `position`
    pub async fn add_checklist(
        &self,
        user: &UserId,
        card_id: &CardId,
        title: &str,
        position: Option<usize>,
    ) -> Result<Checklist> {
        let chain = self.repo.card_chain(card_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_write(
            &access,
            "add checklist",
            BoardwalkError::CardNotFound { id: card_id.to_string() },
        )?;
        require_active(chain.archived_ancestor())?;

        let checklists = self.repo.checklists_in_card(card_id).await?;
        let mut batch = WriteBatch::new();
        let order = match position {
            None => ordering::append_end(&checklist_siblings(&checklists)),
            Some(position) => {
                let (order, plan) = ordering::insert_at(&checklist_siblings(&checklists), position);
                if !plan.is_empty() {
                    batch.push(WriteOp::ReassignChecklistOrders {
                        card_id: card_id.clone(),
                        plan,
                    });
                }
                order
            }
        };
        let checklist = Checklist::new(card_id.clone(), title, order);
        batch.push(WriteOp::InsertChecklist(checklist.clone()));
        commit_batch(self.repo.as_ref(), "add checklist", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "add checklist")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "checklist": checklist.id, "title": title, "card": card_id })),
        )
        .await;
        Ok(checklist)
    }

    /// Rename a checklist
    pub async fn rename_checklist(
        &self,
        user: &UserId,
        checklist_id: &ChecklistId,
        title: &str,
    ) -> Result<Checklist> {
        let chain = self.load_writable_checklist(user, checklist_id, "rename checklist").await?;
        require_active(chain.archived_ancestor())?;

        let mut checklist = chain.checklist.clone();
        checklist.title = title.to_string();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateChecklist(checklist.clone()));
        commit_batch(self.repo.as_ref(), "rename checklist", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "rename checklist")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "checklist": checklist.id, "title": title })),
        )
        .await;
        Ok(checklist)
    }

    /// Expand or collapse a checklist. Idempotent.
    pub async fn set_checklist_visibility(
        &self,
        user: &UserId,
        checklist_id: &ChecklistId,
        is_show: bool,
    ) -> Result<Checklist> {
        let chain = self
            .load_writable_checklist(user, checklist_id, "set checklist visibility")
            .await?;
        require_active(chain.archived_ancestor())?;

        let mut checklist = chain.checklist.clone();
        if checklist.is_show == is_show {
            return Ok(checklist);
        }
        checklist.is_show = is_show;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateChecklist(checklist.clone()));
        commit_batch(self.repo.as_ref(), "set checklist visibility", batch).await?;
        Ok(checklist)
    }

    /// Move a checklist to `position` within its card
    pub async fn move_checklist(
        &self,
        user: &UserId,
        checklist_id: &ChecklistId,
        position: usize,
    ) -> Result<Checklist> {
        let chain = self.load_writable_checklist(user, checklist_id, "move checklist").await?;
        require_active(chain.archived_ancestor())?;

        let checklists = self.repo.checklists_in_card(&chain.checklist.card_id).await?;
        let plan = ordering::move_within(&checklist_siblings(&checklists), checklist_id, position)?;
        let mut checklist = chain.checklist.clone();
        if plan.is_empty() {
            return Ok(checklist);
        }
        if let Some(r) = plan.iter().find(|r| &r.id == checklist_id) {
            checklist.order = r.order;
        }
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::ReassignChecklistOrders {
            card_id: chain.checklist.card_id.clone(),
            plan,
        });
        commit_batch(self.repo.as_ref(), "move checklist", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "move checklist")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "checklist": checklist.id, "position": checklist.order })),
        )
        .await;
        Ok(checklist)
    }

    /// Delete a checklist: completion rows, then items, then the checklist,
    /// then compact the card's remaining checklist orders.
    pub async fn delete_checklist(&self, user: &UserId, checklist_id: &ChecklistId) -> Result<()> {
        let chain = self.load_writable_checklist(user, checklist_id, "delete checklist").await?;
        require_active(chain.archived_ancestor())?;

        let mut batch = WriteBatch::new();
        push_checklist_cascade(self.repo.as_ref(), &mut batch, checklist_id).await?;
        let checklists = self.repo.checklists_in_card(&chain.checklist.card_id).await?;
        let plan = ordering::delete_and_compact(&checklist_siblings(&checklists), checklist_id)?;
        if !plan.is_empty() {
            batch.push(WriteOp::ReassignChecklistOrders {
                card_id: chain.checklist.card_id.clone(),
                plan,
            });
        }
        commit_batch(self.repo.as_ref(), "delete checklist", batch).await?;

        tracing::debug!("deleted checklist {} from card {}", checklist_id, chain.checklist.card_id);
        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "delete checklist")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "checklist": checklist_id, "title": chain.checklist.title })),
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Add an item to a checklist, appended or spliced in at `position`
    pub async fn add_item(
        &self,
        user: &UserId,
        checklist_id: &ChecklistId,
        name: &str,
        position: Option<usize>,
    ) -> Result<ChecklistItem> {
        let chain = self.load_writable_checklist(user, checklist_id, "add item").await?;
        require_active(chain.archived_ancestor())?;

        let items = self.repo.items_in_checklist(checklist_id).await?;
        let mut batch = WriteBatch::new();
        let order = match position {
            None => ordering::append_end(&item_siblings(&items)),
            Some(position) => {
                let (order, plan) = ordering::insert_at(&item_siblings(&items), position);
                if !plan.is_empty() {
                    batch.push(WriteOp::ReassignItemOrders {
                        checklist_id: checklist_id.clone(),
                        plan,
                    });
                }
                order
            }
        };
        let item = ChecklistItem::new(checklist_id.clone(), name, order);
        batch.push(WriteOp::InsertItem(item.clone()));
        commit_batch(self.repo.as_ref(), "add item", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "add item")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "item": item.id, "name": name, "checklist": checklist_id })),
        )
        .await;
        Ok(item)
    }

    /// Rename an item
    pub async fn rename_item(
        &self,
        user: &UserId,
        item_id: &ChecklistItemId,
        name: &str,
    ) -> Result<ChecklistItem> {
        let chain = self.load_writable_item(user, item_id, "rename item").await?;
        require_active(chain.archived_ancestor())?;

        let mut item = chain.item.clone();
        item.name = name.to_string();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateItem(item.clone()));
        commit_batch(self.repo.as_ref(), "rename item", batch).await?;
        Ok(item)
    }

    /// Move an item within its checklist, or to another checklist of the
    /// same card when `target_checklist_id` differs.
    pub async fn move_item(
        &self,
        user: &UserId,
        item_id: &ChecklistItemId,
        target_checklist_id: &ChecklistId,
        position: usize,
    ) -> Result<ChecklistItem> {
        let chain = self.load_writable_item(user, item_id, "move item").await?;
        require_active(chain.archived_ancestor())?;

        let mut item = chain.item.clone();
        let mut batch = WriteBatch::new();

        if target_checklist_id == &item.checklist_id {
            let items = self.repo.items_in_checklist(&item.checklist_id).await?;
            let plan = ordering::move_within(&item_siblings(&items), item_id, position)?;
            if plan.is_empty() {
                return Ok(item);
            }
            if let Some(r) = plan.iter().find(|r| &r.id == item_id) {
                item.order = r.order;
            }
            batch.push(WriteOp::ReassignItemOrders {
                checklist_id: item.checklist_id.clone(),
                plan,
            });
        } else {
            let target = self.repo.checklist_chain(target_checklist_id).await?;
            if target.checklist.card_id != chain.checklist.card_id {
                return Err(BoardwalkError::invalid_order(
                    "target checklist is not on the same card",
                ));
            }
            let source_items = self.repo.items_in_checklist(&item.checklist_id).await?;
            let dest_items = self.repo.items_in_checklist(target_checklist_id).await?;
            let mv = ordering::move_across(
                &item_siblings(&source_items),
                &item_siblings(&dest_items),
                item_id,
                position,
            )?;

            if !mv.source.is_empty() {
                batch.push(WriteOp::ReassignItemOrders {
                    checklist_id: item.checklist_id.clone(),
                    plan: mv.source,
                });
            }
            let dest_plan: Vec<_> = mv.dest.into_iter().filter(|r| &r.id != item_id).collect();
            if !dest_plan.is_empty() {
                batch.push(WriteOp::ReassignItemOrders {
                    checklist_id: target_checklist_id.clone(),
                    plan: dest_plan,
                });
            }
            item.checklist_id = target_checklist_id.clone();
            item.order = mv.moved_order;
            batch.push(WriteOp::UpdateItem(item.clone()));
        }

        commit_batch(self.repo.as_ref(), "move item", batch).await?;
        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "move item")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "item": item.id, "position": item.order })),
        )
        .await;
        Ok(item)
    }

    /// Delete an item: its completion rows first, then the item, then
    /// compact the checklist's remaining item orders.
    pub async fn delete_item(&self, user: &UserId, item_id: &ChecklistItemId) -> Result<()> {
        let chain = self.load_writable_item(user, item_id, "delete item").await?;
        require_active(chain.archived_ancestor())?;

        let mut batch = WriteBatch::new();
        for completion in self.repo.item_completions(item_id).await? {
            batch.push(WriteOp::DeleteCompletion {
                item_id: item_id.clone(),
                user_id: completion.user_id,
            });
        }
        batch.push(WriteOp::DeleteItem(item_id.clone()));
        let items = self.repo.items_in_checklist(&chain.item.checklist_id).await?;
        let plan = ordering::delete_and_compact(&item_siblings(&items), item_id)?;
        if !plan.is_empty() {
            batch.push(WriteOp::ReassignItemOrders {
                checklist_id: chain.item.checklist_id.clone(),
                plan,
            });
        }
        commit_batch(self.repo.as_ref(), "delete item", batch).await?;

        self.emit(
            ActivityEntry::new(chain.board.workspace.id.clone(), user.clone(), "delete item")
                .with_board(chain.card.board_id.clone())
                .with_detail(json!({ "item": item_id, "name": chain.item.name })),
        )
        .await;
        Ok(())
    }

    /// Record or withdraw the caller's completion of an item. Idempotent per
    /// user: completing again refreshes the timestamp, un-completing with no
    /// row is a no-op. `is_checked` reflects whether any user's completion
    /// remains.
    pub async fn toggle_item_completion(
        &self,
        user: &UserId,
        item_id: &ChecklistItemId,
        completed: bool,
    ) -> Result<ChecklistItem> {
        let chain = self.load_writable_item(user, item_id, "toggle item completion").await?;
        require_active(chain.archived_ancestor())?;

        let completions = self.repo.item_completions(item_id).await?;
        let mut item = chain.item.clone();
        let mut batch = WriteBatch::new();

        if completed {
            batch.push(WriteOp::UpsertCompletion(ItemCompletion::new(
                item_id.clone(),
                user.clone(),
            )));
            item.is_checked = true;
        } else {
            if completions.iter().any(|c| &c.user_id == user) {
                batch.push(WriteOp::DeleteCompletion {
                    item_id: item_id.clone(),
                    user_id: user.clone(),
                });
            }
            item.is_checked = completions.iter().any(|c| &c.user_id != user);
        }
        batch.push(WriteOp::UpdateItem(item.clone()));
        commit_batch(self.repo.as_ref(), "toggle item completion", batch).await?;

        self.emit(
            ActivityEntry::new(
                chain.board.workspace.id.clone(),
                user.clone(),
                if completed { "complete item" } else { "uncomplete item" },
            )
            .with_board(chain.card.board_id.clone())
            .with_detail(json!({ "item": item.id, "name": item.name })),
        )
        .await;
        Ok(item)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn load_writable_checklist(
        &self,
        user: &UserId,
        checklist_id: &ChecklistId,
        action: &str,
    ) -> Result<ChecklistChain> {
        let chain = self.repo.checklist_chain(checklist_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_write(
            &access,
            action,
            BoardwalkError::ChecklistNotFound { id: checklist_id.to_string() },
        )?;
        Ok(chain)
    }

    async fn load_writable_item(
        &self,
        user: &UserId,
        item_id: &ChecklistItemId,
        action: &str,
    ) -> Result<ItemChain> {
        let chain = self.repo.item_chain(item_id).await?;
        let access = permission::resolve(user, &chain.board);
        require_write(
            &access,
            action,
            BoardwalkError::ItemNotFound { id: item_id.to_string() },
        )?;
        Ok(chain)
    }
}
