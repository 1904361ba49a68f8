//! Checklist types: Checklist, ChecklistItem, and the per-user completion ledger

use super::ids::{CardId, ChecklistId, ChecklistItemId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A checklist on a card. `order` is dense within the owning card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    pub card_id: CardId,
    pub title: String,
    pub order: usize,
    /// Whether the checklist is expanded in the UI
    #[serde(default = "default_true")]
    pub is_show: bool,
}

fn default_true() -> bool {
    true
}

impl Checklist {
    /// Create a checklist at the given order slot
    pub fn new(card_id: CardId, title: impl Into<String>, order: usize) -> Self {
        Self {
            id: ChecklistId::new(),
            card_id,
            title: title.into(),
            order,
            is_show: true,
        }
    }
}

/// A single item on a checklist. `order` is dense within the owning checklist.
///
/// `is_checked` reflects whether any completion rows exist; the rows
/// themselves record which users completed the item and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub checklist_id: ChecklistId,
    pub name: String,
    pub order: usize,
    #[serde(default)]
    pub is_checked: bool,
}

impl ChecklistItem {
    /// Create an item at the given order slot
    pub fn new(checklist_id: ChecklistId, name: impl Into<String>, order: usize) -> Self {
        Self {
            id: ChecklistItemId::new(),
            checklist_id,
            name: name.into(),
            order,
            is_checked: false,
        }
    }
}

/// One user's current completion of one checklist item.
///
/// (item_id, user_id) is unique; only the current state is kept, not a
/// history of toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemCompletion {
    pub item_id: ChecklistItemId,
    pub user_id: UserId,
    pub completed_at: DateTime<Utc>,
}

impl ItemCompletion {
    /// Record a completion by `user_id` now
    pub fn new(item_id: ChecklistItemId, user_id: UserId) -> Self {
        Self {
            item_id,
            user_id,
            completed_at: Utc::now(),
        }
    }
}
