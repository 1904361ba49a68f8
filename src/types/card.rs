//! Card types: Card and its comment thread

use super::ids::{BoardId, CardId, CommentId, CustomFieldId, LabelId, ListId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A card on a board.
///
/// `list_id` is the current parent and changes on move; `board_id` is a
/// denormalized copy of the list's board, kept in sync by the move path.
/// `order` values of the cards of one list are always the dense sequence
/// `0..n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub board_id: BoardId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub order: usize,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Labels attached to this card (board-scoped label ids)
    #[serde(default)]
    pub label_ids: Vec<LabelId>,

    /// Users assigned to this card
    #[serde(default)]
    pub assignees: Vec<UserId>,

    /// Comment thread
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Custom field values keyed by field definition id
    #[serde(default)]
    pub custom_values: BTreeMap<CustomFieldId, serde_json::Value>,
}

impl Card {
    /// Create a new card at the given order slot
    pub fn new(
        list_id: ListId,
        board_id: BoardId,
        name: impl Into<String>,
        order: usize,
    ) -> Self {
        Self {
            id: CardId::new(),
            list_id,
            board_id,
            name: name.into(),
            description: String::new(),
            order,
            is_archived: false,
            archived_at: None,
            start_date: None,
            due_date: None,
            label_ids: Vec::new(),
            assignees: Vec::new(),
            comments: Vec::new(),
            custom_values: BTreeMap::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the card carries the given label
    pub fn has_label(&self, label_id: &LabelId) -> bool {
        self.label_ids.contains(label_id)
    }

    /// Whether the user is assigned to the card
    pub fn has_assignee(&self, user_id: &UserId) -> bool {
        self.assignees.contains(user_id)
    }

    /// Find a comment by ID
    pub fn find_comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    /// Find a comment by ID (mutable)
    pub fn find_comment_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| &c.id == id)
    }
}

/// A comment on a card - part of the discussion thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub author: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment
    pub fn new(author: UserId, body: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(),
            author,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card::new(
            ListId::from_string("l1"),
            BoardId::from_string("b1"),
            "Ship it",
            0,
        )
    }

    #[test]
    fn test_card_creation() {
        let c = card();
        assert_eq!(c.name, "Ship it");
        assert_eq!(c.order, 0);
        assert!(c.description.is_empty());
        assert!(!c.is_archived);
        assert!(c.label_ids.is_empty());
    }

    #[test]
    fn test_card_label_and_assignee_lookup() {
        let mut c = card();
        let label = LabelId::from_string("lab1");
        let user = UserId::from_string("bob");
        assert!(!c.has_label(&label));
        c.label_ids.push(label.clone());
        c.assignees.push(user.clone());
        assert!(c.has_label(&label));
        assert!(c.has_assignee(&user));
    }

    #[test]
    fn test_card_comments() {
        let mut c = card();
        let comment = Comment::new(UserId::from_string("bob"), "looks good");
        let id = comment.id.clone();
        c.comments.push(comment);
        assert_eq!(c.find_comment(&id).unwrap().body, "looks good");
        c.find_comment_mut(&id).unwrap().body = "edited".into();
        assert_eq!(c.find_comment(&id).unwrap().body, "edited");
    }

    #[test]
    fn test_card_serialization() {
        let c = card().with_description("Before Friday");
        let json = serde_json::to_string(&c).unwrap();
        let parsed: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.description, "Before Friday");
        // unset optional dates are omitted
        assert!(!json.contains("due_date"));
    }
}
