//! Error types for the board kernel

use thiserror::Error;

/// Result type for kernel operations
pub type Result<T> = std::result::Result<T, BoardwalkError>;

/// Transport-facing classification of an error. The HTTP layer maps kinds to
/// status codes; the kernel only ever reasons in kinds and variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity missing, chain traversal broken, or caller has no read
    /// relationship at all (existence is not leaked)
    NotFound,
    /// Caller can see the entity but lacks the capability
    Forbidden,
    /// Archived guard, duplicate name, already-in-state, delete-before-archive
    Conflict,
    /// Malformed reorder payload or otherwise invalid input
    InvalidOrder,
    /// Storage/transaction failure
    Internal,
}

/// Errors that can occur in kernel operations
#[derive(Debug, Error)]
pub enum BoardwalkError {
    /// Workspace not found
    #[error("workspace not found: {id}")]
    WorkspaceNotFound { id: String },

    /// Board not found
    #[error("board not found: {id}")]
    BoardNotFound { id: String },

    /// List not found
    #[error("list not found: {id}")]
    ListNotFound { id: String },

    /// Card not found
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Checklist not found
    #[error("checklist not found: {id}")]
    ChecklistNotFound { id: String },

    /// Checklist item not found
    #[error("checklist item not found: {id}")]
    ItemNotFound { id: String },

    /// Membership row not found
    #[error("member not found: {user_id}")]
    MemberNotFound { user_id: String },

    /// Generic resource not found (labels, comments, custom fields)
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Capability check failed
    #[error("forbidden: {action}")]
    Forbidden { action: String },

    /// Write blocked because an ancestor is archived
    #[error("{resource} {id} is archived")]
    ArchivedAncestor { resource: String, id: String },

    /// Archive requested on an already-archived entity
    #[error("{resource} {id} is already archived")]
    AlreadyArchived { resource: String, id: String },

    /// Hard delete requested on an entity that was never archived
    #[error("{resource} {id} must be archived before it can be deleted")]
    NotArchived { resource: String, id: String },

    /// Name collides with a sibling
    #[error("{resource} named '{name}' already exists")]
    DuplicateName { resource: String, name: String },

    /// State-transition no-op requested (already restored, already a member, ...)
    #[error("conflict: {message}")]
    AlreadyInState { message: String },

    /// Malformed reorder payload
    #[error("invalid order: {message}")]
    InvalidOrder { message: String },

    /// Invalid field value or self-action guard violation
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Underlying storage failure; logged with operation context at the call
    /// site, never swallowed
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl BoardwalkError {
    /// Create a forbidden error for a named action
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    /// Create a generic not-found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an invalid-order error
    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::InvalidOrder {
            message: message.into(),
        }
    }

    /// Create an invalid-value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an already-in-state conflict
    pub fn already_in_state(message: impl Into<String>) -> Self {
        Self::AlreadyInState {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Classify this error for the transport layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WorkspaceNotFound { .. }
            | Self::BoardNotFound { .. }
            | Self::ListNotFound { .. }
            | Self::CardNotFound { .. }
            | Self::ChecklistNotFound { .. }
            | Self::ItemNotFound { .. }
            | Self::MemberNotFound { .. }
            | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::ArchivedAncestor { .. }
            | Self::AlreadyArchived { .. }
            | Self::NotArchived { .. }
            | Self::DuplicateName { .. }
            | Self::AlreadyInState { .. } => ErrorKind::Conflict,
            Self::InvalidOrder { .. } | Self::InvalidValue { .. } => ErrorKind::InvalidOrder,
            Self::Storage { .. } => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidOrder => "invalid_order",
            ErrorKind::Internal => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoardwalkError::CardNotFound { id: "abc123".into() };
        assert_eq!(err.to_string(), "card not found: abc123");
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            BoardwalkError::forbidden("move card").kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            BoardwalkError::ArchivedAncestor {
                resource: "list".into(),
                id: "l1".into()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            BoardwalkError::invalid_order("duplicate id").kind(),
            ErrorKind::InvalidOrder
        );
        assert_eq!(
            BoardwalkError::storage("connection reset").kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            BoardwalkError::not_found("label", "x").kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_stable_codes() {
        assert_eq!(BoardwalkError::forbidden("x").code(), "forbidden");
        assert_eq!(
            BoardwalkError::NotArchived {
                resource: "card".into(),
                id: "c1".into()
            }
            .code(),
            "conflict"
        );
    }

    #[test]
    fn test_helper_constructors() {
        let err = BoardwalkError::invalid_value("member", "cannot remove yourself");
        assert!(err.to_string().contains("cannot remove yourself"));
        let err = BoardwalkError::already_in_state("card is already archived");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
