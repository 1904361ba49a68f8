//! Newtype identifiers for every entity in the board hierarchy.
//!
//! Ids are ULID strings for entities this kernel creates. `UserId` is opaque:
//! it is whatever the external token-validation layer hands us.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Define a string-backed id newtype with ULID construction.
macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh ULID-backed id
            pub fn new() -> Self {
                Self(ulid::Ulid::new().to_string())
            }

            /// Wrap an existing id string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the id as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_id!(
    /// Opaque authenticated user id, issued by the external identity layer
    UserId
);
define_id!(
    /// Workspace id
    WorkspaceId
);
define_id!(
    /// Board id
    BoardId
);
define_id!(
    /// List id
    ListId
);
define_id!(
    /// Card id
    CardId
);
define_id!(
    /// Checklist id
    ChecklistId
);
define_id!(
    /// Checklist item id
    ChecklistItemId
);
define_id!(
    /// Board label id
    LabelId
);
define_id!(
    /// Custom field definition id
    CustomFieldId
);
define_id!(
    /// Card comment id
    CommentId
);
define_id!(
    /// Activity record id
    ActivityId
);
