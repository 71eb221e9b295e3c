//! Error types for menu editing and document validation
//!
//! Structural editor operations (move, indent, outdent, ...) never fail with an
//! error: they are refused and report `false`. These errors come from the edit
//! form commit path and from whole-document validation.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by menu hierarchy validation and lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    /// Referenced menu item does not exist in the list
    #[error("Menu item '{item_id}' does not exist")]
    ItemNotFound { item_id: Uuid },

    /// Referenced menu does not exist in the store
    #[error("Menu '{menu}' not found")]
    MenuNotFound { menu: String },

    /// Menu names are unique within a store
    #[error("A menu named '{name}' already exists")]
    DuplicateMenuName { name: String },

    /// Two items in the same list share an id
    #[error("Duplicate menu item id: {item_id}")]
    DuplicateItemId { item_id: Uuid },

    /// An item references itself as parent
    #[error("Menu item '{item_id}' cannot be its own parent")]
    SelfParent { item_id: Uuid },

    /// An item references a parent that is not in the list
    #[error("Menu item '{item_id}' references missing parent '{parent_id}'")]
    DanglingParent { item_id: Uuid, parent_id: Uuid },

    /// Assigning the parent would make the item its own ancestor
    #[error("Circular reference: '{parent_id}' is '{item_id}' or one of its descendants")]
    CircularReference { item_id: Uuid, parent_id: Uuid },

    /// The item (or its subtree) would end up deeper than the cap
    #[error("Menu item '{item_id}' would reach depth {depth}, maximum is {max}")]
    DepthExceeded { item_id: Uuid, depth: usize, max: usize },

    #[error("Invalid menu location: {0}")]
    InvalidLocation(String),

    #[error("Invalid menu style: {0}")]
    InvalidStyle(String),
}

impl MenuError {
    pub fn item_not_found(item_id: Uuid) -> Self {
        Self::ItemNotFound { item_id }
    }

    pub fn menu_not_found(menu: impl Into<String>) -> Self {
        Self::MenuNotFound { menu: menu.into() }
    }

    /// True for errors that mean the hierarchy itself is malformed
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::SelfParent { .. }
                | Self::DanglingParent { .. }
                | Self::CircularReference { .. }
                | Self::DepthExceeded { .. }
                | Self::DuplicateItemId { .. }
        )
    }
}
