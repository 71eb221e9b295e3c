pub mod config;
pub mod db;
pub mod draft;
pub mod editor;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod models;
pub mod storage;
pub mod tree;

// Re-export commonly used types
pub use config::determine_menu_path;
pub use db::{create_backend, open_or_create, BackendStats, BackendType, MenuBackend};
pub use draft::{ItemDraft, MenuItemPatch};
pub use editor::{ChangeListener, Direction, MenuEditor};
pub use error::MenuError;
pub use export::{ExportFormat, MenuPayload};
pub use hierarchy::MAX_DEPTH;
pub use models::{
    Menu, MenuItem, MenuLocation, MenuStore, MenuStyle, DEFAULT_ITEM_LABEL, DEFAULT_ITEM_URL,
};
pub use storage::Storage;
pub use tree::{MenuTree, TreeEntry};
