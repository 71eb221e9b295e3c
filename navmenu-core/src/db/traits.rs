//! Storage backend traits
//!
//! Every backend can load and save the whole [`MenuStore`] and apply an
//! update under its write lock; the per-menu writes have default
//! implementations on top of [`MenuBackend::update_atomically`].

use anyhow::Result;
use std::path::Path;
use uuid::Uuid;

use crate::models::{Menu, MenuStore};

/// A change applied to the whole store; an error aborts the write
pub type StoreUpdate<'a> = Box<dyn FnOnce(&mut MenuStore) -> Result<()> + 'a>;

/// Types of storage backends available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Single YAML file
    Yaml,
    /// SQLite database file
    Sqlite,
}

impl BackendType {
    /// Infers the backend from a file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("db") | Some("sqlite") | Some("sqlite3") => BackendType::Sqlite,
            _ => BackendType::Yaml,
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Yaml => write!(f, "YAML"),
            BackendType::Sqlite => write!(f, "SQLite"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(BackendType::Yaml),
            "sqlite" | "db" => Ok(BackendType::Sqlite),
            other => anyhow::bail!("Unknown backend type: {} (expected yaml or sqlite)", other),
        }
    }
}

/// Core trait for menu storage backends
pub trait MenuBackend: Send + Sync {
    fn backend_type(&self) -> BackendType;

    /// Path to the underlying file
    fn path(&self) -> &Path;

    /// Loads every menu
    fn load(&self) -> Result<MenuStore>;

    /// Replaces the stored menus with `store`
    fn save(&self, store: &MenuStore) -> Result<()>;

    /// Reads the store, applies `update_fn` and writes the result back while
    /// holding the backend's write lock for the whole cycle
    ///
    /// Nothing is written when `update_fn` fails.
    fn update_atomically(&self, update_fn: StoreUpdate<'_>) -> Result<MenuStore>;

    // =========================================================================
    // Menu operations
    // =========================================================================

    fn get_menu(&self, id: &Uuid) -> Result<Option<Menu>> {
        let store = self.load()?;
        Ok(store.get_menu_by_id(id).cloned())
    }

    /// Case-insensitive name lookup
    fn get_menu_by_name(&self, name: &str) -> Result<Option<Menu>> {
        let store = self.load()?;
        Ok(store.get_menu_by_name(name).cloned())
    }

    fn list_menus(&self) -> Result<Vec<Menu>> {
        Ok(self.load()?.menus)
    }

    /// Adds a menu; names must be unique
    fn add_menu(&self, menu: Menu) -> Result<Menu> {
        let added = menu.clone();
        self.update_atomically(Box::new(move |store: &mut MenuStore| -> Result<()> {
            store.add_menu(menu)?;
            Ok(())
        }))?;
        Ok(added)
    }

    /// Replaces a stored menu with the same id
    fn update_menu(&self, menu: &Menu) -> Result<()> {
        self.update_atomically(Box::new(|store: &mut MenuStore| -> Result<()> {
            match store.get_menu_by_id_mut(&menu.id) {
                Some(existing) => {
                    *existing = menu.clone();
                    Ok(())
                }
                None => anyhow::bail!("Menu not found: {}", menu.id),
            }
        }))?;
        Ok(())
    }

    fn delete_menu(&self, id: &Uuid) -> Result<()> {
        self.update_atomically(Box::new(|store: &mut MenuStore| -> Result<()> {
            if store.remove_menu(id).is_none() {
                anyhow::bail!("Menu not found: {}", id)
            }
            Ok(())
        }))?;
        Ok(())
    }

    // =========================================================================
    // Utility operations
    // =========================================================================

    fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Creates an empty store if the file does not exist yet
    fn create_if_not_exists(&self) -> Result<()> {
        if !self.exists() {
            self.save(&MenuStore::new())?;
        }
        Ok(())
    }

    fn stats(&self) -> Result<BackendStats> {
        let store = self.load()?;
        Ok(BackendStats {
            menu_count: store.menus.len(),
            active_menu_count: store.menus.iter().filter(|m| m.active).count(),
            item_count: store.menus.iter().map(|m| m.items.len()).sum(),
            backend_type: self.backend_type(),
        })
    }
}

/// Statistics about a menu store
#[derive(Debug, Clone)]
pub struct BackendStats {
    pub menu_count: usize,
    pub active_menu_count: usize,
    pub item_count: usize,
    pub backend_type: BackendType,
}
