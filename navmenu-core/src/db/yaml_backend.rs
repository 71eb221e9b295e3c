//! YAML file storage backend
//!
//! All menus live in one YAML file, read and written through [`Storage`]
//! and its file locking.

use anyhow::Result;
use std::path::Path;

use super::traits::{BackendType, MenuBackend, StoreUpdate};
use crate::models::MenuStore;
use crate::storage::Storage;

pub struct YamlBackend {
    storage: Storage,
}

impl YamlBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            storage: Storage::new(path),
        }
    }
}

impl MenuBackend for YamlBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Yaml
    }

    fn path(&self) -> &Path {
        self.storage.path()
    }

    fn load(&self) -> Result<MenuStore> {
        self.storage.load()
    }

    fn save(&self, store: &MenuStore) -> Result<()> {
        self.storage.save(store)
    }

    fn update_atomically(&self, update_fn: StoreUpdate<'_>) -> Result<MenuStore> {
        self.storage.update_atomically(update_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Menu, MenuItem, MenuLocation};
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_yaml_backend_create_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("menus.yaml");
        let backend = YamlBackend::new(&file_path);

        assert!(!backend.exists());
        backend.create_if_not_exists().unwrap();
        assert!(backend.exists());

        let store = backend.load().unwrap();
        assert!(store.menus.is_empty());
    }

    #[test]
    fn test_yaml_backend_menu_crud() {
        let temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        let backend = YamlBackend::new(temp_file.path());
        backend.save(&MenuStore::new()).unwrap();

        let mut menu = Menu::new("Main", MenuLocation::Header);
        menu.items.push(MenuItem::new("Home", "/"));
        let menu = backend.add_menu(menu).unwrap();

        // Duplicate names are refused
        assert!(backend
            .add_menu(Menu::new("MAIN", MenuLocation::Footer))
            .is_err());

        let mut loaded = backend.get_menu_by_name("main").unwrap().unwrap();
        assert_eq!(loaded.id, menu.id);
        assert_eq!(loaded.items[0].label, "Home");

        loaded.active = false;
        backend.update_menu(&loaded).unwrap();
        assert!(!backend.get_menu(&menu.id).unwrap().unwrap().active);

        let stats = backend.stats().unwrap();
        assert_eq!(stats.menu_count, 1);
        assert_eq!(stats.active_menu_count, 0);
        assert_eq!(stats.item_count, 1);

        backend.delete_menu(&menu.id).unwrap();
        assert!(backend.list_menus().unwrap().is_empty());
        assert!(backend.delete_menu(&menu.id).is_err());
    }

    #[test]
    fn test_concurrent_sessions_keep_every_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menus.yaml");
        YamlBackend::new(&path).create_if_not_exists().unwrap();

        let sessions: Vec<_> = (0..2)
            .map(|session| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let backend: Box<dyn MenuBackend> = Box::new(YamlBackend::new(&path));
                    for n in 0..10 {
                        let name = format!("Menu {}-{}", session, n);
                        backend.add_menu(Menu::new(name, MenuLocation::Footer)).unwrap();
                    }
                })
            })
            .collect();
        for session in sessions {
            session.join().unwrap();
        }

        let backend = YamlBackend::new(&path);
        assert_eq!(backend.list_menus().unwrap().len(), 20);
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let backend = YamlBackend::new(dir.path().join("menus.yaml"));
        let menu = backend.add_menu(Menu::new("Main", MenuLocation::Header)).unwrap();

        let mut ghost = Menu::new("Ghost", MenuLocation::Mobile);
        ghost.id = uuid::Uuid::new_v4();
        let dyn_backend: &dyn MenuBackend = &backend;
        assert!(dyn_backend.update_menu(&ghost).is_err());

        let menus = backend.list_menus().unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].id, menu.id);
    }
}
