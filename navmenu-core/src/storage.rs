use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::hierarchy;
use crate::models::MenuStore;

/// How long to wait for another admin session to release the file
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles saving and loading menus from a YAML file with file locking,
/// so two admin sessions cannot interleave partial writes
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("yaml.lock");
        Self {
            file_path,
            lock_file_path,
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Acquire an exclusive lock on the file for writing
    /// Returns the lock file handle which must be held during the operation
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        let start = std::time::Instant::now();

        loop {
            match FileExt::try_lock_exclusive(&lock_file) {
                Ok(()) => return Ok(lock_file),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another session may be editing: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Acquire a shared lock on the file for reading
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        let start = std::time::Instant::now();

        loop {
            match FileExt::try_lock_shared(&lock_file) {
                Ok(()) => return Ok(Some(lock_file)),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another session may be editing: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    fn read_store(&self) -> Result<MenuStore> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))
    }

    fn write_store(&self, lock_file: &mut File, store: &MenuStore) -> Result<()> {
        // Lock holder info, for whoever finds a stale lock file
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let yaml = serde_yaml::to_string(store)?;
        fs::write(&self.file_path, yaml)?;
        Ok(())
    }

    /// Loads menus from the YAML file with file locking
    ///
    /// A missing file is created with an empty store. Stale item positions
    /// are renumbered and written back.
    pub fn load(&self) -> Result<MenuStore> {
        if !self.file_path.exists() {
            let default_store = MenuStore::new();
            self.save(&default_store)?;
            return Ok(default_store);
        }

        let lock = self.acquire_read_lock()?;
        let mut store = self.read_store()?;
        drop(lock);

        for menu in &store.menus {
            let dangling = hierarchy::dangling_parents(&menu.items);
            if !dangling.is_empty() {
                warn!(
                    menu = %menu.name,
                    count = dangling.len(),
                    "menu has items whose parent no longer exists"
                );
            }
        }

        if store.normalize() {
            info!(path = ?self.file_path, "renumbered stale menu item positions");
            self.save(&store)?;
        }

        store.validate_unique_names()?;

        Ok(store)
    }

    /// Saves menus to the YAML file with file locking
    pub fn save(&self, store: &MenuStore) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut lock_file = self.acquire_write_lock()?;
        self.write_store(&mut lock_file, store)?;
        info!(path = ?self.file_path, menus = store.menus.len(), "saved menu store");

        // Lock is released when lock_file is dropped
        Ok(())
    }

    /// Perform an atomic update operation with proper locking
    /// This reloads the file, applies changes, and saves under one lock.
    /// A missing file counts as an empty store; nothing is written if
    /// `update_fn` fails.
    pub fn update_atomically<F>(&self, update_fn: F) -> Result<MenuStore>
    where
        F: FnOnce(&mut MenuStore) -> Result<()>,
    {
        let mut lock_file = self.acquire_write_lock()?;

        let mut store = if self.file_path.exists() {
            self.read_store()?
        } else {
            MenuStore::new()
        };
        update_fn(&mut store)?;
        store.normalize();
        store.validate_unique_names()?;

        self.write_store(&mut lock_file, &store)?;
        info!(path = ?self.file_path, menus = store.menus.len(), "updated menu store");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Menu, MenuItem, MenuLocation};
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("menus.yaml");
        let storage = Storage::new(&path);

        let store = storage.load().unwrap();
        assert!(store.menus.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("menus.yaml"));

        let mut store = MenuStore::new();
        let mut menu = Menu::new("Main", MenuLocation::Header);
        let shop = MenuItem::new("Shop", "/shop");
        let shoes = MenuItem::new("Shoes", "/shop/shoes").with_parent(shop.id);
        menu.items = vec![shop.clone(), shoes];
        crate::hierarchy::renumber(&mut menu.items);
        store.add_menu(menu).unwrap();

        storage.save(&store).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded.menus.len(), 1);
        let items = &loaded.menus[0].items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].parent_id, Some(shop.id));
        assert_eq!(items[1].order, 1);
    }

    #[test]
    fn test_load_renumbers_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menus.yaml");
        let storage = Storage::new(&path);

        let mut store = MenuStore::new();
        let mut menu = Menu::new("Footer", MenuLocation::Footer);
        let mut a = MenuItem::new("A", "/a");
        a.order = 3;
        let mut b = MenuItem::new("B", "/b");
        b.order = 3;
        menu.items = vec![a, b];
        store.menus.push(menu);
        storage.save(&store).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.menus[0].items[1].order, 1);

        // The fix was written back to disk
        let raw = fs::read_to_string(&path).unwrap();
        let on_disk: MenuStore = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(on_disk.menus[0].items[0].order, 0);
        assert_eq!(on_disk.menus[0].items[1].order, 1);
    }

    #[test]
    fn test_load_rejects_duplicate_names() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("menus.yaml"));

        let mut store = MenuStore::new();
        store.menus.push(Menu::new("Main", MenuLocation::Header));
        store.menus.push(Menu::new("main", MenuLocation::Footer));
        storage.save(&store).unwrap();

        assert!(storage.load().is_err());
    }

    #[test]
    fn test_update_atomically() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("menus.yaml"));

        let store = storage
            .update_atomically(|store| {
                store.menus.push(Menu::new("Sidebar", MenuLocation::Sidebar));
                Ok(())
            })
            .unwrap();
        assert_eq!(store.menus.len(), 1);

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.menus[0].name, "Sidebar");
    }

    #[test]
    fn test_update_atomically_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menus.yaml");
        let storage = Storage::new(&path);
        storage
            .update_atomically(|store| {
                store.menus.push(Menu::new("Main", MenuLocation::Header));
                Ok(())
            })
            .unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let result = storage.update_atomically(|store| {
            store.menus.clear();
            anyhow::bail!("changed my mind")
        });
        assert!(result.is_err());

        // A duplicate name introduced by the update is refused as well
        let result = storage.update_atomically(|store| {
            store.menus.push(Menu::new("MAIN", MenuLocation::Footer));
            Ok(())
        });
        assert!(result.is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }
}
