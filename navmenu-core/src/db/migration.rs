//! Moving menus between storage backends
//!
//! Covers YAML ↔ SQLite migration plus a JSON dump for backup and for
//! handing menus to other tools.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::traits::MenuBackend;
use super::{SqliteBackend, YamlBackend};
use crate::error::MenuError;
use crate::models::MenuStore;
use crate::tree;

/// Copies every menu from a YAML file into a SQLite database
///
/// Returns the number of menus migrated.
pub fn migrate_yaml_to_sqlite<P1: AsRef<Path>, P2: AsRef<Path>>(
    yaml_path: P1,
    sqlite_path: P2,
) -> Result<usize> {
    let yaml_backend = YamlBackend::new(yaml_path);
    let sqlite_backend = SqliteBackend::new(sqlite_path)?;

    let store = yaml_backend
        .load()
        .context("Failed to load YAML menu file")?;
    let count = store.menus.len();

    sqlite_backend
        .save(&store)
        .context("Failed to save to SQLite database")?;

    info!(count, "migrated menus from YAML to SQLite");
    Ok(count)
}

/// Copies every menu from a SQLite database into a YAML file
///
/// Returns the number of menus migrated.
pub fn migrate_sqlite_to_yaml<P1: AsRef<Path>, P2: AsRef<Path>>(
    sqlite_path: P1,
    yaml_path: P2,
) -> Result<usize> {
    let sqlite_backend = SqliteBackend::new(sqlite_path)?;
    let yaml_backend = YamlBackend::new(yaml_path);

    let store = sqlite_backend
        .load()
        .context("Failed to load SQLite database")?;
    let count = store.menus.len();

    yaml_backend
        .save(&store)
        .context("Failed to save to YAML file")?;

    info!(count, "migrated menus from SQLite to YAML");
    Ok(count)
}

/// Writes a store to a pretty-printed JSON file
pub fn export_to_json<P: AsRef<Path>>(store: &MenuStore, json_path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(store).context("Failed to serialize to JSON")?;
    std::fs::write(json_path, json).context("Failed to write JSON file")?;
    Ok(())
}

/// Reads a store from a JSON file
///
/// Item positions are renumbered, menu names must be unique and every menu
/// must form a valid tree. Dangling parents are tolerated since removing an
/// item leaves its children in that state; `menu check --repair` clears them.
pub fn import_from_json<P: AsRef<Path>>(json_path: P) -> Result<MenuStore> {
    let json = std::fs::read_to_string(json_path).context("Failed to read JSON file")?;
    let mut store: MenuStore = serde_json::from_str(&json).context("Failed to parse JSON")?;
    store.normalize();
    store.validate_unique_names()?;
    for menu in &store.menus {
        let problem = tree::problems(&menu.items)
            .into_iter()
            .find(|problem| !matches!(problem, MenuError::DanglingParent { .. }));
        if let Some(problem) = problem {
            return Err(anyhow::Error::new(problem).context(format!("menu '{}'", menu.name)));
        }
    }
    Ok(store)
}

pub fn export_backend_to_json<P: AsRef<Path>>(backend: &dyn MenuBackend, json_path: P) -> Result<()> {
    let store = backend.load()?;
    export_to_json(&store, json_path)
}

/// Replaces the backend's contents with the menus in a JSON file
///
/// Returns the number of menus imported.
pub fn import_json_to_backend<P: AsRef<Path>>(
    json_path: P,
    backend: &dyn MenuBackend,
) -> Result<usize> {
    let store = import_from_json(json_path)?;
    backend.save(&store)?;
    Ok(store.menus.len())
}
