//! SQLite database storage backend
//!
//! Menus and their items live in two tables. Items keep their flat list
//! position in a `position` column so the editor's order survives a round
//! trip.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::traits::{BackendType, MenuBackend, StoreUpdate};
use crate::models::{Menu, MenuItem, MenuLocation, MenuStore, MenuStyle};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const MENU_COLUMNS: &str = "id, name, location, style, active, created_at, modified_at";

/// Raw `menus` row before string columns are parsed
struct MenuRow {
    id: String,
    name: String,
    location: String,
    style: String,
    active: bool,
    created_at: String,
    modified_at: String,
}

impl MenuRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            location: row.get(2)?,
            style: row.get(3)?,
            active: row.get(4)?,
            created_at: row.get(5)?,
            modified_at: row.get(6)?,
        })
    }

    fn into_menu(self, items: Vec<MenuItem>) -> Result<Menu> {
        Ok(Menu {
            id: Uuid::parse_str(&self.id)
                .with_context(|| format!("Invalid menu id in database: {}", self.id))?,
            name: self.name,
            location: self.location.parse::<MenuLocation>()?,
            style: self.style.parse::<MenuStyle>()?,
            active: self.active,
            items,
            created_at: parse_timestamp(&self.created_at)?,
            modified_at: parse_timestamp(&self.modified_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp in database: {}", value))
}

/// SQLite backend implementation
pub struct SqliteBackend {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Opens (or creates) the database and its schema
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open SQLite database: {:?}", path))?;

        // WAL lets a second admin session read while another writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let backend = Self {
            path,
            conn: Mutex::new(conn),
        };

        backend.init_schema()?;
        Ok(backend)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("SQLite connection lock poisoned"))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        let has_version_table = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
                [],
                |_| Ok(()),
            )
            .optional()
            .context("Failed to inspect database schema")?
            .is_some();

        let current_version: i32 = if has_version_table {
            conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .context("Failed to read schema version")?
            .unwrap_or(0)
        } else {
            0
        };

        if current_version == 0 {
            debug!(path = ?self.path, "creating menu schema");
            conn.execute_batch(include_str!("schema.sql"))?;
        } else if current_version < SCHEMA_VERSION {
            anyhow::bail!(
                "Database schema version {} is outdated, expected {}",
                current_version,
                SCHEMA_VERSION
            );
        }

        Ok(())
    }

    fn load_items(conn: &Connection, menu_id: &str) -> Result<Vec<MenuItem>> {
        let mut stmt = conn.prepare(
            "SELECT id, parent_id, label, url, icon, description, image, position
             FROM menu_items WHERE menu_id = ?1 ORDER BY position",
        )?;

        let rows = stmt.query_map([menu_id], |row| {
            let id: String = row.get(0)?;
            let parent_id: Option<String> = row.get(1)?;
            Ok((
                id,
                parent_id,
                MenuItem {
                    id: Uuid::nil(),
                    label: row.get(2)?,
                    url: row.get(3)?,
                    order: row.get(7)?,
                    parent_id: None,
                    icon: row.get(4)?,
                    description: row.get(5)?,
                    image: row.get(6)?,
                },
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, parent_id, mut item) = row?;
            item.id = Uuid::parse_str(&id)
                .with_context(|| format!("Invalid item id in database: {}", id))?;
            item.parent_id = match parent_id {
                Some(pid) => Some(
                    Uuid::parse_str(&pid)
                        .with_context(|| format!("Invalid parent id in database: {}", pid))?,
                ),
                None => None,
            };
            items.push(item);
        }
        Ok(items)
    }

    fn load_menus(conn: &Connection, filter: &str, param: Option<&str>) -> Result<Vec<Menu>> {
        let sql = format!("SELECT {} FROM menus {} ORDER BY rowid", MENU_COLUMNS, filter);
        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<MenuRow> = match param {
            Some(p) => stmt
                .query_map([p], MenuRow::from_row)?
                .collect::<rusqlite::Result<_>>()?,
            None => stmt
                .query_map([], MenuRow::from_row)?
                .collect::<rusqlite::Result<_>>()?,
        };

        rows.into_iter()
            .map(|row| {
                let items = Self::load_items(conn, &row.id)?;
                row.into_menu(items)
            })
            .collect()
    }

    fn save_menu(tx: &Transaction<'_>, menu: &Menu) -> Result<()> {
        tx.execute(
            "INSERT INTO menus (id, name, location, style, active, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                location = excluded.location,
                style = excluded.style,
                active = excluded.active,
                modified_at = excluded.modified_at",
            params![
                menu.id.to_string(),
                menu.name,
                menu.location.to_string(),
                menu.style.to_string(),
                menu.active,
                menu.created_at.to_rfc3339(),
                menu.modified_at.to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM menu_items WHERE menu_id = ?1",
            [menu.id.to_string()],
        )?;

        for (position, item) in menu.items.iter().enumerate() {
            tx.execute(
                "INSERT INTO menu_items
                    (id, menu_id, position, parent_id, label, url, icon, description, image)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    item.id.to_string(),
                    menu.id.to_string(),
                    position as i64,
                    item.parent_id.map(|p| p.to_string()),
                    item.label,
                    item.url,
                    item.icon,
                    item.description,
                    item.image,
                ],
            )
            .with_context(|| format!("Failed to store item {} of menu '{}'", item.id, menu.name))?;
        }
        Ok(())
    }

    fn write_store(tx: &Transaction<'_>, store: &MenuStore) -> Result<()> {
        tx.execute("DELETE FROM menu_items", [])?;
        tx.execute("DELETE FROM menus", [])?;
        for menu in &store.menus {
            Self::save_menu(tx, menu)?;
        }
        Ok(())
    }
}

impl MenuBackend for SqliteBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Sqlite
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<MenuStore> {
        let conn = self.conn()?;
        let mut store = MenuStore {
            menus: Self::load_menus(&conn, "", None)?,
        };
        store.normalize();
        Ok(store)
    }

    fn save(&self, store: &MenuStore) -> Result<()> {
        store.validate_unique_names()?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        Self::write_store(&tx, store)?;
        tx.commit()?;
        debug!(path = ?self.path, menus = store.menus.len(), "saved menu store");
        Ok(())
    }

    fn update_atomically(&self, update_fn: StoreUpdate<'_>) -> Result<MenuStore> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock before the read
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut store = MenuStore {
            menus: Self::load_menus(&tx, "", None)?,
        };
        update_fn(&mut store)?;
        store.normalize();
        store.validate_unique_names()?;
        Self::write_store(&tx, &store)?;
        tx.commit()?;
        debug!(path = ?self.path, menus = store.menus.len(), "updated menu store");
        Ok(store)
    }

    fn get_menu(&self, id: &Uuid) -> Result<Option<Menu>> {
        let conn = self.conn()?;
        let id = id.to_string();
        Ok(Self::load_menus(&conn, "WHERE id = ?1", Some(&id))?
            .into_iter()
            .next())
    }

    fn get_menu_by_name(&self, name: &str) -> Result<Option<Menu>> {
        let conn = self.conn()?;
        Ok(Self::load_menus(&conn, "WHERE name = ?1", Some(name))?
            .into_iter()
            .next())
    }

    fn update_menu(&self, menu: &Menu) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM menus WHERE id = ?1",
                [menu.id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            anyhow::bail!("Menu not found: {}", menu.id)
        }

        Self::save_menu(&tx, menu)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_menu(&self, id: &Uuid) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM menu_items WHERE menu_id = ?1", [id.to_string()])?;
        let rows_affected = tx.execute("DELETE FROM menus WHERE id = ?1", [id.to_string()])?;
        if rows_affected == 0 {
            anyhow::bail!("Menu not found: {}", id)
        }
        tx.commit()?;
        Ok(())
    }
}
