//! Storage backends for menus
//!
//! Menus can be kept in a single YAML file or in a SQLite database. Both
//! implement [`MenuBackend`]; the backend is picked from the file extension
//! unless one is requested explicitly.

mod migration;
mod sqlite_backend;
mod traits;
mod yaml_backend;

pub use migration::{
    export_backend_to_json, export_to_json, import_from_json, import_json_to_backend,
    migrate_sqlite_to_yaml, migrate_yaml_to_sqlite,
};
pub use sqlite_backend::SqliteBackend;
pub use traits::{BackendStats, BackendType, MenuBackend, StoreUpdate};
pub use yaml_backend::YamlBackend;

use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Creates a backend based on the file extension or explicit type
pub fn create_backend(path: &Path, backend_type: Option<BackendType>) -> Result<Box<dyn MenuBackend>> {
    let bt = backend_type.unwrap_or_else(|| BackendType::from_path(path));
    debug!(path = ?path, backend = %bt, "opening menu store");

    match bt {
        BackendType::Yaml => Ok(Box::new(YamlBackend::new(path))),
        BackendType::Sqlite => Ok(Box::new(SqliteBackend::new(path)?)),
    }
}

/// Opens a backend, creating an empty store if the file is missing
pub fn open_or_create(path: &Path, backend_type: Option<BackendType>) -> Result<Box<dyn MenuBackend>> {
    let backend = create_backend(path, backend_type)?;
    backend.create_if_not_exists()?;
    Ok(backend)
}
