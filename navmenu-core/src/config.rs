use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the menu document
pub const MENU_FILE_ENV: &str = "NAVMENU_FILE";

/// Document name looked up in the working directory
pub const LOCAL_MENU_FILE: &str = "menus.yaml";

/// Determines the menu document to use
///
/// Priority: explicit `--file` flag, then `NAVMENU_FILE`, then `menus.yaml`
/// in the working directory if it exists, then the per-user data directory.
pub fn determine_menu_path(file_option: Option<&Path>) -> Result<PathBuf> {
    let env_file = env::var(MENU_FILE_ENV).ok().filter(|v| !v.trim().is_empty());
    let cwd = env::current_dir().context("Failed to determine current directory")?;
    resolve_menu_path(file_option, env_file.as_deref(), &cwd, dirs::data_dir())
}

fn resolve_menu_path(
    file_option: Option<&Path>,
    env_file: Option<&str>,
    cwd: &Path,
    data_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = file_option {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env_file {
        return Ok(PathBuf::from(path));
    }

    let local = cwd.join(LOCAL_MENU_FILE);
    if local.exists() {
        return Ok(local);
    }

    let data_dir = data_dir.context("Failed to determine user data directory")?;
    Ok(data_dir.join("navmenu").join(LOCAL_MENU_FILE))
}
