use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::models::{Menu, MenuItem, MenuLocation, MenuStyle};
use crate::tree::MenuTree;

/// Output formats for a single menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => anyhow::bail!("Unknown export format: {} (expected json or markdown)", other),
        }
    }
}

/// Body the admin page sends to the menu endpoint when a menu is saved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuPayload {
    pub name: String,
    pub location: MenuLocation,
    pub style: MenuStyle,
    pub active: bool,
    pub items: Vec<MenuItem>,
}

impl From<&Menu> for MenuPayload {
    fn from(menu: &Menu) -> Self {
        Self {
            name: menu.name.clone(),
            location: menu.location,
            style: menu.style,
            active: menu.active,
            items: menu.items.clone(),
        }
    }
}

/// Pretty-printed JSON payload for a menu
pub fn render_json(menu: &Menu) -> Result<String> {
    Ok(serde_json::to_string_pretty(&MenuPayload::from(menu))?)
}

/// Nested Markdown outline of a menu, in display order
pub fn render_markdown(menu: &Menu) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", menu.name));
    output.push_str(&format!(
        "**Location:** {} | **Style:** {} | **Active:** {}\n\n",
        menu.location,
        menu.style,
        if menu.active { "yes" } else { "no" }
    ));

    let tree = MenuTree::from_items(&menu.items);
    if tree.is_empty() {
        output.push_str("_No items_\n");
        return output;
    }

    for entry in tree.flatten() {
        let Some(item) = tree.get(&entry.id) else {
            continue;
        };
        let indent = "  ".repeat(entry.depth);
        output.push_str(&format!("{}- [{}]({})", indent, item.label, item.url));
        if let Some(description) = &item.description {
            output.push_str(&format!(" - {}", description));
        }
        output.push('\n');
    }

    output
}

pub fn render(menu: &Menu, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => render_json(menu),
        ExportFormat::Markdown => Ok(render_markdown(menu)),
    }
}

/// Writes a menu to `output_path` in the given format
pub fn export_menu(menu: &Menu, format: ExportFormat, output_path: &Path) -> Result<()> {
    let content = render(menu, format)?;
    fs::write(output_path, content)?;
    info!(menu = %menu.name, path = ?output_path, ?format, "exported menu");
    Ok(())
}
