use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MenuError;
use crate::hierarchy;

/// Label given to items created with the "add" button
pub const DEFAULT_ITEM_LABEL: &str = "New Item";

/// Url given to items created with the "add" button
pub const DEFAULT_ITEM_URL: &str = "/";

/// Where on the storefront a menu is rendered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MenuLocation {
    Header,
    Footer,
    Sidebar,
    Mobile,
}

impl fmt::Display for MenuLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuLocation::Header => write!(f, "header"),
            MenuLocation::Footer => write!(f, "footer"),
            MenuLocation::Sidebar => write!(f, "sidebar"),
            MenuLocation::Mobile => write!(f, "mobile"),
        }
    }
}

impl FromStr for MenuLocation {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "header" => Ok(MenuLocation::Header),
            "footer" => Ok(MenuLocation::Footer),
            "sidebar" => Ok(MenuLocation::Sidebar),
            "mobile" => Ok(MenuLocation::Mobile),
            _ => Err(MenuError::InvalidLocation(s.to_string())),
        }
    }
}

impl MenuLocation {
    pub fn all() -> Vec<MenuLocation> {
        vec![
            MenuLocation::Header,
            MenuLocation::Footer,
            MenuLocation::Sidebar,
            MenuLocation::Mobile,
        ]
    }
}

/// How the storefront renders nested items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MenuStyle {
    /// Flat list, nested items shown inline
    #[default]
    Simple,
    /// Children open in a dropdown under their parent
    Dropdown,
    /// Full-width panel with grouped columns
    Mega,
}

impl fmt::Display for MenuStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuStyle::Simple => write!(f, "simple"),
            MenuStyle::Dropdown => write!(f, "dropdown"),
            MenuStyle::Mega => write!(f, "mega"),
        }
    }
}

impl FromStr for MenuStyle {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(MenuStyle::Simple),
            "dropdown" => Ok(MenuStyle::Dropdown),
            "mega" => Ok(MenuStyle::Mega),
            _ => Err(MenuError::InvalidStyle(s.to_string())),
        }
    }
}

impl MenuStyle {
    pub fn all() -> Vec<MenuStyle> {
        vec![MenuStyle::Simple, MenuStyle::Dropdown, MenuStyle::Mega]
    }
}

/// A single navigable entry in a menu
///
/// The list of items is flat: nesting is expressed through `parent_id`, and
/// display order is the position in the list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Unique identifier, generated on creation
    pub id: Uuid,

    /// Display text
    pub label: String,

    /// Destination path or href
    pub url: String,

    /// Position in the list, kept equal to the index after every mutation
    #[serde(default)]
    pub order: u32,

    /// Parent item; `None` means top level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MenuItem {
    /// Creates a top-level item with a fresh id
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            url: url.into(),
            order: 0,
            parent_id: None,
            icon: None,
            description: None,
            image: None,
        }
    }

    /// Creates the default item appended by the editor's add action
    pub fn placeholder(order: u32) -> Self {
        let mut item = Self::new(DEFAULT_ITEM_LABEL, DEFAULT_ITEM_URL);
        item.order = order;
        item
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// A named navigation menu and its items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: Uuid,

    /// Unique, human-facing name (e.g. "Main navigation")
    pub name: String,

    pub location: MenuLocation,

    #[serde(default)]
    pub style: MenuStyle,

    /// Inactive menus are kept but not rendered on the storefront
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub items: Vec<MenuItem>,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Menu {
    /// Creates an empty, active menu
    pub fn new(name: impl Into<String>, location: MenuLocation) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            style: MenuStyle::default(),
            active: true,
            items: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.id == *id)
    }

    /// Replaces the item list with the one produced by an editor session
    pub fn replace_items(&mut self, items: Vec<MenuItem>) {
        self.items = items;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

/// Collection of all menus for the storefront
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MenuStore {
    #[serde(default)]
    pub menus: Vec<Menu>,
}

impl MenuStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self { menus: Vec::new() }
    }

    /// Adds a menu, refusing duplicate names
    pub fn add_menu(&mut self, menu: Menu) -> Result<(), MenuError> {
        if self.get_menu_by_name(&menu.name).is_some() {
            return Err(MenuError::DuplicateMenuName { name: menu.name });
        }
        self.menus.push(menu);
        Ok(())
    }

    /// Gets a menu by ID
    pub fn get_menu_by_id(&self, id: &Uuid) -> Option<&Menu> {
        self.menus.iter().find(|m| m.id == *id)
    }

    /// Gets a mutable reference to a menu by ID
    pub fn get_menu_by_id_mut(&mut self, id: &Uuid) -> Option<&mut Menu> {
        self.menus.iter_mut().find(|m| m.id == *id)
    }

    /// Gets a menu by name (case-insensitive)
    pub fn get_menu_by_name(&self, name: &str) -> Option<&Menu> {
        self.menus
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Resolves a menu reference: UUID first, then name
    pub fn find_menu(&self, reference: &str) -> Result<&Menu, MenuError> {
        if let Ok(id) = Uuid::parse_str(reference) {
            if let Some(menu) = self.get_menu_by_id(&id) {
                return Ok(menu);
            }
        }
        self.get_menu_by_name(reference)
            .ok_or_else(|| MenuError::menu_not_found(reference))
    }

    /// Removes a menu by ID, returning it if present
    pub fn remove_menu(&mut self, id: &Uuid) -> Option<Menu> {
        let pos = self.menus.iter().position(|m| m.id == *id)?;
        Some(self.menus.remove(pos))
    }

    /// Menus rendered at the given location that are switched on
    pub fn active_menus_at(&self, location: MenuLocation) -> Vec<&Menu> {
        self.menus
            .iter()
            .filter(|m| m.active && m.location == location)
            .collect()
    }

    /// Validates that all menu names are unique
    pub fn validate_unique_names(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();

        for menu in &self.menus {
            if !seen.insert(menu.name.to_lowercase()) {
                anyhow::bail!("Duplicate menu name found: {}", menu.name);
            }
        }

        Ok(())
    }

    /// Renumbers item `order` in every menu to match list position
    ///
    /// Returns true if any value changed (documents written by hand or by an
    /// older tool may carry stale positions).
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        for menu in &mut self.menus {
            let stale = menu
                .items
                .iter()
                .enumerate()
                .any(|(i, item)| item.order as usize != i);
            if stale {
                hierarchy::renumber(&mut menu.items);
                changed = true;
            }
        }
        changed
    }
}
