use anyhow::Result;
use inquire::{Confirm, Select, Text};
use std::fmt;
use uuid::Uuid;

use navmenu_core::{
    hierarchy, MenuEditor, MenuItem, MenuItemPatch, MenuLocation, MenuStyle, DEFAULT_ITEM_LABEL,
    DEFAULT_ITEM_URL, MAX_DEPTH,
};

/// One entry of the parent picker
enum ParentChoice {
    Keep,
    TopLevel,
    Item { id: Uuid, label: String, depth: usize },
}

impl fmt::Display for ParentChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentChoice::Keep => write!(f, "(keep current parent)"),
            ParentChoice::TopLevel => write!(f, "(top level)"),
            ParentChoice::Item { label, depth, .. } => {
                write!(f, "{}{}", "  ".repeat(*depth), label)
            }
        }
    }
}

/// Prompts the user for a new menu's name, location and style
pub fn prompt_new_menu() -> Result<(String, MenuLocation, MenuStyle)> {
    let name = Text::new("Menu name:").prompt()?;
    let location = Select::new("Location:", MenuLocation::all()).prompt()?;
    let style = Select::new("Style:", MenuStyle::all()).prompt()?;
    Ok((name, location, style))
}

/// Prompts the user for a new item; the parent may be any item with room
/// for one more level below it
pub fn prompt_new_item(editor: &MenuEditor) -> Result<MenuItem> {
    let label = Text::new("Label:").with_default(DEFAULT_ITEM_LABEL).prompt()?;
    let url = Text::new("URL:").with_default(DEFAULT_ITEM_URL).prompt()?;

    let mut item = MenuItem::new(label, url);

    let mut choices = vec![ParentChoice::TopLevel];
    choices.extend(
        editor
            .items()
            .iter()
            .filter(|candidate| editor.depth(&candidate.id) < MAX_DEPTH)
            .map(|candidate| ParentChoice::Item {
                id: candidate.id,
                label: candidate.label.clone(),
                depth: editor.depth(&candidate.id),
            }),
    );
    if choices.len() > 1 {
        if let ParentChoice::Item { id, .. } = Select::new("Parent:", choices).prompt()? {
            item.parent_id = Some(id);
        }
    }

    if Confirm::new("Add icon, description or image?")
        .with_default(false)
        .prompt()?
    {
        item.icon = optional_text("Icon:", None)?;
        item.description = optional_text("Description:", None)?;
        item.image = optional_text("Image URL:", None)?;
    }

    Ok(item)
}

/// Walks the user through the edit form for one item
///
/// Only fields whose value changed end up in the patch. The parent picker
/// offers just the items the editor accepts as a parent.
pub fn prompt_item_patch(editor: &MenuEditor, item_id: &Uuid) -> Result<MenuItemPatch> {
    let Some(item) = editor.get(item_id) else {
        anyhow::bail!("Item not found: {}", item_id);
    };

    let mut patch = MenuItemPatch::new();

    let label = Text::new("Label:").with_default(&item.label).prompt()?;
    if label != item.label {
        patch = patch.label(label);
    }

    let url = Text::new("URL:").with_default(&item.url).prompt()?;
    if url != item.url {
        patch = patch.url(url);
    }

    let mut choices = vec![ParentChoice::Keep];
    if item.parent_id.is_some() {
        choices.push(ParentChoice::TopLevel);
    }
    choices.extend(
        editor
            .parent_options(item_id)
            .into_iter()
            .filter(|candidate| item.parent_id != Some(candidate.id))
            .map(|candidate| ParentChoice::Item {
                id: candidate.id,
                label: candidate.label.clone(),
                depth: hierarchy::depth_of(editor.items(), &candidate.id),
            }),
    );
    if choices.len() > 1 {
        match Select::new("Parent:", choices).prompt()? {
            ParentChoice::Keep => {}
            ParentChoice::TopLevel => patch = patch.parent(None),
            ParentChoice::Item { id, .. } => patch = patch.parent(Some(id)),
        }
    }

    let icon = optional_text("Icon:", item.icon.as_deref())?;
    if icon != item.icon {
        patch = patch.icon(icon);
    }

    let description = optional_text("Description:", item.description.as_deref())?;
    if description != item.description {
        patch = patch.description(description);
    }

    let image = optional_text("Image URL:", item.image.as_deref())?;
    if image != item.image {
        patch = patch.image(image);
    }

    Ok(patch)
}

/// Free-text prompt where an empty answer means "none"
fn optional_text(message: &str, current: Option<&str>) -> Result<Option<String>> {
    let mut prompt = Text::new(message).with_help_message("leave empty for none");
    if let Some(current) = current {
        prompt = prompt.with_initial_value(current);
    }
    let value = prompt.prompt()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Asks for confirmation before a destructive action
pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}
