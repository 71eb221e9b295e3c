//! Staged edits for a single menu item
//!
//! The edit form works on a patch rather than on the item itself: fields the
//! user touched are `Some`, everything else is left alone on commit.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::MenuItem;

/// Field-wise update for a [`MenuItem`]
///
/// Optional item fields use a nested `Option`: `Some(None)` clears the field,
/// `None` leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub parent_id: Option<Option<Uuid>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub icon: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub image: Option<Option<String>>,
}

impl MenuItemPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets (`Some`) or clears (`None`) the parent
    pub fn parent(mut self, parent_id: Option<Uuid>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The parent this patch would assign, if it touches the parent at all
    pub fn new_parent(&self) -> Option<Option<Uuid>> {
        self.parent_id
    }

    /// Merges the touched fields into `item`
    pub fn apply_to(&self, item: &mut MenuItem) {
        if let Some(label) = &self.label {
            item.label = label.clone();
        }
        if let Some(url) = &self.url {
            item.url = url.clone();
        }
        if let Some(parent_id) = self.parent_id {
            item.parent_id = parent_id;
        }
        if let Some(icon) = &self.icon {
            item.icon = normalize(icon);
        }
        if let Some(description) = &self.description {
            item.description = normalize(description);
        }
        if let Some(image) = &self.image {
            item.image = normalize(image);
        }
    }
}

// A key that is present maps to `Some`, so an explicit `null` reads back as
// "clear" instead of "untouched"
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// Empty form inputs clear the field
fn normalize(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The edit currently staged in the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub item_id: Uuid,
    pub patch: MenuItemPatch,
}

impl ItemDraft {
    pub fn new(item_id: Uuid) -> Self {
        Self {
            item_id,
            patch: MenuItemPatch::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touched_fields() {
        let mut item = MenuItem::new("Home", "/");
        item.icon = Some("house".into());

        MenuItemPatch::new().label("Start").apply_to(&mut item);

        assert_eq!(item.label, "Start");
        assert_eq!(item.url, "/");
        assert_eq!(item.icon.as_deref(), Some("house"));
    }

    #[test]
    fn test_clear_optional_fields() {
        let parent = Uuid::new_v4();
        let mut item = MenuItem::new("Shoes", "/shoes").with_parent(parent);
        item.description = Some("All shoes".into());

        MenuItemPatch::new()
            .parent(None)
            .description(Some("   ".into()))
            .image(Some("/img/shoes.png".into()))
            .apply_to(&mut item);

        assert!(item.parent_id.is_none());
        assert!(item.description.is_none());
        assert_eq!(item.image.as_deref(), Some("/img/shoes.png"));
    }

    #[test]
    fn test_is_empty() {
        assert!(MenuItemPatch::new().is_empty());
        assert!(!MenuItemPatch::new().url("/x").is_empty());
        assert!(!MenuItemPatch::new().parent(None).is_empty());
    }

    #[test]
    fn test_patch_json_omits_untouched() {
        let json = serde_json::to_string(&MenuItemPatch::new().label("Sale")).unwrap();
        assert_eq!(json, r#"{"label":"Sale"}"#);
    }

    #[test]
    fn test_patch_json_keeps_clears() {
        let patch = MenuItemPatch::new()
            .parent(None)
            .icon(None)
            .description(Some("Summer".into()));
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"parentId":null,"icon":null,"description":"Summer"}"#);

        let back: MenuItemPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
        assert_eq!(back.parent_id, Some(None));
        assert_eq!(back.image, None);

        let untouched: MenuItemPatch = serde_json::from_str("{}").unwrap();
        assert!(untouched.is_empty());
    }
}
