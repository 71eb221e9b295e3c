//! Parent → children projection of a flat menu list
//!
//! The editor keeps items in one flat list (that is the shape the storefront
//! persists). For display and validation it is easier to work on explicit
//! adjacency: item content keyed by id, and an ordered child list per parent
//! where sibling order is scoped to the parent.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::MenuError;
use crate::hierarchy::{self, MAX_DEPTH};
use crate::models::MenuItem;

/// One row of the depth-first display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry {
    pub id: Uuid,
    pub depth: usize,
}

/// Adjacency view of a menu
///
/// Items whose parent is missing, or whose parent chain loops back to
/// themselves, are attached at the top level.
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    items: HashMap<Uuid, MenuItem>,
    children: HashMap<Option<Uuid>, Vec<Uuid>>,
}

impl MenuTree {
    /// Builds the projection; sibling order follows list order
    pub fn from_items(items: &[MenuItem]) -> Self {
        let cyclic: HashSet<Uuid> = hierarchy::cyclic_items(items).into_iter().collect();

        let mut content: HashMap<Uuid, MenuItem> = HashMap::with_capacity(items.len());
        let mut unique: Vec<&MenuItem> = Vec::with_capacity(items.len());
        for item in items {
            // First occurrence of a duplicated id wins
            if !content.contains_key(&item.id) {
                content.insert(item.id, item.clone());
                unique.push(item);
            }
        }

        let mut children: HashMap<Option<Uuid>, Vec<Uuid>> = HashMap::new();
        for item in unique {
            let parent = match item.parent_id {
                Some(pid) if content.contains_key(&pid) && !cyclic.contains(&item.id) => Some(pid),
                _ => None,
            };
            children.entry(parent).or_default().push(item.id);
        }

        Self {
            items: content,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&MenuItem> {
        self.items.get(id)
    }

    /// Ordered children of `parent` (`None` = top level)
    pub fn children(&self, parent: Option<&Uuid>) -> &[Uuid] {
        self.children
            .get(&parent.copied())
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[Uuid] {
        self.children(None)
    }

    /// Effective parent after dangling/cyclic references are detached
    pub fn parent_of(&self, id: &Uuid) -> Option<Uuid> {
        self.children
            .iter()
            .find(|(_, kids)| kids.contains(id))
            .and_then(|(parent, _)| *parent)
    }

    /// Depth-first display order
    pub fn flatten(&self) -> Vec<TreeEntry> {
        let mut out = Vec::with_capacity(self.items.len());
        let mut visited = HashSet::with_capacity(self.items.len());
        for root in self.roots() {
            self.walk(root, 0, &mut visited, &mut out);
        }
        out
    }

    fn walk(&self, id: &Uuid, depth: usize, visited: &mut HashSet<Uuid>, out: &mut Vec<TreeEntry>) {
        if !visited.insert(*id) {
            return;
        }
        out.push(TreeEntry { id: *id, depth });
        for child in self.children(Some(id)) {
            self.walk(child, depth + 1, visited, out);
        }
    }

    /// Flat list in display order with repaired parents and fresh `order`
    pub fn to_items(&self) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self
            .flatten()
            .into_iter()
            .filter_map(|entry| {
                let mut item = self.items.get(&entry.id)?.clone();
                item.parent_id = self.parent_of(&entry.id);
                Some(item)
            })
            .collect();
        hierarchy::renumber(&mut items);
        items
    }
}

/// Every structural problem in a flat list, in list order
pub fn problems(items: &[MenuItem]) -> Vec<MenuError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for item in items {
        if !seen.insert(item.id) {
            errors.push(MenuError::DuplicateItemId { item_id: item.id });
        }
    }

    let cyclic: HashSet<Uuid> = hierarchy::cyclic_items(items).into_iter().collect();

    for item in items {
        let Some(parent_id) = item.parent_id else {
            continue;
        };
        if parent_id == item.id {
            errors.push(MenuError::SelfParent { item_id: item.id });
        } else if hierarchy::find(items, &parent_id).is_none() {
            errors.push(MenuError::DanglingParent {
                item_id: item.id,
                parent_id,
            });
        } else if cyclic.contains(&item.id) {
            errors.push(MenuError::CircularReference {
                item_id: item.id,
                parent_id,
            });
        } else {
            let depth = hierarchy::depth_of(items, &item.id);
            if depth > MAX_DEPTH {
                errors.push(MenuError::DepthExceeded {
                    item_id: item.id,
                    depth,
                    max: MAX_DEPTH,
                });
            }
        }
    }

    errors
}

/// Checks that a flat list forms a valid menu tree
pub fn validate(items: &[MenuItem]) -> Result<(), MenuError> {
    match problems(items).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
