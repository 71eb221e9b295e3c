//! Depth and ancestry queries over a flat, parent-referencing item list
//!
//! Menu items are stored as one ordered `Vec<MenuItem>` where nesting is
//! expressed by `parent_id`. Every walk in this module is bounded by the list
//! length so that a corrupted list (dangling or cyclic parent references)
//! can never hang the editor.

use std::collections::HashSet;
use uuid::Uuid;

use crate::models::MenuItem;

/// Deepest allowed level; top-level items are at depth 0
pub const MAX_DEPTH: usize = 2;

/// Finds an item by id
pub fn find<'a>(items: &'a [MenuItem], id: &Uuid) -> Option<&'a MenuItem> {
    items.iter().find(|i| i.id == *id)
}

/// Index of an item in the list
pub fn position(items: &[MenuItem], id: &Uuid) -> Option<usize> {
    items.iter().position(|i| i.id == *id)
}

/// Number of ancestor hops from `id` to a top-level item
///
/// A parent reference that cannot be resolved ends the walk: the item is
/// counted as sitting under an effective root. The walk takes at most
/// `items.len()` steps, so a reference cycle yields a finite (meaningless)
/// depth instead of looping forever.
pub fn depth_of(items: &[MenuItem], id: &Uuid) -> usize {
    let mut depth = 0;
    let mut current = find(items, id);

    for _ in 0..items.len() {
        let Some(item) = current else { break };
        let Some(parent_id) = item.parent_id else { break };

        match find(items, &parent_id) {
            Some(parent) => {
                depth += 1;
                current = Some(parent);
            }
            None => break,
        }
    }

    depth
}

/// Parent chain of `id`, nearest parent first
///
/// Stops at a top-level item, a missing parent, or the first repeated id.
pub fn ancestors(items: &[MenuItem], id: &Uuid) -> Vec<Uuid> {
    let mut chain: Vec<Uuid> = Vec::new();
    let mut current = find(items, id);

    while let Some(item) = current {
        let Some(parent_id) = item.parent_id else { break };
        if parent_id == *id || chain.contains(&parent_id) {
            break;
        }
        match find(items, &parent_id) {
            Some(parent) => {
                chain.push(parent_id);
                current = Some(parent);
            }
            None => break,
        }
    }

    chain
}

/// True if `candidate` sits somewhere below `ancestor`
pub fn is_descendant(items: &[MenuItem], ancestor: &Uuid, candidate: &Uuid) -> bool {
    ancestors(items, candidate).contains(ancestor)
}

/// True if making `proposed_parent` the parent of `item_id` breaks the tree
pub fn would_create_cycle(items: &[MenuItem], item_id: &Uuid, proposed_parent: &Uuid) -> bool {
    item_id == proposed_parent || is_descendant(items, item_id, proposed_parent)
}

/// Direct children of `parent` in list order (`None` = top level)
pub fn children_of<'a>(items: &'a [MenuItem], parent: Option<&Uuid>) -> Vec<&'a MenuItem> {
    items
        .iter()
        .filter(|i| i.parent_id.as_ref() == parent)
        .collect()
}

/// All items below `id`, breadth first
pub fn descendants(items: &[MenuItem], id: &Uuid) -> Vec<Uuid> {
    let mut seen: HashSet<Uuid> = HashSet::from([*id]);
    let mut result = Vec::new();
    let mut frontier = vec![*id];

    while let Some(current) = frontier.pop() {
        for child in items.iter().filter(|i| i.parent_id == Some(current)) {
            if seen.insert(child.id) {
                result.push(child.id);
                frontier.insert(0, child.id);
            }
        }
    }

    result
}

/// Number of levels below `id` (0 for a leaf)
pub fn subtree_height(items: &[MenuItem], id: &Uuid) -> usize {
    let mut visited: HashSet<Uuid> = HashSet::from([*id]);
    height_below(items, id, &mut visited)
}

fn height_below(items: &[MenuItem], id: &Uuid, visited: &mut HashSet<Uuid>) -> usize {
    let mut height = 0;
    for child in items.iter().filter(|i| i.parent_id == Some(*id)) {
        if !visited.insert(child.id) {
            continue;
        }
        height = height.max(1 + height_below(items, &child.id, visited));
    }
    height
}

/// True if `item_id` placed under `parent` keeps its whole subtree within
/// [`MAX_DEPTH`]. `None` means top level.
pub fn fits_under(items: &[MenuItem], item_id: &Uuid, parent: Option<&Uuid>) -> bool {
    let new_depth = match parent {
        Some(parent_id) => depth_of(items, parent_id) + 1,
        None => 0,
    };
    new_depth + subtree_height(items, item_id) <= MAX_DEPTH
}

/// Resets `order` to match list position
pub fn renumber(items: &mut [MenuItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.order = index as u32;
    }
}

/// Ids of items whose parent is not in the list
pub fn dangling_parents(items: &[MenuItem]) -> Vec<Uuid> {
    items
        .iter()
        .filter(|i| matches!(i.parent_id, Some(pid) if find(items, &pid).is_none()))
        .map(|i| i.id)
        .collect()
}

/// Ids of items whose parent chain loops back on itself
pub fn cyclic_items(items: &[MenuItem]) -> Vec<Uuid> {
    items
        .iter()
        .filter(|i| match i.parent_id {
            Some(pid) => pid == i.id || is_descendant(items, &i.id, &pid),
            None => false,
        })
        .map(|i| i.id)
        .collect()
}
