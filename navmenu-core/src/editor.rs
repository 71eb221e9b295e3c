//! Menu hierarchy editor
//!
//! `MenuEditor` owns a working copy of a menu's flat item list and exposes the
//! structural operations of the admin menu screen: add, remove, move, drag
//! reorder, indent and outdent, plus a single-item edit form.
//!
//! Every mutation renumbers `order` before the change listener runs, so the
//! host never observes duplicate or non-contiguous positions. Operations that
//! are not allowed in the current state are refused: they return `false`,
//! leave the list untouched and do not notify.

use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::draft::{ItemDraft, MenuItemPatch};
use crate::error::MenuError;
use crate::hierarchy::{self, MAX_DEPTH};
use crate::models::MenuItem;
use crate::tree::MenuTree;

/// Direction for a one-step move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward index 0
    Up,
    /// Toward the end of the list
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Callback receiving the full list after every committed change
pub type ChangeListener = Box<dyn FnMut(&[MenuItem])>;

/// In-memory editor over a flat menu item list
#[derive(Default)]
pub struct MenuEditor {
    items: Vec<MenuItem>,
    listener: Option<ChangeListener>,
    /// Index currently being dragged, if a drag is in progress
    dragging: Option<usize>,
    draft: Option<ItemDraft>,
}

impl fmt::Debug for MenuEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuEditor")
            .field("items", &self.items)
            .field("has_listener", &self.listener.is_some())
            .field("dragging", &self.dragging)
            .field("draft", &self.draft)
            .finish()
    }
}

impl MenuEditor {
    /// Creates an editor over a copy of `items`
    pub fn new(items: Vec<MenuItem>) -> Self {
        let mut editor = Self::default();
        editor.sync(items);
        editor
    }

    /// Registers the change listener, replacing any previous one
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&[MenuItem]) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Replaces the working copy when the host re-supplies its input
    ///
    /// Drag and draft state refer to the old list and are dropped. The host
    /// already has this list, so the listener is not called.
    pub fn sync(&mut self, items: Vec<MenuItem>) {
        self.items = items;
        hierarchy::renumber(&mut self.items);
        self.dragging = None;
        self.draft = None;
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<MenuItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&MenuItem> {
        hierarchy::find(&self.items, id)
    }

    pub fn index_of(&self, id: &Uuid) -> Option<usize> {
        hierarchy::position(&self.items, id)
    }

    /// Nesting depth of an item (see [`hierarchy::depth_of`])
    pub fn depth(&self, id: &Uuid) -> usize {
        hierarchy::depth_of(&self.items, id)
    }

    /// Adjacency view of the current list
    pub fn tree(&self) -> MenuTree {
        MenuTree::from_items(&self.items)
    }

    fn commit(&mut self) {
        hierarchy::renumber(&mut self.items);
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.items);
        }
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Appends a default top-level item and returns its id
    pub fn add(&mut self) -> Uuid {
        let item = MenuItem::placeholder(self.items.len() as u32);
        let id = item.id;
        self.items.push(item);
        debug!(item_id = %id, "added menu item");
        self.commit();
        id
    }

    /// Appends a pre-built item
    ///
    /// A parent that is not in the list, or that would put the item past
    /// [`MAX_DEPTH`], is dropped and the item lands at the top level.
    pub fn add_item(&mut self, mut item: MenuItem) -> Uuid {
        if let Some(parent_id) = item.parent_id {
            let parent_ok = hierarchy::find(&self.items, &parent_id).is_some()
                && hierarchy::depth_of(&self.items, &parent_id) < MAX_DEPTH;
            if !parent_ok {
                debug!(item_id = %item.id, parent_id = %parent_id, "dropping unusable parent on add");
                item.parent_id = None;
            }
        }
        let id = item.id;
        self.items.push(item);
        debug!(item_id = %id, "added menu item");
        self.commit();
        id
    }

    /// Removes an item
    ///
    /// Children are left in place with a parent reference that no longer
    /// resolves; depth and display treat them as top level.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != *id);
        if self.items.len() == before {
            debug!(item_id = %id, "remove refused: item not found");
            return false;
        }
        if self.draft.as_ref().is_some_and(|d| d.item_id == *id) {
            self.draft = None;
        }
        self.dragging = None;
        debug!(item_id = %id, "removed menu item");
        self.commit();
        true
    }

    /// True if the item at `index` can move one step in `direction`
    pub fn can_move(&self, index: usize, direction: Direction) -> bool {
        match direction {
            Direction::Up => index > 0 && index < self.items.len(),
            Direction::Down => index + 1 < self.items.len(),
        }
    }

    /// Swaps an item with its neighbour in the flat list
    ///
    /// Parent references are not touched: a child moved past its siblings
    /// keeps its parent even if it now sits among another parent's children.
    pub fn move_item(&mut self, id: &Uuid, direction: Direction) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !self.can_move(index, direction) {
            debug!(item_id = %id, %direction, "move refused at boundary");
            return false;
        }
        let target = match direction {
            Direction::Up => index - 1,
            Direction::Down => index + 1,
        };
        self.items.swap(index, target);
        debug!(item_id = %id, from = index, to = target, "moved menu item");
        self.commit();
        true
    }

    /// True if the item at `index` can be nested under the item above it
    pub fn can_indent(&self, index: usize) -> bool {
        if index == 0 || index >= self.items.len() {
            return false;
        }
        let item = &self.items[index];
        let above = &self.items[index - 1];

        if item.parent_id == Some(above.id) {
            return false;
        }
        if hierarchy::depth_of(&self.items, &above.id) >= MAX_DEPTH {
            return false;
        }
        if hierarchy::would_create_cycle(&self.items, &item.id, &above.id) {
            return false;
        }
        hierarchy::fits_under(&self.items, &item.id, Some(&above.id))
    }

    /// Makes the item at `index` a child of the item directly above it
    pub fn indent(&mut self, index: usize) -> bool {
        if !self.can_indent(index) {
            debug!(index, "indent refused");
            return false;
        }
        let parent_id = self.items[index - 1].id;
        self.items[index].parent_id = Some(parent_id);
        debug!(item_id = %self.items[index].id, parent_id = %parent_id, "indented menu item");
        self.commit();
        true
    }

    /// True if the item at `index` has a parent to step out of
    pub fn can_outdent(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|item| item.parent_id.is_some())
    }

    /// Moves the item at `index` one level up: its parent becomes its
    /// grandparent, or it becomes top level if there is none
    pub fn outdent(&mut self, index: usize) -> bool {
        if !self.can_outdent(index) {
            debug!(index, "outdent refused");
            return false;
        }
        let new_parent = self.items[index]
            .parent_id
            .and_then(|pid| hierarchy::find(&self.items, &pid))
            .and_then(|parent| parent.parent_id);
        self.items[index].parent_id = new_parent;
        debug!(item_id = %self.items[index].id, "outdented menu item");
        self.commit();
        true
    }

    // =========================================================================
    // Drag reorder
    // =========================================================================

    /// Starts dragging the item at `index`
    pub fn begin_drag(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.dragging = Some(index);
        true
    }

    /// Index of the item being dragged
    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Pointer crossed onto `index`: splice the dragged item there
    ///
    /// Only the local list changes; the host hears about the new order when
    /// the drag ends.
    pub fn drag_over(&mut self, index: usize) -> bool {
        let Some(from) = self.dragging else {
            return false;
        };
        if index >= self.items.len() || index == from {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(index, item);
        hierarchy::renumber(&mut self.items);
        self.dragging = Some(index);
        true
    }

    /// Finishes the drag and publishes the resulting order
    pub fn end_drag(&mut self) -> bool {
        if self.dragging.take().is_none() {
            return false;
        }
        debug!("drag reorder finished");
        self.commit();
        true
    }

    /// Moves an item straight to `to` as one complete drag gesture
    pub fn reorder(&mut self, id: &Uuid, to: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        if to >= self.items.len() || to == from {
            return false;
        }
        self.begin_drag(from);
        let step: isize = if to > from { 1 } else { -1 };
        let mut at = from as isize;
        while at != to as isize {
            at += step;
            self.drag_over(at as usize);
        }
        self.end_drag()
    }

    // =========================================================================
    // Edit form
    // =========================================================================

    /// Stages an empty draft for `id`, replacing any open draft
    pub fn begin_edit(&mut self, id: &Uuid) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.draft = Some(ItemDraft::new(*id));
        true
    }

    pub fn draft(&self) -> Option<&ItemDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut MenuItemPatch> {
        self.draft.as_mut().map(|d| &mut d.patch)
    }

    /// Drops the staged draft without touching the list
    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Items that may be chosen as the parent of `id` in the form
    ///
    /// Excludes the item itself, its descendants, and items that would push
    /// the item's subtree past [`MAX_DEPTH`].
    pub fn parent_options(&self, id: &Uuid) -> Vec<&MenuItem> {
        let below: HashSet<Uuid> = hierarchy::descendants(&self.items, id).into_iter().collect();
        self.items
            .iter()
            .filter(|candidate| {
                candidate.id != *id
                    && !below.contains(&candidate.id)
                    && hierarchy::fits_under(&self.items, id, Some(&candidate.id))
            })
            .collect()
    }

    /// Merges the staged draft into its item
    ///
    /// Returns `Ok(false)` when nothing is staged. A parent choice that would
    /// create a cycle or exceed the depth cap is rejected and the draft stays
    /// open for correction.
    pub fn commit_edit(&mut self) -> Result<bool, MenuError> {
        let Some(draft) = self.draft.clone() else {
            return Ok(false);
        };
        self.update_item(&draft.item_id, &draft.patch)?;
        self.draft = None;
        Ok(true)
    }

    /// Applies a patch to an item directly
    pub fn update_item(&mut self, id: &Uuid, patch: &MenuItemPatch) -> Result<(), MenuError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| MenuError::item_not_found(*id))?;

        if let Some(Some(parent_id)) = patch.new_parent() {
            self.check_parent(id, &parent_id)?;
        }

        patch.apply_to(&mut self.items[index]);
        debug!(item_id = %id, "updated menu item");
        self.commit();
        Ok(())
    }

    fn check_parent(&self, id: &Uuid, parent_id: &Uuid) -> Result<(), MenuError> {
        if id == parent_id {
            return Err(MenuError::SelfParent { item_id: *id });
        }
        if self.get(parent_id).is_none() {
            return Err(MenuError::DanglingParent {
                item_id: *id,
                parent_id: *parent_id,
            });
        }
        if hierarchy::would_create_cycle(&self.items, id, parent_id) {
            return Err(MenuError::CircularReference {
                item_id: *id,
                parent_id: *parent_id,
            });
        }
        if !hierarchy::fits_under(&self.items, id, Some(parent_id)) {
            let depth = hierarchy::depth_of(&self.items, parent_id)
                + 1
                + hierarchy::subtree_height(&self.items, id);
            return Err(MenuError::DepthExceeded {
                item_id: *id,
                depth,
                max: MAX_DEPTH,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor_with(labels: &[&str]) -> MenuEditor {
        let items = labels
            .iter()
            .map(|l| MenuItem::new(*l, format!("/{}", l.to_lowercase())))
            .collect();
        MenuEditor::new(items)
    }

    fn record(editor: &mut MenuEditor) -> Rc<RefCell<Vec<Vec<MenuItem>>>> {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        editor.on_change(move |items| sink.borrow_mut().push(items.to_vec()));
        calls
    }

    fn assert_contiguous(items: &[MenuItem]) {
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.order as usize, i, "order mismatch at {}", i);
        }
    }

    fn labels(editor: &MenuEditor) -> Vec<String> {
        editor.items().iter().map(|i| i.label.clone()).collect()
    }

    #[test]
    fn test_new_renumbers_input() {
        let mut a = MenuItem::new("A", "/a");
        a.order = 7;
        let editor = MenuEditor::new(vec![a, MenuItem::new("B", "/b")]);
        assert_contiguous(editor.items());
    }

    #[test]
    fn test_add_appends_default_item() {
        let mut editor = editor_with(&["A"]);
        let calls = record(&mut editor);

        let id = editor.add();

        let item = editor.get(&id).unwrap();
        assert_eq!(item.label, "New Item");
        assert_eq!(item.url, "/");
        assert_eq!(item.order, 1);
        assert!(item.parent_id.is_none());
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(calls.borrow()[0].len(), 2);
    }

    #[test]
    fn test_add_item_drops_unusable_parent() {
        let mut editor = editor_with(&["A"]);
        let orphan = MenuItem::new("X", "/x").with_parent(Uuid::new_v4());
        let id = editor.add_item(orphan);
        assert!(editor.get(&id).unwrap().parent_id.is_none());

        let a = editor.items()[0].id;
        let child = MenuItem::new("Y", "/y").with_parent(a);
        let id = editor.add_item(child);
        assert_eq!(editor.get(&id).unwrap().parent_id, Some(a));
    }

    /// One user action on the editor; indices wrap around the current length
    #[derive(Debug, Clone)]
    enum Action {
        Add,
        Remove(usize),
        Move(usize, bool),
        Indent(usize),
        Outdent(usize),
        Drag(usize, usize),
        Reorder(usize, usize),
        SetParent(usize, Option<usize>),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Add),
            any::<usize>().prop_map(Action::Remove),
            (any::<usize>(), any::<bool>()).prop_map(|(i, up)| Action::Move(i, up)),
            any::<usize>().prop_map(Action::Indent),
            any::<usize>().prop_map(Action::Outdent),
            (any::<usize>(), any::<usize>()).prop_map(|(from, to)| Action::Drag(from, to)),
            (any::<usize>(), any::<usize>()).prop_map(|(i, to)| Action::Reorder(i, to)),
            (any::<usize>(), proptest::option::of(any::<usize>()))
                .prop_map(|(i, parent)| Action::SetParent(i, parent)),
        ]
    }

    // Applies one action and reports whether the editor accepted it
    fn apply(editor: &mut MenuEditor, calls: &Rc<RefCell<Vec<Vec<MenuItem>>>>, action: &Action) -> bool {
        let len = editor.len();
        if len == 0 && !matches!(action, Action::Add) {
            return false;
        }
        let id_at = |editor: &MenuEditor, i: usize| editor.items()[i % len].id;
        match *action {
            Action::Add => {
                editor.add();
                true
            }
            Action::Remove(i) => {
                let id = id_at(editor, i);
                editor.remove(&id)
            }
            Action::Move(i, up) => {
                let id = id_at(editor, i);
                let direction = if up { Direction::Up } else { Direction::Down };
                editor.move_item(&id, direction)
            }
            Action::Indent(i) => editor.indent(i % len),
            Action::Outdent(i) => editor.outdent(i % len),
            Action::Drag(from, to) => {
                assert!(editor.begin_drag(from % len));
                let before = calls.borrow().len();
                editor.drag_over(to % len);
                assert_eq!(calls.borrow().len(), before, "drag_over must not notify");
                editor.end_drag()
            }
            Action::Reorder(i, to) => {
                let id = id_at(editor, i);
                editor.reorder(&id, to % len)
            }
            Action::SetParent(i, parent) => {
                let id = id_at(editor, i);
                let parent = match parent {
                    Some(p) => Some(id_at(editor, p)),
                    None => None,
                };
                editor
                    .update_item(&id, &MenuItemPatch::new().parent(parent))
                    .is_ok()
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            .. ProptestConfig::default()
        })]

        #[test]
        fn test_orders_stay_contiguous_across_operations(
            initial in 0usize..6,
            actions in proptest::collection::vec(action(), 0..40),
        ) {
            let names: Vec<String> = (0..initial).map(|n| format!("Item {}", n)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut editor = editor_with(&refs);
            let calls = record(&mut editor);

            for action in &actions {
                let before = calls.borrow().len();
                let accepted = apply(&mut editor, &calls, action);
                let notified = calls.borrow().len() - before;
                prop_assert_eq!(notified, usize::from(accepted), "{:?}", action);
                assert_contiguous(editor.items());

                // Removing a parent leaves dangling children; nothing else may
                // break the tree
                let broken: Vec<MenuError> = crate::tree::problems(editor.items())
                    .into_iter()
                    .filter(|p| !matches!(p, MenuError::DanglingParent { .. }))
                    .collect();
                prop_assert!(broken.is_empty(), "{:?} after {:?}", broken, action);
            }

            for snapshot in calls.borrow().iter() {
                assert_contiguous(snapshot);
            }
        }
    }

    #[test]
    fn test_remove_leaves_children_dangling() {
        let mut editor = editor_with(&["A", "B"]);
        let a = editor.items()[0].id;
        assert!(editor.indent(1));

        assert!(editor.remove(&a));

        let b = &editor.items()[0];
        assert_eq!(b.parent_id, Some(a));
        assert_eq!(b.order, 0);
        assert_eq!(editor.depth(&b.id), 0);

        let tree = editor.tree();
        assert_eq!(tree.roots(), &[b.id]);
        assert_eq!(tree.to_items()[0].parent_id, None);
    }

    #[test]
    fn test_remove_unknown_is_refused() {
        let mut editor = editor_with(&["A"]);
        let calls = record(&mut editor);
        assert!(!editor.remove(&Uuid::new_v4()));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_move_at_boundaries_is_noop() {
        let mut editor = editor_with(&["A", "B"]);
        let calls = record(&mut editor);
        let a = editor.items()[0].id;
        let b = editor.items()[1].id;

        assert!(!editor.move_item(&a, Direction::Up));
        assert!(!editor.move_item(&b, Direction::Down));
        assert_eq!(labels(&editor), vec!["A", "B"]);
        assert!(calls.borrow().is_empty());

        assert!(editor.move_item(&a, Direction::Down));
        assert_eq!(labels(&editor), vec!["B", "A"]);
        assert_contiguous(editor.items());
    }

    #[test]
    fn test_move_ignores_parent_grouping() {
        // A > A1, B > B1 ; moving A1 down past B keeps its parent
        let mut editor = editor_with(&["A", "A1", "B", "B1"]);
        assert!(editor.indent(1));
        assert!(editor.indent(3));
        let a = editor.items()[0].id;
        let a1 = editor.items()[1].id;

        assert!(editor.move_item(&a1, Direction::Down));
        assert_eq!(labels(&editor), vec!["A", "B", "A1", "B1"]);
        assert_eq!(editor.get(&a1).unwrap().parent_id, Some(a));
    }

    #[test]
    fn test_indent_then_outdent() {
        let mut editor = editor_with(&["A", "B"]);
        let a = editor.items()[0].id;
        let b = editor.items()[1].id;

        assert!(editor.indent(1));
        assert_eq!(editor.get(&b).unwrap().parent_id, Some(a));
        assert_eq!(editor.depth(&b), 1);
        assert_eq!(editor.depth(&a), 0);

        assert!(editor.outdent(1));
        assert_eq!(editor.get(&b).unwrap().parent_id, None);
        assert_eq!(editor.depth(&b), 0);
    }

    #[test]
    fn test_indent_first_item_refused() {
        let mut editor = editor_with(&["A", "B"]);
        assert!(!editor.can_indent(0));
        assert!(!editor.indent(0));
        assert!(!editor.indent(5));
    }

    #[test]
    fn test_indent_under_existing_parent_refused() {
        let mut editor = editor_with(&["A", "B"]);
        assert!(editor.indent(1));
        let calls = record(&mut editor);
        assert!(!editor.indent(1));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_indent_capped_at_depth_two() {
        let mut editor = editor_with(&["A", "B", "C", "D"]);
        let d = editor.items()[3].id;

        assert!(editor.indent(1)); // B under A
        assert!(editor.indent(2)); // C under B
        assert_eq!(editor.depth(&editor.items()[2].id), 2);

        // D would land under C at depth 3
        assert!(!editor.can_indent(3));
        assert!(!editor.indent(3));
        assert_eq!(editor.depth(&d), 0);
        assert!(editor.get(&d).unwrap().parent_id.is_none());
    }

    #[test]
    fn test_indent_checks_subtree_height() {
        // A > X, B > B1 > B2 : indenting B under X would push B2 to depth 4
        let mut editor = editor_with(&["A", "X", "B", "B1", "B2"]);
        assert!(editor.indent(1)); // X under A
        assert!(editor.indent(3)); // B1 under B
        assert!(editor.indent(4)); // B2 under B1

        assert_eq!(editor.depth(&editor.items()[1].id), 1);
        assert!(!editor.can_indent(2));
    }

    #[test]
    fn test_indent_refuses_cycle_through_descendant() {
        // A > B, then move B above A: indenting A under B would loop
        let mut editor = editor_with(&["A", "B"]);
        let a = editor.items()[0].id;
        let b = editor.items()[1].id;
        assert!(editor.indent(1));
        assert!(editor.move_item(&b, Direction::Up));
        assert_eq!(labels(&editor), vec!["B", "A"]);

        assert!(!editor.can_indent(1));
        assert!(!editor.indent(1));
        assert_eq!(editor.get(&a).unwrap().parent_id, None);
        assert!(crate::tree::validate(editor.items()).is_ok());
    }

    #[test]
    fn test_outdent_top_level_is_noop() {
        let mut editor = editor_with(&["A"]);
        let calls = record(&mut editor);
        let before = editor.items().to_vec();

        assert!(!editor.can_outdent(0));
        assert!(!editor.outdent(0));
        assert_eq!(editor.items(), before.as_slice());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_outdent_promotes_to_grandparent() {
        let mut editor = editor_with(&["A", "B", "C"]);
        let a = editor.items()[0].id;
        let c = editor.items()[2].id;
        assert!(editor.indent(1));
        assert!(editor.indent(2));
        assert_eq!(editor.depth(&c), 2);

        assert!(editor.outdent(2));
        assert_eq!(editor.get(&c).unwrap().parent_id, Some(a));
        assert_eq!(editor.depth(&c), 1);
    }

    #[test]
    fn test_outdent_with_dangling_parent_goes_top_level() {
        let mut editor = editor_with(&["A", "B"]);
        let a = editor.items()[0].id;
        assert!(editor.indent(1));
        assert!(editor.remove(&a));

        assert!(editor.outdent(0));
        assert!(editor.items()[0].parent_id.is_none());
    }

    #[test]
    fn test_drag_notifies_only_on_end() {
        let mut editor = editor_with(&["A", "B", "C", "D"]);
        let calls = record(&mut editor);

        assert!(editor.begin_drag(0));
        assert!(editor.drag_over(1));
        assert_eq!(editor.dragging(), Some(1));
        assert!(editor.drag_over(2));
        assert_eq!(editor.dragging(), Some(2));
        assert_eq!(labels(&editor), vec!["B", "C", "A", "D"]);
        assert_contiguous(editor.items());
        assert!(calls.borrow().is_empty());

        assert!(editor.end_drag());
        assert_eq!(editor.dragging(), None);
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(calls.borrow()[0][2].label, "A");

        assert!(!editor.end_drag());
    }

    #[test]
    fn test_drag_over_without_drag_is_ignored() {
        let mut editor = editor_with(&["A", "B"]);
        assert!(!editor.drag_over(1));
        assert!(editor.begin_drag(1));
        assert!(!editor.drag_over(1));
        assert!(!editor.drag_over(9));
        assert!(!editor.begin_drag(9));
    }

    #[test]
    fn test_reorder_as_single_gesture() {
        let mut editor = editor_with(&["A", "B", "C", "D"]);
        let calls = record(&mut editor);
        let d = editor.items()[3].id;

        assert!(editor.reorder(&d, 0));
        assert_eq!(labels(&editor), vec!["D", "A", "B", "C"]);
        assert_eq!(calls.borrow().len(), 1);
        assert!(!editor.reorder(&d, 0));
    }

    #[test]
    fn test_sync_replaces_items_and_clears_state() {
        let mut editor = editor_with(&["A", "B"]);
        let calls = record(&mut editor);
        let a = editor.items()[0].id;
        editor.begin_drag(0);
        editor.begin_edit(&a);

        editor.sync(vec![MenuItem::new("Z", "/z")]);

        assert_eq!(labels(&editor), vec!["Z"]);
        assert!(editor.dragging().is_none());
        assert!(editor.draft().is_none());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_edit_commit_merges_draft() {
        let mut editor = editor_with(&["A", "B"]);
        let calls = record(&mut editor);
        let b = editor.items()[1].id;

        assert!(editor.begin_edit(&b));
        if let Some(patch) = editor.draft_mut() {
            patch.label = Some("Blog".into());
            patch.description = Some(Some("Latest posts".into()));
        }
        assert_eq!(editor.commit_edit(), Ok(true));

        let item = editor.get(&b).unwrap();
        assert_eq!(item.label, "Blog");
        assert_eq!(item.description.as_deref(), Some("Latest posts"));
        assert!(editor.draft().is_none());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_edit_cancel_discards_draft() {
        let mut editor = editor_with(&["A"]);
        let calls = record(&mut editor);
        let a = editor.items()[0].id;

        editor.begin_edit(&a);
        if let Some(patch) = editor.draft_mut() {
            patch.label = Some("Changed".into());
        }
        editor.cancel_edit();

        assert_eq!(editor.commit_edit(), Ok(false));
        assert_eq!(editor.get(&a).unwrap().label, "A");
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_begin_edit_unknown_item() {
        let mut editor = editor_with(&["A"]);
        assert!(!editor.begin_edit(&Uuid::new_v4()));
        assert!(editor.draft().is_none());
    }

    #[test]
    fn test_form_parent_rejects_descendant() {
        // A > B > C ; choosing C as A's parent would close a loop
        let mut editor = editor_with(&["A", "B", "C"]);
        let a = editor.items()[0].id;
        let c = editor.items()[2].id;
        assert!(editor.indent(1));
        assert!(editor.indent(2));

        editor.begin_edit(&a);
        if let Some(patch) = editor.draft_mut() {
            patch.parent_id = Some(Some(c));
        }
        assert_eq!(
            editor.commit_edit(),
            Err(MenuError::CircularReference {
                item_id: a,
                parent_id: c
            })
        );
        // Draft stays open, list untouched
        assert!(editor.draft().is_some());
        assert!(editor.get(&a).unwrap().parent_id.is_none());
        assert!(crate::tree::validate(editor.items()).is_ok());
    }

    #[test]
    fn test_unchecked_parent_assignment_corrupts_tree() {
        // Writing the same parent straight into the flat list, as an
        // unvalidated form would, produces a loop the depth walk must survive
        let mut editor = editor_with(&["A", "B", "C"]);
        assert!(editor.indent(1));
        assert!(editor.indent(2));
        let mut items = editor.into_items();
        let c = items[2].id;
        items[0].parent_id = Some(c);

        assert!(matches!(
            crate::tree::validate(&items),
            Err(MenuError::CircularReference { .. })
        ));
        for item in &items {
            assert!(hierarchy::depth_of(&items, &item.id) <= items.len());
        }
    }

    #[test]
    fn test_form_parent_rejects_self_and_depth() {
        let mut editor = editor_with(&["A", "B", "C", "D"]);
        let a = editor.items()[0].id;
        let c = editor.items()[2].id;
        let d = editor.items()[3].id;
        assert!(editor.indent(1));
        assert!(editor.indent(2));

        let patch = MenuItemPatch::new().parent(Some(d));
        assert_eq!(
            editor.update_item(&d, &patch),
            Err(MenuError::SelfParent { item_id: d })
        );

        let patch = MenuItemPatch::new().parent(Some(c));
        assert!(matches!(
            editor.update_item(&d, &patch),
            Err(MenuError::DepthExceeded { depth: 3, .. })
        ));

        let patch = MenuItemPatch::new().parent(Some(Uuid::new_v4()));
        assert!(matches!(
            editor.update_item(&d, &patch),
            Err(MenuError::DanglingParent { .. })
        ));

        let patch = MenuItemPatch::new().parent(Some(a));
        assert!(editor.update_item(&d, &patch).is_ok());
        assert_eq!(editor.depth(&d), 1);
    }

    #[test]
    fn test_parent_options_exclude_self_descendants_and_deep_items() {
        let mut editor = editor_with(&["A", "B", "C", "D"]);
        let (a, b, c, d) = (
            editor.items()[0].id,
            editor.items()[1].id,
            editor.items()[2].id,
            editor.items()[3].id,
        );
        assert!(editor.indent(1));
        assert!(editor.indent(2));

        let for_a: Vec<Uuid> = editor.parent_options(&a).iter().map(|i| i.id).collect();
        // A has two levels below it: nothing can hold it
        assert!(for_a.is_empty());

        let for_d: Vec<Uuid> = editor.parent_options(&d).iter().map(|i| i.id).collect();
        assert_eq!(for_d, vec![a, b]);
        assert!(!for_d.contains(&c));
    }

    #[test]
    fn test_parent_options_on_cyclic_list() {
        let mut a = MenuItem::new("A", "/a");
        let b = MenuItem::new("B", "/b").with_parent(a.id);
        a.parent_id = Some(b.id);
        let c = MenuItem::new("C", "/c");
        let (a_id, c_id) = (a.id, c.id);
        let editor = MenuEditor::new(vec![a, b, c]);

        let options: Vec<Uuid> = editor.parent_options(&a_id).iter().map(|i| i.id).collect();
        assert_eq!(options, vec![c_id]);
    }

    #[test]
    fn test_update_unknown_item() {
        let mut editor = editor_with(&["A"]);
        let id = Uuid::new_v4();
        assert_eq!(
            editor.update_item(&id, &MenuItemPatch::new().label("x")),
            Err(MenuError::ItemNotFound { item_id: id })
        );
    }
}
