//! Department tree picker
//!
//! Renders a [`Forest`] as indented rows with a disclosure control per
//! non-leaf node. Expansion flags live here and are private to the picker;
//! the selected department is owned by the caller and only read for
//! highlighting, and written back through the `on_select` callback.
//!
//! Collapsing a node unmounts its descendants, so their expansion flags are
//! dropped with it. Every node starts collapsed.

use std::collections::HashSet;

use crate::domain::{DepartmentId, Forest, Node};

/// Columns taken by the disclosure control (or its placeholder)
pub const DISCLOSURE_WIDTH: u16 = 2;

/// Disclosure control shown at the start of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    Collapsed,
    Expanded,
    /// Leaf: inert spacer of the same width
    Placeholder,
}

impl Disclosure {
    pub fn symbol(&self) -> &'static str {
        match self {
            Disclosure::Collapsed => "▸ ",
            Disclosure::Expanded => "▾ ",
            Disclosure::Placeholder => "  ",
        }
    }
}

/// One rendered line of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow<'a> {
    pub node: &'a Node,
    pub depth: usize,
    /// Leading columns before the disclosure control
    pub indent: u16,
    pub disclosure: Disclosure,
    /// Row is the caller's selected department
    pub selected: bool,
}

impl TreeRow<'_> {
    pub fn id(&self) -> &DepartmentId {
        &self.node.id
    }

    /// Plain text of the row: indentation, disclosure, name
    pub fn text(&self) -> String {
        format!(
            "{}{}{}",
            " ".repeat(self.indent as usize),
            self.disclosure.symbol(),
            self.node.name
        )
    }

    /// Returns true if `column` (relative to the row start) hits the disclosure control
    pub fn hits_disclosure(&self, column: u16) -> bool {
        self.disclosure != Disclosure::Placeholder
            && column >= self.indent
            && column < self.indent + DISCLOSURE_WIDTH
    }
}

/// Which part of a row was clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Row,
    Disclosure,
}

/// What a click did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// `on_select` was called with this ID
    Selected(DepartmentId),
    /// Expansion flag flipped; no selection
    Toggled { expanded: bool },
    /// ID not in the forest; nothing happened
    Ignored,
}

/// Interactive state of the tree picker
#[derive(Debug, Clone)]
pub struct TreeSelector {
    expanded: HashSet<DepartmentId>,
    indent: u16,
    cursor: usize,
}

impl Default for TreeSelector {
    fn default() -> Self {
        Self::new(2)
    }
}

impl TreeSelector {
    /// Creates a picker with everything collapsed
    pub fn new(indent: u16) -> Self {
        Self {
            expanded: HashSet::new(),
            indent,
            cursor: 0,
        }
    }

    pub fn is_expanded(&self, id: &DepartmentId) -> bool {
        self.expanded.contains(id)
    }

    /// Rows visible for the current expansion state, in pre-order
    pub fn rows<'a>(&self, forest: &'a Forest, selected: Option<&DepartmentId>) -> Vec<TreeRow<'a>> {
        let mut rows = Vec::new();
        let mut stack: Vec<(usize, &Node)> =
            forest.roots().iter().rev().map(|node| (0, node)).collect();

        while let Some((depth, node)) = stack.pop() {
            let disclosure = if !node.has_children() {
                Disclosure::Placeholder
            } else if self.is_expanded(&node.id) {
                Disclosure::Expanded
            } else {
                Disclosure::Collapsed
            };

            rows.push(TreeRow {
                node,
                depth,
                indent: self.indent.saturating_mul(depth.min(u16::MAX as usize) as u16),
                disclosure,
                selected: selected == Some(&node.id),
            });

            if disclosure == Disclosure::Expanded {
                stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
            }
        }

        rows
    }

    /// Handles a click on the node `id`.
    ///
    /// A row click calls `on_select` once. A disclosure click on a node with
    /// children toggles it and never selects; on a leaf the placeholder is
    /// inert and the click lands on the row.
    pub fn click(
        &mut self,
        forest: &Forest,
        id: &DepartmentId,
        target: ClickTarget,
        on_select: impl FnOnce(&DepartmentId),
    ) -> ClickOutcome {
        let Some(node) = forest.find_node(id) else {
            return ClickOutcome::Ignored;
        };

        if target == ClickTarget::Disclosure && node.has_children() {
            let expanded = self.toggle_node(node);
            return ClickOutcome::Toggled { expanded };
        }

        on_select(&node.id);
        ClickOutcome::Selected(node.id.clone())
    }

    /// Toggles the node `id`; returns the new state, or `None` for leaves and unknown IDs
    pub fn toggle(&mut self, forest: &Forest, id: &DepartmentId) -> Option<bool> {
        let node = forest.find_node(id).filter(|node| node.has_children())?;
        Some(self.toggle_node(node))
    }

    fn toggle_node(&mut self, node: &Node) -> bool {
        if self.expanded.remove(&node.id) {
            for descendant in node.descendants() {
                self.expanded.remove(&descendant.id);
            }
            false
        } else {
            self.expanded.insert(node.id.clone());
            true
        }
    }

    /// Expands every node with children
    pub fn expand_all(&mut self, forest: &Forest) {
        self.expanded = forest
            .iter()
            .filter(|node| node.has_children())
            .map(|node| node.id.clone())
            .collect();
    }

    /// Collapses everything
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.cursor = 0;
    }

    // Keyboard cursor over visible rows

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor by `delta`, clamped to the visible rows
    pub fn move_cursor(&mut self, delta: isize, row_count: usize) {
        if row_count == 0 {
            self.cursor = 0;
            return;
        }
        let max = (row_count - 1) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
    }

    /// Keeps the cursor on a visible row after rows disappear
    pub fn clamp_cursor(&mut self, row_count: usize) {
        self.move_cursor(0, row_count);
    }

    /// Maps a row index and column to a click, if it lands on a row
    pub fn hit_test(
        &self,
        rows: &[TreeRow<'_>],
        row_index: usize,
        column: u16,
    ) -> Option<(DepartmentId, ClickTarget)> {
        let row = rows.get(row_index)?;
        let target = if row.hits_disclosure(column) {
            ClickTarget::Disclosure
        } else {
            ClickTarget::Row
        };
        Some((row.id().clone(), target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DepartmentId {
        s.parse().unwrap()
    }

    /// `[{A: [A1]}]`
    fn scenario_forest() -> Forest {
        Forest::from_roots(vec![Node::with_children(
            id("A"),
            "Unit A",
            vec![Node::leaf(id("A1"), "Dept A1")],
        )])
        .unwrap()
    }

    /// `[{A: [{A1: [A1a, A1b]}, A2]}, B]`
    fn deep_forest() -> Forest {
        Forest::from_roots(vec![
            Node::with_children(
                id("A"),
                "Unit A",
                vec![
                    Node::with_children(
                        id("A1"),
                        "Dept A1",
                        vec![
                            Node::leaf(id("A1a"), "Section A1a"),
                            Node::leaf(id("A1b"), "Section A1b"),
                        ],
                    ),
                    Node::leaf(id("A2"), "Dept A2"),
                ],
            ),
            Node::leaf(id("B"), "Unit B"),
        ])
        .unwrap()
    }

    fn visible_ids(selector: &TreeSelector, forest: &Forest) -> Vec<String> {
        selector
            .rows(forest, None)
            .iter()
            .map(|row| row.id().to_string())
            .collect()
    }

    #[test]
    fn everything_starts_collapsed() {
        let forest = deep_forest();
        let selector = TreeSelector::default();

        assert_eq!(visible_ids(&selector, &forest), vec!["A", "B"]);
        assert!(!selector.is_expanded(&id("A")));
    }

    #[test]
    fn scenario_expand_then_select() {
        let forest = scenario_forest();
        let mut selector = TreeSelector::default();
        let mut selected: Option<DepartmentId> = None;

        let outcome = selector.click(&forest, &id("A"), ClickTarget::Disclosure, |id| {
            selected = Some(id.clone())
        });
        assert_eq!(outcome, ClickOutcome::Toggled { expanded: true });
        assert_eq!(selected, None);
        assert_eq!(visible_ids(&selector, &forest), vec!["A", "A1"]);

        let outcome = selector.click(&forest, &id("A1"), ClickTarget::Row, |id| {
            selected = Some(id.clone())
        });
        assert_eq!(outcome, ClickOutcome::Selected(id("A1")));
        assert_eq!(selected, Some(id("A1")));
    }

    #[test]
    fn row_click_selects_non_leaf_without_expanding() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();
        let mut calls = Vec::new();

        selector.click(&forest, &id("A"), ClickTarget::Row, |id| calls.push(id.clone()));

        assert_eq!(calls, vec![id("A")]);
        assert!(!selector.is_expanded(&id("A")));

        // Same when expanded
        selector.toggle(&forest, &id("A"));
        selector.click(&forest, &id("A"), ClickTarget::Row, |id| calls.push(id.clone()));
        assert_eq!(calls, vec![id("A"), id("A")]);
        assert!(selector.is_expanded(&id("A")));
    }

    #[test]
    fn disclosure_click_on_leaf_selects() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();
        let mut calls = Vec::new();

        let outcome =
            selector.click(&forest, &id("B"), ClickTarget::Disclosure, |id| calls.push(id.clone()));

        assert_eq!(outcome, ClickOutcome::Selected(id("B")));
        assert_eq!(calls, vec![id("B")]);
        assert!(!selector.is_expanded(&id("B")));
        assert_eq!(selector.toggle(&forest, &id("B")), None);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();
        let mut called = false;

        let outcome = selector.click(&forest, &id("ZZZ"), ClickTarget::Row, |_| called = true);

        assert_eq!(outcome, ClickOutcome::Ignored);
        assert!(!called);
    }

    #[test]
    fn expanding_reveals_only_direct_children() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();

        assert_eq!(selector.toggle(&forest, &id("A")), Some(true));
        assert_eq!(visible_ids(&selector, &forest), vec!["A", "A1", "A2", "B"]);

        let rows = selector.rows(&forest, None);
        assert_eq!(rows[1].disclosure, Disclosure::Collapsed);
        assert_eq!(rows[2].disclosure, Disclosure::Placeholder);

        selector.toggle(&forest, &id("A1"));
        assert_eq!(
            visible_ids(&selector, &forest),
            vec!["A", "A1", "A1a", "A1b", "A2", "B"]
        );
    }

    #[test]
    fn collapse_drops_descendant_flags() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();

        selector.toggle(&forest, &id("A"));
        selector.toggle(&forest, &id("A1"));
        assert_eq!(selector.toggle(&forest, &id("A")), Some(false));
        assert!(!selector.is_expanded(&id("A1")));

        selector.toggle(&forest, &id("A"));
        assert_eq!(visible_ids(&selector, &forest), vec!["A", "A1", "A2", "B"]);
    }

    #[test]
    fn indentation_follows_depth() {
        let forest = deep_forest();
        let mut selector = TreeSelector::new(3);
        selector.expand_all(&forest);

        let rows = selector.rows(&forest, None);
        let indents: Vec<_> = rows.iter().map(|r| (r.depth, r.indent)).collect();
        assert_eq!(indents, vec![(0, 0), (1, 3), (2, 6), (2, 6), (1, 3), (0, 0)]);
        assert_eq!(rows[2].text(), "        Section A1a");
        assert_eq!(rows[0].text(), "▾ Unit A");
    }

    #[test]
    fn at_most_one_row_highlighted() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();
        selector.expand_all(&forest);

        let highlighted = |selected: Option<&DepartmentId>| -> Vec<String> {
            selector
                .rows(&forest, selected)
                .iter()
                .filter(|r| r.selected)
                .map(|r| r.id().to_string())
                .collect()
        };

        assert!(highlighted(None).is_empty());
        assert_eq!(highlighted(Some(&id("A1b"))), vec!["A1b"]);
        assert!(highlighted(Some(&id("nope"))).is_empty());
    }

    #[test]
    fn selection_of_hidden_node_does_not_expand() {
        let forest = deep_forest();
        let selector = TreeSelector::default();

        let rows = selector.rows(&forest, Some(&id("A1a")));
        assert!(rows.iter().all(|r| !r.selected));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn hit_test_separates_disclosure_from_row() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();
        selector.toggle(&forest, &id("A"));
        let rows = selector.rows(&forest, None);

        // Row 1 is A1 at indent 2: disclosure occupies columns 2..4
        assert_eq!(
            selector.hit_test(&rows, 1, 2),
            Some((id("A1"), ClickTarget::Disclosure))
        );
        assert_eq!(selector.hit_test(&rows, 1, 1), Some((id("A1"), ClickTarget::Row)));
        assert_eq!(selector.hit_test(&rows, 1, 6), Some((id("A1"), ClickTarget::Row)));
        // A2 is a leaf: the placeholder is part of the row
        assert_eq!(selector.hit_test(&rows, 2, 2), Some((id("A2"), ClickTarget::Row)));
        assert_eq!(selector.hit_test(&rows, 9, 0), None);
    }

    #[test]
    fn cursor_is_clamped() {
        let mut selector = TreeSelector::default();

        selector.move_cursor(5, 3);
        assert_eq!(selector.cursor(), 2);
        selector.move_cursor(-10, 3);
        assert_eq!(selector.cursor(), 0);

        selector.move_cursor(2, 3);
        selector.clamp_cursor(1);
        assert_eq!(selector.cursor(), 0);
    }

    #[test]
    fn expand_all_then_collapse_all() {
        let forest = deep_forest();
        let mut selector = TreeSelector::default();

        selector.expand_all(&forest);
        assert!(selector.is_expanded(&id("A")));
        assert!(selector.is_expanded(&id("A1")));
        assert!(!selector.is_expanded(&id("B")));
        selector.move_cursor(4, 6);

        selector.collapse_all();
        assert_eq!(visible_ids(&selector, &forest), vec!["A", "B"]);
        assert_eq!(selector.cursor(), 0);
    }
}
