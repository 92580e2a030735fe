// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::IndexedRun;

/// Runs narrower or shorter than this are not drawn.
const MIN_EXTENT: f64 = 1e-12;

#[derive(Clone, Debug)]
struct TreeNode {
    run: IndexedRun,
    left: Option<usize>,
    right: Option<usize>,
}

/// Orders the runs of a line by their left edge.
///
/// Runs arrive in logical order, which differs from visual order in bidirectional text. The
/// index is a binary search tree keyed on the left edge of the bounds. Runs with equal left
/// edges keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct SpatialRunIndex {
    nodes: Vec<TreeNode>,
}

impl SpatialRunIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a run, returning `false` if it was dropped for having no area.
    pub fn insert(&mut self, run: IndexedRun) -> bool {
        if run.bounds.width().abs() <= MIN_EXTENT || run.bounds.height().abs() <= MIN_EXTENT {
            return false;
        }
        let key = run.bounds.x0;
        let index = self.nodes.len();
        if !self.nodes.is_empty() {
            let mut current = 0;
            loop {
                let node = &mut self.nodes[current];
                let slot = if key < node.run.bounds.x0 {
                    &mut node.left
                } else {
                    &mut node.right
                };
                match *slot {
                    Some(next) => current = next,
                    None => {
                        *slot = Some(index);
                        break;
                    }
                }
            }
        }
        self.nodes.push(TreeNode {
            run,
            left: None,
            right: None,
        });
        true
    }

    /// Number of runs in the index.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the index holds no runs.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if any run in the index is selected.
    pub fn has_selection(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| node.run.selection == super::SelectionState::Selected)
    }

    /// Node indices in order of the left edge.
    fn in_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut current = (!self.nodes.is_empty()).then_some(0);
        while current.is_some() || !stack.is_empty() {
            while let Some(index) = current {
                stack.push(index);
                current = self.nodes[index].left;
            }
            if let Some(index) = stack.pop() {
                order.push(index);
                current = self.nodes[index].right;
            }
        }
        order
    }

    /// Empties the index, returning the runs ordered by their left edge.
    pub fn take_sorted(&mut self) -> Vec<IndexedRun> {
        let order = self.in_order();
        let mut runs: Vec<Option<IndexedRun>> = self
            .nodes
            .drain(..)
            .map(|node| Some(node.run))
            .collect();
        order
            .into_iter()
            .filter_map(|index| runs[index].take())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::SpatialRunIndex;
    use crate::kurbo::{Point, Rect};
    use crate::node::{Decorations, IndexedRun, RunContent, SelectionState};
    use crate::peniko::color::palette::css;
    use crate::ImageKey;

    fn run(x0: f64, width: f64, tag: usize) -> IndexedRun {
        IndexedRun {
            content: RunContent::Image(ImageKey(format!("{tag}").into())),
            bounds: Rect::new(x0, 0.0, x0 + width, 10.0),
            selection: SelectionState::Unselected,
            clip: None,
            decorations: Decorations::empty(),
            color: css::BLACK,
            background: None,
            decoration_color: None,
            position: Point::ZERO,
            ascent: 8.0,
            ranges: smallvec![tag..tag + 1],
        }
    }

    fn tags(runs: &[IndexedRun]) -> Vec<usize> {
        runs.iter().map(|run| run.ranges[0].start).collect()
    }

    #[test]
    fn sorts_by_left_edge() {
        let mut index = SpatialRunIndex::new();
        for (i, x) in [30.0, 10.0, 50.0, 0.0, 20.0].into_iter().enumerate() {
            assert!(index.insert(run(x, 5.0, i)));
        }
        assert_eq!(index.len(), 5);
        let sorted = index.take_sorted();
        assert_eq!(tags(&sorted), [3, 1, 4, 0, 2]);
        assert!(index.is_empty());
    }

    #[test]
    fn equal_edges_keep_insertion_order() {
        let mut index = SpatialRunIndex::new();
        index.insert(run(10.0, 5.0, 0));
        index.insert(run(10.0, 5.0, 1));
        index.insert(run(0.0, 5.0, 2));
        index.insert(run(10.0, 5.0, 3));
        assert_eq!(tags(&index.take_sorted()), [2, 0, 1, 3]);
    }

    #[test]
    fn zero_area_runs_are_dropped() {
        let mut index = SpatialRunIndex::new();
        assert!(!index.insert(run(10.0, 0.0, 0)));
        assert!(index.is_empty());
    }
}
