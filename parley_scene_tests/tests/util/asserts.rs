// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Helpers to inspect recorded scenes and assert truths about them.

use core::ops::Range;

use parley_scene::kurbo::Rect;
use parley_scene::node::{ClipId, CompositeOutput};
use parley_scene::{Glyph, Primitive, SceneRecorder, SelectionState};
use peniko::Color;

/// A glyph primitive, with the glyphs turned back into text.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GlyphBatch {
    pub(crate) text: String,
    pub(crate) color: Color,
    pub(crate) clip: Option<ClipId>,
    pub(crate) bounds: Rect,
    pub(crate) ranges: Vec<Range<usize>>,
}

/// `SimpleLayout` uses the character as glyph id.
fn glyph_text(glyphs: &[Glyph]) -> String {
    glyphs
        .iter()
        .filter_map(|glyph| char::from_u32(glyph.id))
        .collect()
}

pub(crate) fn glyph_batches(scene: &SceneRecorder) -> Vec<GlyphBatch> {
    scene
        .primitives
        .iter()
        .filter_map(|primitive| match primitive {
            Primitive::Glyphs {
                glyphs,
                bounds,
                color,
                clip,
                ranges,
                ..
            } => Some(GlyphBatch {
                text: glyph_text(glyphs),
                color: *color,
                clip: *clip,
                bounds: *bounds,
                ranges: ranges.clone(),
            }),
            _ => None,
        })
        .collect()
}

pub(crate) fn rectangles(scene: &SceneRecorder) -> Vec<(Rect, Color)> {
    scene
        .primitives
        .iter()
        .filter_map(|primitive| match primitive {
            Primitive::Rectangle { rect, color } => Some((*rect, *color)),
            _ => None,
        })
        .collect()
}

pub(crate) fn decorations(scene: &SceneRecorder) -> Vec<(Rect, Color)> {
    scene
        .primitives
        .iter()
        .filter_map(|primitive| match primitive {
            Primitive::Decoration { rect, color } => Some((*rect, *color)),
            _ => None,
        })
        .collect()
}

pub(crate) fn images(scene: &SceneRecorder) -> Vec<(Rect, String)> {
    scene
        .primitives
        .iter()
        .filter_map(|primitive| match primitive {
            Primitive::Image { rect, key } => Some((*rect, key.url().to_owned())),
            _ => None,
        })
        .collect()
}

/// How often every byte of a text `len` bytes long is drawn by `batches`.
pub(crate) fn coverage(batches: &[GlyphBatch], len: usize) -> Vec<usize> {
    let mut counts = vec![0; len];
    for range in batches.iter().flat_map(|batch| batch.ranges.iter()) {
        for count in &mut counts[range.clone()] {
            *count += 1;
        }
    }
    counts
}

/// Sorted, joined x-extents.
fn merge_intervals(mut intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::new();
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 + 1e-9 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Asserts that on every line, selection rectangles cover exactly the selected runs.
pub(crate) fn assert_selection_sound(output: &CompositeOutput) {
    let mut tops: Vec<f64> = output.runs.iter().map(|run| run.bounds.y0).collect();
    tops.sort_by(f64::total_cmp);
    tops.dedup();
    for top in tops {
        let on_line = output.runs.iter().filter(|run| run.bounds.y0 == top);
        let selected = merge_intervals(
            on_line
                .clone()
                .filter(|run| run.selection == SelectionState::Selected)
                .map(|run| (run.bounds.x0, run.bounds.x1))
                .collect(),
        );
        let rects = merge_intervals(
            output
                .selection_rects
                .iter()
                .filter(|rect| rect.y0 == top)
                .map(|rect| (rect.x0, rect.x1))
                .collect(),
        );
        assert_eq!(selected, rects, "selection rectangles of line at {top}");
        for run in on_line.filter(|run| run.selection == SelectionState::Unselected) {
            for &(start, end) in &rects {
                let overlap = run.bounds.x1.min(end) - run.bounds.x0.max(start);
                assert!(
                    overlap <= 1e-9,
                    "unselected run {:?} overlaps selection {start}..{end}",
                    run.bounds
                );
            }
        }
    }
}
