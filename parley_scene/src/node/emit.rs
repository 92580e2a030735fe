// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use hashbrown::HashSet;

use super::{
    ClipId, CompositeOutput, GlyphStyle, IndexedRun, MergedRuns, NodeColors, SelectionState,
};
use crate::kurbo::Rect;
use crate::peniko::Color;
use crate::{FontId, Glyph, ImageKey};

/// Alpha of the tint drawn over selected images.
const IMAGE_SELECTION_ALPHA: f32 = 128.0 / 255.0;

/// Receives the primitives of a text node.
pub trait SceneSink {
    /// Removes everything added before.
    fn clear(&mut self) {}

    /// Adds a filled rectangle.
    fn add_rectangle(&mut self, rect: Rect, color: Color);

    /// Adds a clip region. Glyphs referring to `id` are only added after the region.
    fn add_clip(&mut self, id: ClipId, rect: Rect);

    /// Adds a batch of glyphs.
    ///
    /// Glyph positions in `run` are relative to `run.position`.
    fn add_glyphs(
        &mut self,
        run: &IndexedRun,
        color: Color,
        style: GlyphStyle,
        style_color: Color,
        clip: Option<ClipId>,
    );

    /// Adds an underline, overline or strike-out.
    fn add_decoration(&mut self, rect: Rect, color: Color);

    /// Adds an image.
    fn add_image(&mut self, rect: Rect, image: &ImageKey);
}

/// A primitive recorded by [`SceneRecorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// A filled rectangle.
    Rectangle {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// A clip region.
    Clip {
        /// Identity of the region.
        id: ClipId,
        /// Area glyphs are clipped to.
        rect: Rect,
    },
    /// A batch of glyphs.
    Glyphs {
        /// The font of all glyphs.
        font: FontId,
        /// Glyphs in scene coordinates.
        glyphs: Vec<Glyph>,
        /// Bounds of the batch in scene coordinates.
        bounds: Rect,
        /// Text color.
        color: Color,
        /// Glyph style.
        style: GlyphStyle,
        /// Color of the glyph style effect.
        style_color: Color,
        /// Clip region the glyphs are drawn in.
        clip: Option<ClipId>,
        /// Ranges of the text drawn.
        ranges: Vec<Range<usize>>,
    },
    /// A text decoration.
    Decoration {
        /// Area of the line.
        rect: Rect,
        /// Line color.
        color: Color,
    },
    /// An inline image.
    Image {
        /// Where the image is drawn.
        rect: Rect,
        /// Which image.
        key: ImageKey,
    },
}

/// A [`SceneSink`] that records primitives in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneRecorder {
    /// Recorded primitives.
    pub primitives: Vec<Primitive>,
}

impl SceneSink for SceneRecorder {
    fn clear(&mut self) {
        self.primitives.clear();
    }

    fn add_rectangle(&mut self, rect: Rect, color: Color) {
        self.primitives.push(Primitive::Rectangle { rect, color });
    }

    fn add_clip(&mut self, id: ClipId, rect: Rect) {
        self.primitives.push(Primitive::Clip { id, rect });
    }

    fn add_glyphs(
        &mut self,
        run: &IndexedRun,
        color: Color,
        style: GlyphStyle,
        style_color: Color,
        clip: Option<ClipId>,
    ) {
        let Some(glyphs) = run.glyphs() else {
            return;
        };
        let offset = run.position.to_vec2();
        self.primitives.push(Primitive::Glyphs {
            font: glyphs.font.id,
            glyphs: glyphs
                .glyphs
                .iter()
                .map(|glyph| Glyph {
                    x: glyph.x + offset.x,
                    y: glyph.y + offset.y,
                    ..*glyph
                })
                .collect(),
            bounds: run.bounds,
            color,
            style,
            style_color,
            clip,
            ranges: run.ranges.to_vec(),
        });
    }

    fn add_decoration(&mut self, rect: Rect, color: Color) {
        self.primitives.push(Primitive::Decoration { rect, color });
    }

    fn add_image(&mut self, rect: Rect, image: &ImageKey) {
        self.primitives.push(Primitive::Image {
            rect,
            key: image.clone(),
        });
    }
}

/// Writes composited and merged runs to a [`SceneSink`] in paint order.
///
/// Backgrounds come first, then unselected glyphs, selection rectangles, decorations, selected
/// glyphs and finally images. Selected glyphs are drawn in the selected text color inside the
/// clip of their selection rectangle.
///
/// Glyphs of unselected batches next to a selected one can overhang into the selection. With
/// seam bridging enabled, those neighbours are drawn again in the selected color inside the
/// selection clip.
#[derive(Clone, Copy, Debug)]
pub struct SceneEmitter<'a> {
    colors: &'a NodeColors,
    bridge_selection_seams: bool,
}

impl<'a> SceneEmitter<'a> {
    /// Creates an emitter using `colors`.
    pub fn new(colors: &'a NodeColors, bridge_selection_seams: bool) -> Self {
        Self {
            colors,
            bridge_selection_seams,
        }
    }

    /// Emits everything to `sink`.
    pub fn emit(
        &self,
        composite: &CompositeOutput,
        merged: &MergedRuns,
        sink: &mut dyn SceneSink,
    ) {
        let colors = self.colors;
        for (rect, color) in &composite.backgrounds {
            if !is_transparent(*color) {
                sink.add_rectangle(*rect, *color);
            }
        }

        for run in merged
            .glyphs
            .iter()
            .filter(|run| run.selection == SelectionState::Unselected)
        {
            sink.add_glyphs(run, run.color, colors.style, colors.style_color, None);
        }

        if !is_transparent(colors.selection) {
            for rect in &composite.selection_rects {
                sink.add_rectangle(*rect, colors.selection);
            }
        }

        for span in &composite.decorations {
            let color = match span.selection {
                SelectionState::Selected => colors.selected_text,
                SelectionState::Unselected => span.color,
            };
            sink.add_decoration(span.rect, color);
        }

        self.emit_selected_glyphs(composite, merged, sink);

        for image in merged
            .images
            .iter()
            .filter(|run| run.selection == SelectionState::Unselected)
        {
            if let Some(key) = image.image() {
                sink.add_image(image.bounds, key);
            }
        }
        for image in merged
            .images
            .iter()
            .filter(|run| run.selection == SelectionState::Selected)
        {
            if let Some(key) = image.image() {
                sink.add_image(image.bounds, key);
                if !is_transparent(colors.selection) {
                    let tint = colors.selection.with_alpha(IMAGE_SELECTION_ALPHA);
                    sink.add_rectangle(image.bounds, tint);
                }
            }
        }
    }

    fn emit_selected_glyphs(
        &self,
        composite: &CompositeOutput,
        merged: &MergedRuns,
        sink: &mut dyn SceneSink,
    ) {
        let colors = self.colors;
        let batches = &merged.glyphs;
        let mut clips_added = HashSet::new();
        let mut bridged: HashSet<(usize, Option<ClipId>)> = HashSet::new();
        for (index, run) in batches.iter().enumerate() {
            if run.selection != SelectionState::Selected {
                continue;
            }
            let mut clip = None;
            if let Some((id, rect)) = run
                .clip
                .and_then(|id| composite.clip_rect(id).map(|rect| (id, rect)))
            {
                if clips_added.insert(id) {
                    sink.add_clip(id, rect);
                }
                clip = Some(id);
            }
            let color = colors.selected_text;

            if !self.bridge_selection_seams {
                sink.add_glyphs(run, color, colors.style, colors.style_color, clip);
                continue;
            }

            // Runs starting at the same edge are parts of the same cluster, not neighbours.
            let previous = (0..index)
                .rev()
                .find(|&i| (batches[i].bounds.x0 - run.bounds.x0).abs() > f64::EPSILON);
            let next = (index + 1 < batches.len()).then_some(index + 1);
            for neighbour in [previous, next].into_iter().flatten() {
                let other = &batches[neighbour];
                if other.selection == SelectionState::Unselected
                    && bridged.insert((neighbour, clip))
                {
                    sink.add_glyphs(other, color, colors.style, colors.style_color, clip);
                }
            }

            let draw_current = if previous.is_none() && next.is_none() {
                true
            } else {
                let covered: usize = [previous, next]
                    .into_iter()
                    .flatten()
                    .map(|neighbour| overlap(run, &batches[neighbour]))
                    .sum();
                covered < run.covered_len()
            };
            if draw_current {
                sink.add_glyphs(run, color, colors.style, colors.style_color, clip);
            }
        }
    }
}

/// Number of text bytes of `run` also drawn by `other`.
fn overlap(run: &IndexedRun, other: &IndexedRun) -> usize {
    run.ranges
        .iter()
        .map(|range| {
            other
                .ranges
                .iter()
                .map(|o| range.end.min(o.end).saturating_sub(range.start.max(o.start)))
                .sum::<usize>()
        })
        .sum()
}

fn is_transparent(color: Color) -> bool {
    color.components[3] <= 0.0
}
