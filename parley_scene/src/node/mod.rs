// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building scene nodes from laid out text.
//!
//! [`TextNodeEngine`] collects glyph runs line by line. Each line is ordered left to right by a
//! [`SpatialRunIndex`] and handed to a [`LineCompositor`], which produces selection rectangles,
//! clips and decorations. Once all lines are in, [`merge_runs`] batches glyph runs and a
//! [`SceneEmitter`] writes everything to a [`SceneSink`].

mod compositor;
mod emit;
mod index;
mod merge;
mod run;

use core::ops::Range;

use smallvec::smallvec;

use crate::format::color_changes;
use crate::kurbo::{Point, Rect};
use crate::peniko::color::palette::css;
use crate::peniko::Color;
use crate::{FormatRange, GlyphRun, ImageKey, LineInfo, ParagraphEngine};

pub use compositor::{CompositeOutput, LineCompositor};
pub use emit::{Primitive, SceneEmitter, SceneRecorder, SceneSink};
pub use index::SpatialRunIndex;
pub use merge::{merge_runs, MergedRuns};
pub use run::{
    ClipId, ClipRegion, DecorationKind, DecorationSpan, Decorations, IndexedRun, RunContent,
    SelectionState,
};

/// How glyphs are stylized.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum GlyphStyle {
    /// Plain glyphs.
    #[default]
    Normal,
    /// Glyphs with an outline in the style color.
    Outline,
    /// Glyphs with a shadow below, in the style color.
    Raised,
    /// Glyphs with a shadow above, in the style color.
    Sunken,
}

/// Colors used when building text nodes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeColors {
    /// Text without a foreground format.
    pub text: Color,
    /// Fill of selection rectangles.
    pub selection: Color,
    /// Selected text.
    pub selected_text: Color,
    /// Anchors without a foreground format.
    pub anchor: Color,
    /// Glyph style.
    pub style: GlyphStyle,
    /// Color of the glyph style effect.
    pub style_color: Color,
}

impl Default for NodeColors {
    fn default() -> Self {
        Self {
            text: css::BLACK,
            selection: Color::from_rgb8(0x30, 0x8c, 0xc6),
            selected_text: css::WHITE,
            anchor: css::BLUE,
            style: GlyphStyle::Normal,
            style_color: css::BLACK,
        }
    }
}

/// Resolved colors of a format range.
#[derive(Copy, Clone, Debug)]
struct RunStyle {
    color: Color,
    background: Option<Color>,
    decoration_color: Option<Color>,
}

/// Collects text and images into scene primitives.
#[derive(Clone, Debug)]
pub struct TextNodeEngine {
    colors: NodeColors,
    bridge_selection_seams: bool,
    current_line: Option<(Point, LineInfo)>,
    line_runs: SpatialRunIndex,
    output: CompositeOutput,
}

impl Default for TextNodeEngine {
    fn default() -> Self {
        Self::new(NodeColors::default())
    }
}

impl TextNodeEngine {
    /// Creates an engine drawing with `colors`.
    pub fn new(colors: NodeColors) -> Self {
        Self {
            colors,
            bridge_selection_seams: true,
            current_line: None,
            line_runs: SpatialRunIndex::new(),
            output: CompositeOutput::default(),
        }
    }

    /// The colors the engine draws with.
    pub fn colors(&self) -> &NodeColors {
        &self.colors
    }

    /// Sets whether unselected neighbours of selected glyphs are redrawn inside the selection.
    ///
    /// Enabled by default.
    pub fn set_bridge_selection_seams(&mut self, bridge: bool) {
        self.bridge_selection_seams = bridge;
    }

    /// Adds `lines` of `layout`, placed at `position`.
    ///
    /// Text within the half-open `selection` is drawn selected.
    pub fn add_text_layout(
        &mut self,
        position: Point,
        layout: &dyn ParagraphEngine,
        selection: Option<Range<usize>>,
        lines: Range<usize>,
    ) {
        let formats = color_changes(layout.formats());
        for index in lines {
            let Some(line) = layout.line(index) else {
                break;
            };
            let text_range = line.text_range.clone();
            self.set_current_line(position, line);
            self.add_glyphs_for_ranges(
                position,
                layout,
                index,
                text_range,
                &formats,
                selection.clone(),
            );
        }
        self.finish_line();
    }

    /// Starts collecting runs of `line`, compositing the previous line.
    pub fn set_current_line(&mut self, position: Point, line: LineInfo) {
        self.finish_line();
        self.current_line = Some((position, line));
    }

    /// Composites the runs of the current line.
    pub fn finish_line(&mut self) {
        let Some((origin, line)) = self.current_line.take() else {
            return;
        };
        let mut compositor = LineCompositor::new(origin, &line);
        for run in self.line_runs.take_sorted() {
            compositor.push(run, &mut self.output);
        }
        compositor.finish(&mut self.output);
    }

    /// Adds the glyphs of `text_range` on `line`, split at the color changes in `formats`.
    ///
    /// `formats` must be sorted and must not overlap.
    pub fn add_glyphs_for_ranges(
        &mut self,
        position: Point,
        layout: &dyn ParagraphEngine,
        line: usize,
        text_range: Range<usize>,
        formats: &[FormatRange],
        selection: Option<Range<usize>>,
    ) {
        let end = text_range.end;
        let mut current = text_range.start;
        let plain = self.plain_style();
        for format in formats {
            if format.range.start >= end {
                break;
            }
            if format.range.end <= current {
                continue;
            }
            if format.range.start > current {
                self.add_glyphs_in_range(
                    position,
                    layout,
                    line,
                    current..format.range.start,
                    plain,
                    selection.clone(),
                );
            }
            let style = RunStyle {
                color: match format.format.foreground {
                    Some(color) => color,
                    None if format.format.anchor => self.colors.anchor,
                    None => self.colors.text,
                },
                background: format.format.background,
                decoration_color: format.format.underline_color,
            };
            let start = format.range.start.max(current);
            self.add_glyphs_in_range(
                position,
                layout,
                line,
                start..format.range.end.min(end),
                style,
                selection.clone(),
            );
            current = format.range.end;
            if current >= end {
                break;
            }
        }
        if current < end {
            self.add_glyphs_in_range(position, layout, line, current..end, plain, selection);
        }
    }

    fn plain_style(&self) -> RunStyle {
        RunStyle {
            color: self.colors.text,
            background: None,
            decoration_color: None,
        }
    }

    /// Adds the glyphs of `range`, split into stretches before, inside and after `selection`.
    fn add_glyphs_in_range(
        &mut self,
        position: Point,
        layout: &dyn ParagraphEngine,
        line: usize,
        range: Range<usize>,
        style: RunStyle,
        selection: Option<Range<usize>>,
    ) {
        use SelectionState::{Selected, Unselected};

        let selection = selection.filter(|selection| {
            !selection.is_empty() && selection.start < range.end && selection.end > range.start
        });
        let Some(selection) = selection else {
            self.add_runs(position, layout, line, range, style, Unselected);
            return;
        };
        if range.start < selection.start {
            self.add_runs(
                position,
                layout,
                line,
                range.start..selection.start,
                style,
                Unselected,
            );
        }
        let selected = selection.start.max(range.start)..selection.end.min(range.end);
        self.add_runs(position, layout, line, selected, style, Selected);
        if selection.end < range.end {
            self.add_runs(
                position,
                layout,
                line,
                selection.end..range.end,
                style,
                Unselected,
            );
        }
    }

    fn add_runs(
        &mut self,
        position: Point,
        layout: &dyn ParagraphEngine,
        line: usize,
        range: Range<usize>,
        style: RunStyle,
        selection: SelectionState,
    ) {
        if range.is_empty() {
            return;
        }
        for glyphs in layout.glyph_runs(line, range) {
            let run = indexed_run(position, glyphs, style, selection);
            self.line_runs.insert(run);
        }
    }

    /// Adds an inline image occupying `rect` in scene coordinates.
    pub fn add_inline_image(&mut self, rect: Rect, key: ImageKey, selection: SelectionState) {
        self.output.runs.push(IndexedRun {
            content: RunContent::Image(key),
            bounds: rect,
            selection,
            clip: None,
            decorations: Decorations::empty(),
            color: self.colors.text,
            background: None,
            decoration_color: None,
            position: rect.origin(),
            ascent: rect.height(),
            ranges: smallvec![],
        });
    }

    /// Everything composited so far.
    pub fn output(&mut self) -> &CompositeOutput {
        self.finish_line();
        &self.output
    }

    /// Writes the collected primitives to `sink`, leaving the engine empty.
    pub fn emit(&mut self, sink: &mut dyn SceneSink) {
        self.finish_line();
        let output = core::mem::take(&mut self.output);
        let merged = merge_runs(output.runs.iter().cloned());
        log::trace!(
            "emitting {} glyph batches from {} runs",
            merged.glyphs.len(),
            output.runs.len()
        );
        SceneEmitter::new(&self.colors, self.bridge_selection_seams).emit(&output, &merged, sink);
    }
}

fn indexed_run(
    position: Point,
    glyphs: GlyphRun,
    style: RunStyle,
    selection: SelectionState,
) -> IndexedRun {
    let mut decorations = Decorations::empty();
    decorations.set(Decorations::UNDERLINE, glyphs.underline);
    decorations.set(Decorations::OVERLINE, glyphs.overline);
    decorations.set(Decorations::STRIKE_OUT, glyphs.strikeout);
    decorations.set(Decorations::BACKGROUND, style.background.is_some());
    IndexedRun {
        bounds: glyphs.bounds + position.to_vec2(),
        ascent: glyphs.font.ascent,
        ranges: smallvec![glyphs.text_range.clone()],
        content: RunContent::Glyphs(glyphs),
        selection,
        clip: None,
        decorations,
        color: style.color,
        background: style.background,
        decoration_color: style.decoration_color,
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeColors, Primitive, SceneRecorder, TextNodeEngine};
    use crate::kurbo::Point;
    use crate::peniko::color::palette::css;
    use crate::{CharFormat, FormatRange, ParagraphEngine, SimpleLayout};

    fn layout(text: &str, formats: &[FormatRange]) -> SimpleLayout {
        let mut layout = SimpleLayout::default();
        layout.set_text(text);
        layout.set_formats(formats);
        layout.begin_layout();
        while let Some(line) = layout.create_line() {
            layout.set_line_width(line, 1000.0);
        }
        layout.end_layout();
        layout
    }

    #[test]
    fn selection_splits_runs() {
        let layout = layout("abcdefghij", &[]);
        let mut engine = TextNodeEngine::default();
        engine.add_text_layout(Point::ZERO, &layout, Some(2..5), 0..1);
        let output = engine.output();
        assert_eq!(output.runs.len(), 3);
        assert_eq!(output.selection_rects.len(), 1);
        assert_eq!(output.selection_rects[0].x0, 16.0);
        assert_eq!(output.selection_rects[0].x1, 40.0);
    }

    #[test]
    fn empty_selection_selects_nothing() {
        let layout = layout("abcdefghij", &[]);
        let mut engine = TextNodeEngine::default();
        engine.add_text_layout(Point::ZERO, &layout, Some(4..4), 0..1);
        let output = engine.output();
        assert_eq!(output.runs.len(), 1);
        assert!(output.selection_rects.is_empty());
    }

    #[test]
    fn anchors_use_anchor_color() {
        let anchor = FormatRange::new(0..3, CharFormat::default().with_anchor());
        let layout = layout("link text", &[anchor]);
        let colors = NodeColors {
            anchor: css::GREEN,
            ..NodeColors::default()
        };
        let mut engine = TextNodeEngine::new(colors);
        engine.add_text_layout(Point::ZERO, &layout, None, 0..1);
        let mut scene = SceneRecorder::default();
        engine.emit(&mut scene);
        let colors: Vec<_> = scene
            .primitives
            .iter()
            .filter_map(|primitive| match primitive {
                Primitive::Glyphs { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, [css::GREEN, css::BLACK]);
    }
}
