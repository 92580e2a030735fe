// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use smallvec::SmallVec;

use super::{
    ClipId, ClipRegion, DecorationKind, DecorationSpan, Decorations, IndexedRun, SelectionState,
};
use crate::kurbo::{Point, Rect, Size};
use crate::peniko::Color;
use crate::LineInfo;

/// Decoration spans that abut within this distance are joined.
const ABUT_TOLERANCE: f64 = 1e-6;

/// Everything produced by compositing lines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeOutput {
    /// Runs in line order, each line sorted by left edge.
    pub runs: Vec<IndexedRun>,
    /// Rectangles behind selected runs, one per selected stretch of a line.
    pub selection_rects: Vec<Rect>,
    /// Underlines, overlines and strike-outs.
    pub decorations: Vec<DecorationSpan>,
    /// Filled backgrounds with their colors.
    pub backgrounds: Vec<(Rect, Color)>,
    /// Clips referenced by selected runs, indexed by [`ClipId`].
    pub clips: Vec<ClipRegion>,
}

impl CompositeOutput {
    /// The clip region for `id`, if it has been finalized.
    pub fn clip_rect(&self, id: ClipId) -> Option<Rect> {
        self.clips.get(id.0).and_then(|clip| clip.rect)
    }
}

#[derive(Clone, Debug, Default)]
struct PendingDecorations {
    spans: SmallVec<[DecorationSpan; 4]>,
    offset: f64,
    thickness: f64,
}

impl PendingDecorations {
    fn push(&mut self, span: DecorationSpan) {
        if let Some(last) = self.spans.last_mut() {
            if last.selection == span.selection
                && last.color == span.color
                && (span.rect.x0 - last.rect.x1).abs() <= ABUT_TOLERANCE
            {
                last.rect.x1 = span.rect.x1;
                return;
            }
        }
        self.spans.push(span);
    }
}

/// Turns the sorted runs of one line into selection rectangles, clips and decorations.
///
/// Runs are pushed left to right. Consecutive runs with the same selection state share one
/// selection rectangle and one clip. Decorations of consecutive runs are collected and emitted
/// as a single span once a run without that decoration follows, using the thickest line seen.
#[derive(Clone, Debug)]
pub struct LineCompositor {
    line_top: f64,
    line_height: f64,
    line_ascent: f64,
    state: Option<SelectionState>,
    current_rect: Rect,
    clip: Option<ClipId>,
    decorations: Decorations,
    decoration_rect: Rect,
    last_color: Color,
    last_background: Option<Color>,
    last_decoration_color: Option<Color>,
    pending: [PendingDecorations; 3],
}

impl LineCompositor {
    /// Creates a compositor for `line` of a layout placed at `origin`.
    pub fn new(origin: Point, line: &LineInfo) -> Self {
        Self {
            line_top: origin.y + line.position.y,
            line_height: line.height,
            line_ascent: line.ascent,
            state: None,
            current_rect: Rect::ZERO,
            clip: None,
            decorations: Decorations::empty(),
            decoration_rect: Rect::ZERO,
            last_color: Color::TRANSPARENT,
            last_background: None,
            last_decoration_color: None,
            pending: core::array::from_fn(|_| PendingDecorations::default()),
        }
    }

    /// Adds the next run of the line.
    pub fn push(&mut self, mut run: IndexedRun, out: &mut CompositeOutput) {
        self.add_decoration_segment(Some(run.bounds.x0), out);

        match self.state {
            Some(state) if state == run.selection => {
                self.current_rect = self.current_rect.union(run.bounds);
            }
            previous => {
                if previous.is_some() {
                    self.end_selection_run(out);
                }
                self.state = Some(run.selection);
                self.current_rect = if run.bounds.is_zero_area() {
                    Rect::from_origin_size(run.bounds.origin(), Size::new(1.0, 1.0))
                } else {
                    run.bounds
                };
            }
        }

        if run.selection == SelectionState::Selected {
            let clip = *self.clip.get_or_insert_with(|| {
                out.clips.push(ClipRegion::default());
                ClipId(out.clips.len() - 1)
            });
            run.clip = Some(clip);
        }

        self.decoration_rect = run.bounds;
        for kind in DecorationKind::ALL {
            if !run.decorations.contains(kind.flag()) && !self.pending(kind).spans.is_empty() {
                self.flush(kind, out);
            }
        }
        if let Some(font) = run.glyphs().map(|glyphs| glyphs.font) {
            for kind in DecorationKind::ALL {
                let pending = &mut self.pending[kind_index(kind)];
                if run.decorations.contains(kind.flag()) && font.line_thickness > pending.thickness
                {
                    pending.thickness = font.line_thickness;
                    pending.offset = kind.offset(font.ascent, font.underline_position);
                }
            }
        }

        self.decorations = run.decorations;
        self.last_color = run.color;
        self.last_background = run.background;
        self.last_decoration_color = run.decoration_color;
        out.runs.push(run);
    }

    /// Completes the line, emitting everything still pending.
    pub fn finish(mut self, out: &mut CompositeOutput) {
        self.add_decoration_segment(None, out);
        if self.state.is_some() {
            self.end_selection_run(out);
        }
        for kind in DecorationKind::ALL {
            self.flush(kind, out);
        }
    }

    fn pending(&self, kind: DecorationKind) -> &PendingDecorations {
        &self.pending[kind_index(kind)]
    }

    /// Records the decorations of the previous run, extended up to the next run.
    fn add_decoration_segment(&mut self, next_left: Option<f64>, out: &mut CompositeOutput) {
        if self.decorations.is_empty() {
            return;
        }
        let mut rect = self.decoration_rect;
        rect.y0 = self.line_top;
        rect.y1 = self.line_top + self.line_height;
        if let Some(left) = next_left {
            rect.x1 = left;
        }
        let lines = Decorations::UNDERLINE | Decorations::OVERLINE | Decorations::STRIKE_OUT;
        let color = match self.last_decoration_color {
            Some(color) if self.decorations.intersects(lines) => color,
            _ => self.last_color,
        };
        let selection = self.state.unwrap_or_default();
        for kind in DecorationKind::ALL {
            if self.decorations.contains(kind.flag()) {
                self.pending[kind_index(kind)].push(DecorationSpan {
                    kind,
                    selection,
                    rect,
                    color,
                });
            }
        }
        if self.decorations.contains(Decorations::BACKGROUND) {
            let background = self.last_background.unwrap_or(Color::TRANSPARENT);
            out.backgrounds.push((rect, background));
        }
    }

    /// Closes the stretch of runs sharing the current selection state.
    fn end_selection_run(&mut self, out: &mut CompositeOutput) {
        let rect = Rect::new(
            self.current_rect.x0,
            self.line_top,
            self.current_rect.x1,
            self.line_top + self.line_height,
        );
        if self.state == Some(SelectionState::Selected) {
            out.selection_rects.push(rect);
        }
        if let Some(clip) = self.clip.take() {
            if let Some(region) = out.clips.get_mut(clip.0) {
                region.rect = Some(rect);
                region.rectangular = true;
            }
        }
    }

    fn flush(&mut self, kind: DecorationKind, out: &mut CompositeOutput) {
        let pending = &mut self.pending[kind_index(kind)];
        for span in pending.spans.drain(..) {
            let y = (span.rect.y0 + self.line_ascent + pending.offset).round();
            out.decorations.push(DecorationSpan {
                rect: Rect::new(span.rect.x0, y, span.rect.x1, y + pending.thickness),
                ..span
            });
        }
        pending.offset = 0.0;
        pending.thickness = 0.0;
    }
}

fn kind_index(kind: DecorationKind) -> usize {
    match kind {
        DecorationKind::Underline => 0,
        DecorationKind::Overline => 1,
        DecorationKind::StrikeOut => 2,
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::{CompositeOutput, LineCompositor};
    use crate::kurbo::{Point, Rect};
    use crate::node::{DecorationKind, Decorations, IndexedRun, RunContent, SelectionState};
    use crate::peniko::color::palette::css;
    use crate::{FontId, FontMetrics, Glyph, GlyphRun, LineInfo};

    fn line() -> LineInfo {
        LineInfo {
            index: 0,
            text_range: 0..12,
            position: Point::ZERO,
            width: 200.0,
            natural_width: 96.0,
            alignment_offset: 0.0,
            height: 16.0,
            ascent: 12.0,
            descent: 4.0,
        }
    }

    fn run(x0: f64, thickness: f64, decorations: Decorations, state: SelectionState) -> IndexedRun {
        let font = FontMetrics {
            id: FontId(1),
            size: 16.0,
            ascent: 12.0,
            descent: 4.0,
            line_thickness: thickness,
            underline_position: 2.0,
        };
        let bounds = Rect::new(x0, 0.0, x0 + 32.0, 16.0);
        IndexedRun {
            content: RunContent::Glyphs(GlyphRun {
                font,
                glyphs: vec![Glyph { id: 1, x: x0, y: 12.0 }],
                text_range: 0..4,
                bounds,
                underline: decorations.contains(Decorations::UNDERLINE),
                overline: false,
                strikeout: false,
                rtl: false,
            }),
            bounds,
            selection: state,
            clip: None,
            decorations,
            color: css::BLACK,
            background: None,
            decoration_color: None,
            position: Point::ZERO,
            ascent: 12.0,
            ranges: smallvec![0..4],
        }
    }

    #[test]
    fn underlines_merge_across_runs() {
        let mut out = CompositeOutput::default();
        let mut compositor = LineCompositor::new(Point::ZERO, &line());
        let unselected = SelectionState::Unselected;
        compositor.push(run(0.0, 1.0, Decorations::UNDERLINE, unselected), &mut out);
        compositor.push(run(32.0, 2.0, Decorations::UNDERLINE, unselected), &mut out);
        compositor.push(run(64.0, 1.0, Decorations::empty(), unselected), &mut out);
        compositor.finish(&mut out);

        assert_eq!(out.decorations.len(), 1);
        let span = &out.decorations[0];
        assert_eq!(span.kind, DecorationKind::Underline);
        assert_eq!(span.rect.x0, 0.0);
        assert_eq!(span.rect.x1, 64.0);
        assert_eq!(span.rect.height(), 2.0);
        assert_eq!(span.rect.y0, 14.0);
        assert!(out.selection_rects.is_empty());
        assert!(out.clips.is_empty());
    }

    #[test]
    fn selected_stretch_gets_rect_and_clip() {
        let mut out = CompositeOutput::default();
        let mut compositor = LineCompositor::new(Point::new(0.0, 10.0), &line());
        let none = Decorations::empty();
        compositor.push(run(0.0, 1.0, none, SelectionState::Unselected), &mut out);
        compositor.push(run(32.0, 1.0, none, SelectionState::Selected), &mut out);
        compositor.push(run(64.0, 1.0, none, SelectionState::Selected), &mut out);
        compositor.push(run(96.0, 1.0, none, SelectionState::Unselected), &mut out);
        compositor.finish(&mut out);

        assert_eq!(out.selection_rects, [Rect::new(32.0, 10.0, 96.0, 26.0)]);
        assert_eq!(out.clips.len(), 1);
        assert_eq!(out.clips[0].rect, Some(Rect::new(32.0, 10.0, 96.0, 26.0)));
        assert!(out.clips[0].rectangular);
        assert_eq!(out.runs[1].clip, out.runs[2].clip);
        assert!(out.runs[1].clip.is_some());
        assert!(out.runs[0].clip.is_none());
    }

    #[test]
    fn decoration_color_overrides_text_color() {
        let mut out = CompositeOutput::default();
        let mut compositor = LineCompositor::new(Point::ZERO, &line());
        let mut red = run(0.0, 1.0, Decorations::UNDERLINE, SelectionState::Unselected);
        red.decoration_color = Some(css::RED);
        compositor.push(red, &mut out);
        compositor.finish(&mut out);
        assert_eq!(out.decorations[0].color, css::RED);
        assert_eq!(out.decorations[0].rect.x1, 32.0);
    }

    #[test]
    fn backgrounds_follow_runs() {
        let mut out = CompositeOutput::default();
        let mut compositor = LineCompositor::new(Point::ZERO, &line());
        let mut highlighted = run(0.0, 1.0, Decorations::BACKGROUND, SelectionState::Unselected);
        highlighted.background = Some(css::YELLOW);
        compositor.push(highlighted, &mut out);
        compositor.push(run(40.0, 1.0, Decorations::empty(), SelectionState::Unselected), &mut out);
        compositor.finish(&mut out);
        assert_eq!(out.backgrounds, [(Rect::new(0.0, 0.0, 40.0, 16.0), css::YELLOW)]);
        assert!(out.decorations.is_empty());
    }
}
