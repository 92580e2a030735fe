// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paragraph engine seam.

use core::ops::Range;

use crate::kurbo::{Point, Rect};
use crate::{ElideMode, FormatRange, HorizontalAlignment, WrapMode, LINE_SEPARATOR};

/// Identity of a shaped font at a particular size.
///
/// Glyph runs are only batched together when they share a `FontId`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u64);

/// Metrics of a shaped font.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontMetrics {
    /// Identity of the font.
    pub id: FontId,
    /// Font size in pixels per em.
    pub size: f64,
    /// Distance from the baseline to the top of the line.
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the line.
    pub descent: f64,
    /// Thickness of underline, overline and strikeout decorations.
    pub line_thickness: f64,
    /// Offset of the underline from the baseline, positive downwards.
    pub underline_position: f64,
}

impl FontMetrics {
    /// The height of a line set in this font.
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// A positioned glyph.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Glyph {
    /// The font-specific glyph identifier.
    pub id: u32,
    /// X position of the glyph origin, relative to the layout origin.
    pub x: f64,
    /// Y position of the glyph baseline, relative to the layout origin.
    pub y: f64,
}

/// A shaped sequence of glyphs covering a contiguous range of source text.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    /// The font all glyphs in this run are set in.
    pub font: FontMetrics,
    /// The glyphs, in visual order.
    pub glyphs: Vec<Glyph>,
    /// Byte range of the source text covered by this run.
    pub text_range: Range<usize>,
    /// Bounding box of the run, relative to the layout origin.
    pub bounds: Rect,
    /// Whether the run is underlined.
    pub underline: bool,
    /// Whether the run is overlined.
    pub overline: bool,
    /// Whether the run is struck out.
    pub strikeout: bool,
    /// Whether the run is set right-to-left.
    pub rtl: bool,
}

impl GlyphRun {
    /// Returns `true` if the run contains no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Geometry of a single laid out line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineInfo {
    /// The index of the line within its layout.
    pub index: usize,
    /// Byte range of the source text on this line, including trailing whitespace and separators.
    pub text_range: Range<usize>,
    /// Position of the top-left corner of the line.
    pub position: Point,
    /// The width the line was broken at.
    pub width: f64,
    /// The width of the line content, excluding trailing whitespace.
    pub natural_width: f64,
    /// Horizontal offset of the content inside the line caused by alignment.
    pub alignment_offset: f64,
    /// Height of the line.
    pub height: f64,
    /// Ascent of the tallest font on the line.
    pub ascent: f64,
    /// Descent of the tallest font on the line.
    pub descent: f64,
}

impl LineInfo {
    /// The end of the text range of this line.
    pub fn text_end(&self) -> usize {
        self.text_range.end
    }

    /// The rectangle covered by the line content.
    pub fn natural_rect(&self) -> Rect {
        let x = self.position.x + self.alignment_offset;
        Rect::new(
            x,
            self.position.y,
            x + self.natural_width,
            self.position.y + self.height,
        )
    }

    /// The advance of the line content.
    pub fn horizontal_advance(&self) -> f64 {
        self.natural_width
    }
}

/// A paragraph layout engine.
///
/// The model follows a stateful line breaker: [`begin_layout`](Self::begin_layout) discards
/// previously created lines, each [`create_line`](Self::create_line) starts a new line directly
/// after the previous one, and [`set_line_width`](Self::set_line_width) breaks the most recently
/// created line at a width. Only the most recently created line may be re-broken.
///
/// Text ranges are byte ranges into [`text`](Self::text).
pub trait ParagraphEngine {
    /// Replaces the text and discards all lines.
    fn set_text(&mut self, text: &str);

    /// The text being laid out.
    fn text(&self) -> &str;

    /// Sets the font size used for subsequent lines.
    fn set_font_size(&mut self, size: f64);

    /// Metrics of the current font.
    fn font(&self) -> FontMetrics;

    /// Sets the wrap mode used when breaking lines.
    fn set_wrap_mode(&mut self, mode: WrapMode);

    /// The wrap mode used when breaking lines.
    fn wrap_mode(&self) -> WrapMode;

    /// Sets how line content is aligned inside the line width.
    fn set_alignment(&mut self, alignment: HorizontalAlignment);

    /// Sets the per-range formats applied to glyph runs.
    fn set_formats(&mut self, formats: &[FormatRange]);

    /// The per-range formats applied to glyph runs.
    fn formats(&self) -> &[FormatRange];

    /// Starts a new layout pass, discarding all lines.
    fn begin_layout(&mut self);

    /// Creates the next line, returning its index, or `None` once all text has been consumed.
    ///
    /// A new line is laid out with an unbounded width until
    /// [`set_line_width`](Self::set_line_width) is called.
    fn create_line(&mut self) -> Option<usize>;

    /// Breaks the line at `width`.
    fn set_line_width(&mut self, line: usize, width: f64);

    /// Moves the line to `position`.
    fn set_line_position(&mut self, line: usize, position: Point);

    /// Finishes the layout pass.
    fn end_layout(&mut self);

    /// Discards all lines.
    fn clear_layout(&mut self);

    /// The number of lines created in the current pass.
    fn line_count(&self) -> usize;

    /// Geometry of the line at `index`.
    fn line(&self, index: usize) -> Option<LineInfo>;

    /// The widest natural width of all lines.
    fn maximum_width(&self) -> f64;

    /// Glyph runs of `line` that cover `range`, split at format and font boundaries.
    fn glyph_runs(&self, line: usize, range: Range<usize>) -> Vec<GlyphRun>;

    /// The horizontal position of the caret at `index` on `line`.
    ///
    /// `trailing` selects the trailing edge of the character at `index`.
    fn cursor_to_x(&self, line: usize, index: usize, trailing: bool) -> f64;

    /// The advance of `text` in the current font.
    fn advance(&self, text: &str) -> f64;

    /// Abbreviates `text` with an ellipsis so it fits `width` using font metrics.
    fn elide_str(&self, text: &str, mode: ElideMode, width: f64) -> String;

    /// Abbreviates the text in `range`, which may span several lines, so it fits `width`.
    fn elided_range(&self, mode: ElideMode, width: f64, range: Range<usize>) -> String {
        let text = self.text();
        let end = range.end.min(text.len());
        let start = range.start.min(end);
        let slice: String = text[start..end]
            .chars()
            .map(|c| if c == LINE_SEPARATOR { ' ' } else { c })
            .collect();
        self.elide_str(&slice, mode, width)
    }

    /// Drops any font caches populated while producing glyph runs.
    ///
    /// Called once the primitives built from this layout have been handed off.
    fn invalidate_font_caches(&mut self) {}
}

/// Returns the character that ends directly before `index`.
pub(crate) fn char_before(text: &str, index: usize) -> Option<char> {
    text.get(..index)?.chars().next_back()
}
