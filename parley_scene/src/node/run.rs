// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use smallvec::SmallVec;

use crate::kurbo::{Point, Rect};
use crate::peniko::Color;
use crate::{GlyphRun, ImageKey};

/// Whether a run is part of the selection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionState {
    /// Outside the selection.
    #[default]
    Unselected,
    /// Inside the selection.
    Selected,
}

bitflags::bitflags! {
    /// Decorations drawn for a run.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Decorations: u8 {
        /// A line below the baseline.
        const UNDERLINE = 1 << 0;
        /// A line above the ascent.
        const OVERLINE = 1 << 1;
        /// A line through the middle of the x-height.
        const STRIKE_OUT = 1 << 2;
        /// A filled background behind the run.
        const BACKGROUND = 1 << 3;
    }
}

/// Identifies a clip region produced while compositing lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub usize);

/// A clip that restricts selected glyphs to the selection rectangle of their line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipRegion {
    /// The clip rectangle, set once the selection run it covers has ended.
    pub rect: Option<Rect>,
    /// Whether the clip is an axis aligned rectangle.
    pub rectangular: bool,
}

/// What a run draws.
#[derive(Clone, Debug, PartialEq)]
pub enum RunContent {
    /// Glyphs of a single font.
    Glyphs(GlyphRun),
    /// An inline image.
    Image(ImageKey),
}

/// A glyph run or image, classified for compositing.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedRun {
    /// What the run draws.
    pub content: RunContent,
    /// Bounds in scene coordinates.
    pub bounds: Rect,
    /// Selection state of the run.
    pub selection: SelectionState,
    /// Clip assigned to selected runs.
    pub clip: Option<ClipId>,
    /// Decorations of the run.
    pub decorations: Decorations,
    /// Text color.
    pub color: Color,
    /// Background color, if [`Decorations::BACKGROUND`] is set.
    pub background: Option<Color>,
    /// Color of line decorations, if it differs from `color`.
    pub decoration_color: Option<Color>,
    /// Origin of the layout the run was taken from, in scene coordinates.
    ///
    /// Glyph positions are relative to this point.
    pub position: Point,
    /// Ascent of the run's font.
    pub ascent: f64,
    /// Ranges of the source text covered by the run.
    ///
    /// A run covers one range until runs are merged.
    pub ranges: SmallVec<[Range<usize>; 1]>,
}

impl IndexedRun {
    /// The glyph run, if this run draws glyphs.
    pub fn glyphs(&self) -> Option<&GlyphRun> {
        match &self.content {
            RunContent::Glyphs(run) => Some(run),
            RunContent::Image(_) => None,
        }
    }

    /// The image, if this run draws one.
    pub fn image(&self) -> Option<&ImageKey> {
        match &self.content {
            RunContent::Image(key) => Some(key),
            RunContent::Glyphs(_) => None,
        }
    }

    /// Returns `true` if the run draws nothing.
    pub fn is_empty(&self) -> bool {
        self.glyphs().is_some_and(GlyphRun::is_empty)
    }

    /// Total number of source bytes covered by the run.
    pub(crate) fn covered_len(&self) -> usize {
        self.ranges.iter().map(|range| range.len()).sum()
    }
}

/// Which line decoration a span draws.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    /// Underline.
    Underline,
    /// Overline.
    Overline,
    /// Strike-out.
    StrikeOut,
}

impl DecorationKind {
    pub(crate) const ALL: [Self; 3] = [Self::Underline, Self::Overline, Self::StrikeOut];

    pub(crate) fn flag(self) -> Decorations {
        match self {
            Self::Underline => Decorations::UNDERLINE,
            Self::Overline => Decorations::OVERLINE,
            Self::StrikeOut => Decorations::STRIKE_OUT,
        }
    }

    /// Vertical offset of the decoration from the baseline, for a font with `ascent`.
    pub(crate) fn offset(self, ascent: f64, underline_position: f64) -> f64 {
        match self {
            Self::Underline => underline_position,
            Self::Overline => -ascent,
            Self::StrikeOut => ascent / -3.0,
        }
    }
}

/// A horizontal decoration line.
#[derive(Clone, Debug, PartialEq)]
pub struct DecorationSpan {
    /// Which decoration this is.
    pub kind: DecorationKind,
    /// Selection state of the runs the span was built from.
    pub selection: SelectionState,
    /// The filled rectangle of the line.
    pub rect: Rect,
    /// Color of the line.
    pub color: Color,
}
