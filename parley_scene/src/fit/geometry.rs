// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::kurbo::Point;
use crate::ParagraphEngine;

/// Width passed to the paragraph engine for lines that should not wrap.
pub const UNBOUNDED_LINE_WIDTH: f64 = i32::MAX as f64;

/// A handle to a line while it is being laid out.
///
/// Handed to [`LayoutObserver::line_laid_out`](crate::LayoutObserver::line_laid_out) for every
/// line, so that the observer can override the width, height and position the fitter would
/// otherwise assign. Changing the width re-breaks the line.
pub struct LineGeometry<'a> {
    layout: &'a mut dyn ParagraphEngine,
    line: usize,
    offset: usize,
    full_len: usize,
    height: Option<f64>,
}

impl core::fmt::Debug for LineGeometry<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LineGeometry")
            .field("line", &self.line)
            .field("offset", &self.offset)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl<'a> LineGeometry<'a> {
    pub(crate) fn new(
        layout: &'a mut dyn ParagraphEngine,
        line: usize,
        offset: usize,
        full_len: usize,
    ) -> Self {
        Self {
            layout,
            line,
            offset,
            full_len,
            height: None,
        }
    }

    fn position(&self) -> Point {
        self.layout
            .line(self.line)
            .map_or(Point::ZERO, |line| line.position)
    }

    fn natural_height(&self) -> f64 {
        self.layout.line(self.line).map_or(0.0, |line| line.height)
    }

    /// The number of the line within the whole text.
    pub fn number(&self) -> usize {
        self.line + self.offset
    }

    /// The width of the line content.
    pub fn implicit_width(&self) -> f64 {
        self.layout
            .line(self.line)
            .map_or(0.0, |line| line.natural_width)
    }

    /// Returns `true` if this line ends the text and its content fits its width.
    pub fn is_last(&self) -> bool {
        self.layout.line(self.line).is_some_and(|line| {
            line.text_end() == self.full_len && line.width >= line.natural_width
        })
    }

    /// The width the line is broken at.
    pub fn width(&self) -> f64 {
        self.layout.line(self.line).map_or(0.0, |line| line.width)
    }

    /// Breaks the line at `width`.
    pub fn set_width(&mut self, width: f64) {
        self.layout.set_line_width(self.line, width);
    }

    /// The height the line occupies.
    pub fn height(&self) -> f64 {
        self.height.unwrap_or_else(|| self.natural_height())
    }

    /// Sets the height the line occupies.
    ///
    /// The line is moved so that its content stays at the bottom of the new height.
    pub fn set_height(&mut self, height: f64) {
        let position = self.position();
        let y = position.y - self.natural_height() + height;
        self.layout
            .set_line_position(self.line, Point::new(position.x, y));
        self.height = Some(height);
    }

    /// The horizontal position of the line.
    pub fn x(&self) -> f64 {
        self.position().x
    }

    /// Moves the line horizontally.
    pub fn set_x(&mut self, x: f64) {
        let y = self.position().y;
        self.layout.set_line_position(self.line, Point::new(x, y));
    }

    /// The vertical position of the line.
    pub fn y(&self) -> f64 {
        self.position().y
    }

    /// Moves the line vertically.
    pub fn set_y(&mut self, y: f64) {
        let x = self.position().x;
        self.layout.set_line_position(self.line, Point::new(x, y));
    }
}
