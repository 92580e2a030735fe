// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout constraints.

use crate::kurbo::Insets;

/// How text is wrapped when it does not fit the available width.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Lines are only broken at explicit line separators.
    #[default]
    NoWrap,
    /// Lines are broken at word boundaries; a word longer than the line overflows it.
    WordWrap,
    /// Lines are broken at any character.
    WrapAnywhere,
    /// Lines are broken at word boundaries if possible, otherwise at any character.
    Wrap,
}

/// Where the ellipsis is placed when text does not fit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElideMode {
    /// Text is never elided.
    #[default]
    None,
    /// The beginning of the text is elided.
    Left,
    /// The end of the text is elided.
    Right,
    /// The middle of the text is elided.
    Middle,
}

/// Whether the font size is scaled to fit the available space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontSizeMode {
    /// The requested font size is used as is.
    #[default]
    Fixed,
    /// The largest size that fits the available width is used.
    HorizontalFit,
    /// The largest size that fits the available height is used.
    VerticalFit,
    /// The largest size that fits both dimensions is used.
    Fit,
}

impl FontSizeMode {
    /// Returns `true` if the size is fitted to the width.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::HorizontalFit | Self::Fit)
    }

    /// Returns `true` if the size is fitted to the height.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::VerticalFit | Self::Fit)
    }
}

/// How [`LayoutConstraints::line_height`] is interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineHeightMode {
    /// The line height is a multiplier of the font line height.
    #[default]
    Proportional,
    /// The line height is an absolute height in pixels.
    Fixed,
}

/// Horizontal alignment of lines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    /// Align lines to the left edge.
    #[default]
    Left,
    /// Align lines to the right edge.
    Right,
    /// Center lines.
    Center,
    /// Justify lines; positioned like [`HorizontalAlignment::Left`].
    Justify,
}

/// Vertical alignment of the text block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    /// Align text to the top edge.
    #[default]
    Top,
    /// Align text to the bottom edge.
    Bottom,
    /// Center text vertically.
    Center,
}

/// Everything the fitter needs to know about the box text is laid out in.
///
/// `width` and `height` are the explicit size of the element. When either is `None` the
/// corresponding dimension follows the implicit size derived from the content.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConstraints {
    /// Explicit width of the element, including padding.
    pub width: Option<f64>,
    /// Explicit height of the element, including padding.
    pub height: Option<f64>,
    /// Space between the element edges and the text.
    pub padding: Insets,
    /// How lines are wrapped.
    pub wrap_mode: WrapMode,
    /// Where text that does not fit is elided.
    pub elide_mode: ElideMode,
    /// The maximum number of lines, if limited.
    pub maximum_line_count: Option<usize>,
    /// Whether the font size is fitted to the available space.
    pub font_size_mode: FontSizeMode,
    /// The requested font size.
    pub font_size: f64,
    /// The smallest size font fitting may scale down to.
    pub minimum_font_size: f64,
    /// The line height, see [`LineHeightMode`].
    pub line_height: f64,
    /// How `line_height` is interpreted.
    pub line_height_mode: LineHeightMode,
    /// Horizontal alignment of lines.
    pub horizontal_alignment: HorizontalAlignment,
    /// Vertical alignment of the text block.
    pub vertical_alignment: VerticalAlignment,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            padding: Insets::ZERO,
            wrap_mode: WrapMode::NoWrap,
            elide_mode: ElideMode::None,
            maximum_line_count: None,
            font_size_mode: FontSizeMode::Fixed,
            font_size: 16.0,
            minimum_font_size: 12.0,
            line_height: 1.0,
            line_height_mode: LineHeightMode::Proportional,
            horizontal_alignment: HorizontalAlignment::Left,
            vertical_alignment: VerticalAlignment::Top,
        }
    }
}

impl LayoutConstraints {
    /// Sets the explicit width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the explicit height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets the padding.
    pub fn with_padding(mut self, padding: impl Into<Insets>) -> Self {
        self.padding = padding.into();
        self
    }

    /// Sets the wrap mode.
    pub fn with_wrap_mode(mut self, mode: WrapMode) -> Self {
        self.wrap_mode = mode;
        self
    }

    /// Sets the elide mode.
    pub fn with_elide_mode(mut self, mode: ElideMode) -> Self {
        self.elide_mode = mode;
        self
    }

    /// Limits the number of lines.
    pub fn with_maximum_line_count(mut self, count: usize) -> Self {
        self.maximum_line_count = Some(count);
        self
    }

    /// Sets the font size fitting mode.
    pub fn with_font_size_mode(mut self, mode: FontSizeMode) -> Self {
        self.font_size_mode = mode;
        self
    }

    /// Sets the requested font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Sets the smallest size font fitting may scale down to.
    pub fn with_minimum_font_size(mut self, size: f64) -> Self {
        self.minimum_font_size = size;
        self
    }

    /// Sets the line height and how it is interpreted.
    pub fn with_line_height(mut self, line_height: f64, mode: LineHeightMode) -> Self {
        self.line_height = line_height;
        self.line_height_mode = mode;
        self
    }

    /// Sets the horizontal alignment.
    pub fn with_horizontal_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.horizontal_alignment = alignment;
        self
    }

    /// Sets the vertical alignment.
    pub fn with_vertical_alignment(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    /// Whether an explicit width was given.
    pub fn width_valid(&self) -> bool {
        self.width.is_some()
    }

    /// Whether an explicit height was given.
    pub fn height_valid(&self) -> bool {
        self.height.is_some()
    }

    /// The width available to text, given the implicit width used when no width is set.
    pub fn available_width(&self, implicit_width: f64) -> f64 {
        self.width.unwrap_or(implicit_width) - self.padding.x0 - self.padding.x1
    }

    /// The height available to text, given the implicit height used when no height is set.
    pub fn available_height(&self, implicit_height: f64) -> f64 {
        self.height.unwrap_or(implicit_height) - self.padding.y0 - self.padding.y1
    }

    /// Horizontal padding.
    pub fn horizontal_padding(&self) -> f64 {
        self.padding.x0 + self.padding.x1
    }

    /// Vertical padding.
    pub fn vertical_padding(&self) -> f64 {
        self.padding.y0 + self.padding.y1
    }

    /// Whether single line eliding applies.
    pub fn single_line_elide(&self) -> bool {
        self.elide_mode != ElideMode::None && self.width_valid()
    }

    /// Whether multi-line eliding applies.
    ///
    /// Only right eliding is supported across lines, and only when the number of lines is
    /// bounded by a height or a maximum line count.
    pub fn multi_line_elide(&self) -> bool {
        self.elide_mode == ElideMode::Right
            && self.width_valid()
            && (self.height_valid() || self.maximum_line_count.is_some())
    }

    /// Whether lines can wrap.
    pub fn can_wrap(&self) -> bool {
        self.wrap_mode != WrapMode::NoWrap && self.width_valid()
    }

    /// Whether the font size is fitted to the width.
    pub fn horizontal_fit(&self) -> bool {
        self.font_size_mode.is_horizontal() && self.width_valid()
    }

    /// Whether the font size is fitted to the height.
    pub fn vertical_fit(&self) -> bool {
        self.font_size_mode.is_vertical()
            && (self.height_valid() || (self.maximum_line_count.is_some() && self.can_wrap()))
    }

    /// The height of one line set in a font of `font_height`.
    pub fn line_advance(&self, font_height: f64) -> f64 {
        match self.line_height_mode {
            LineHeightMode::Fixed => self.line_height,
            LineHeightMode::Proportional => font_height * self.line_height,
        }
    }

    /// Vertical offset introduced by a line height that differs from the font line height.
    pub fn line_height_offset(&self, font_height: f64) -> f64 {
        let font_height = font_height.ceil();
        match self.line_height_mode {
            LineHeightMode::Fixed => font_height - self.line_height,
            LineHeightMode::Proportional => (1.0 - self.line_height) * font_height,
        }
    }
}
