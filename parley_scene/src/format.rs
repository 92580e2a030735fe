// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-range character formats.

use core::ops::Range;

use peniko::Color;

use crate::Error;

/// Character level formatting applied to a range of text.
///
/// Unset colors fall back to the colors of the node engine.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CharFormat {
    /// Text color.
    pub foreground: Option<Color>,
    /// Background fill behind the text.
    pub background: Option<Color>,
    /// Color of underline, overline and strikeout decorations.
    pub underline_color: Option<Color>,
    /// Whether the text is a hyperlink.
    pub anchor: bool,
    /// Whether the text is underlined.
    pub underline: bool,
    /// Whether the text is overlined.
    pub overline: bool,
    /// Whether the text is struck out.
    pub strikeout: bool,
}

impl CharFormat {
    /// Sets the text color.
    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    /// Sets the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Sets the decoration color.
    pub fn with_underline_color(mut self, color: Color) -> Self {
        self.underline_color = Some(color);
        self
    }

    /// Marks the text as a hyperlink.
    pub fn with_anchor(mut self) -> Self {
        self.anchor = true;
        self
    }

    /// Underlines the text.
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Overlines the text.
    pub fn with_overline(mut self) -> Self {
        self.overline = true;
        self
    }

    /// Strikes out the text.
    pub fn with_strikeout(mut self) -> Self {
        self.strikeout = true;
        self
    }

    /// Returns this format with the properties set in `other` applied on top.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            foreground: other.foreground.or(self.foreground),
            background: other.background.or(self.background),
            underline_color: other.underline_color.or(self.underline_color),
            anchor: self.anchor || other.anchor,
            underline: self.underline || other.underline,
            overline: self.overline || other.overline,
            strikeout: self.strikeout || other.strikeout,
        }
    }

    /// Whether this format changes the colors glyphs are drawn with.
    pub fn affects_color(&self) -> bool {
        self.foreground.is_some()
            || self.background.is_some()
            || self.underline_color.is_some()
            || self.anchor
    }
}

/// A format applied to a byte range of text.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatRange {
    /// The byte range the format applies to.
    pub range: Range<usize>,
    /// The format.
    pub format: CharFormat,
}

impl FormatRange {
    /// Creates a new format range.
    pub fn new(range: Range<usize>, format: CharFormat) -> Self {
        Self { range, format }
    }
}

/// Format ranges that have been validated against a text.
///
/// Ranges are sorted by start and lie on character boundaries. They may overlap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatRanges {
    ranges: Vec<FormatRange>,
}

impl FormatRanges {
    /// Validates `ranges` against `text`.
    ///
    /// Returns an error if a range is inverted, out of bounds, not on a character boundary, or
    /// starts before the range preceding it.
    pub fn new(
        text: &str,
        ranges: impl IntoIterator<Item = FormatRange>,
    ) -> Result<Self, Error> {
        let ranges: Vec<FormatRange> = ranges.into_iter().collect();
        let mut previous_start = 0;
        for format in &ranges {
            let Range { start, end } = format.range;
            Error::check_range(text, start, end)?;
            if start < previous_start {
                return Err(Error::unsorted_formats(start, end, text.len()));
            }
            previous_start = start;
        }
        Ok(Self { ranges })
    }

    /// The validated ranges.
    pub fn as_slice(&self) -> &[FormatRange] {
        &self.ranges
    }

    /// Returns `true` if there are no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}

/// Collects the formats that change glyph colors, merging overlapping ones.
///
/// Where a format starts inside the previous one, the overlap takes the previous format with
/// the new one applied on top, so the result never contains two ranges covering the same text
/// twice in a row.
pub(crate) fn color_changes(formats: &[FormatRange]) -> Vec<FormatRange> {
    let mut merged: Vec<FormatRange> = Vec::new();
    for additional in formats.iter().filter(|f| f.format.affects_color()) {
        let mut additional = additional.clone();
        if let Some(last) = merged.last_mut() {
            if additional.range.start < last.range.end {
                let last_format = last.format;
                let last_end = last.range.end;
                let overlap_end = additional.range.end.min(last_end);
                let combined = last_format.merge(&additional.format);
                if additional.range.start > last.range.start {
                    last.range.end = additional.range.start;
                    merged.push(FormatRange::new(
                        additional.range.start..overlap_end,
                        combined,
                    ));
                } else {
                    last.format = combined;
                    last.range.end = overlap_end;
                }
                if last_end > overlap_end {
                    merged.push(FormatRange::new(overlap_end..last_end, last_format));
                }
                additional.range.start = overlap_end.max(additional.range.start);
            }
        }
        if additional.range.end > additional.range.start {
            merged.push(additional);
        }
    }
    merged
}

/// Re-maps `formats` onto a substring.
///
/// Formats overlapping `start..start + len` are clipped to it and shifted so that `start` lands
/// on `offset`. Ranges are then clamped to character boundaries of `text`.
pub(crate) fn remap_formats(
    formats: &[FormatRange],
    start: usize,
    len: usize,
    offset: usize,
    text: &str,
    out: &mut Vec<FormatRange>,
) {
    let end = start + len;
    for format in formats {
        let overlap_start = format.range.start.max(start);
        let overlap_end = format.range.end.min(end);
        if overlap_end <= overlap_start {
            continue;
        }
        let new_start = floor_char_boundary(text, offset + (overlap_start - start));
        let new_end = floor_char_boundary(text, offset + (overlap_end - start));
        if new_end > new_start {
            out.push(FormatRange::new(new_start..new_end, format.format));
        }
    }
}

pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use peniko::color::palette::css;

    use super::{color_changes, remap_formats, CharFormat, FormatRange, FormatRanges};
    use crate::ErrorKind;

    fn fg(range: core::ops::Range<usize>, color: peniko::Color) -> FormatRange {
        FormatRange::new(range, CharFormat::default().with_foreground(color))
    }

    #[test]
    fn unsorted_ranges_are_rejected() {
        let err = FormatRanges::new("abcdef", [fg(3..4, css::RED), fg(1..2, css::BLUE)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsortedFormats);
    }

    #[test]
    fn overlapping_ranges_are_accepted() {
        let formats = FormatRanges::new("abcdef", [fg(0..4, css::RED), fg(2..6, css::BLUE)]);
        assert_eq!(formats.map(|formats| formats.len()), Ok(2));
    }

    #[test]
    fn formats_without_colors_are_ignored() {
        let formats = [
            FormatRange::new(0..2, CharFormat::default().with_underline()),
            fg(2..4, css::RED),
        ];
        assert_eq!(color_changes(&formats), vec![fg(2..4, css::RED)]);
    }

    #[test]
    fn overlapping_colors_are_split() {
        let background = FormatRange::new(2..6, CharFormat::default().with_background(css::BLUE));
        let merged = color_changes(&[fg(0..4, css::RED), background]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], fg(0..2, css::RED));
        assert_eq!(merged[1].range, 2..4);
        assert_eq!(merged[1].format.foreground, Some(css::RED));
        assert_eq!(merged[1].format.background, Some(css::BLUE));
        assert_eq!(merged[2].range, 4..6);
        assert_eq!(merged[2].format.foreground, None);
    }

    #[test]
    fn contained_format_keeps_tail() {
        let merged = color_changes(&[fg(0..10, css::RED), fg(0..4, css::BLUE)]);
        assert_eq!(merged, vec![fg(0..4, css::BLUE), fg(4..10, css::RED)]);
    }

    #[test]
    fn remap_shifts_and_clips() {
        let mut out = Vec::new();
        remap_formats(
            &[fg(0..3, css::RED), fg(5..9, css::BLUE)],
            4,
            4,
            3,
            "\u{2026}fghi",
            &mut out,
        );
        assert_eq!(out, vec![fg(4..7, css::BLUE)]);
    }
}
