// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic fixed-advance paragraph engine.

use core::ops::Range;

use unicode_linebreak::linebreaks;
use unicode_segmentation::UnicodeSegmentation;

use crate::fit::UNBOUNDED_LINE_WIDTH;
use crate::kurbo::{Point, Rect};
use crate::{
    ElideMode, FontId, FontMetrics, FormatRange, Glyph, GlyphRun, HorizontalAlignment, LineInfo,
    ParagraphEngine, WrapMode, ELLIPSIS, LINE_SEPARATOR,
};

/// Ratio of the advance of every character to the font size.
const ADVANCE_RATIO: f64 = 0.5;

#[derive(Clone, Debug)]
struct LineData {
    range: Range<usize>,
    position: Point,
    width: f64,
    natural_width: f64,
    alignment_offset: f64,
    font: FontMetrics,
}

/// A [`ParagraphEngine`] in which every character has the same advance.
///
/// Each character advances by half the font size, except [`LINE_SEPARATOR`] which has no
/// advance. Lines break at [UAX #14] opportunities (or at any character, depending on the
/// [`WrapMode`]), and the ascent and descent are three quarters and one quarter of the font
/// size. This makes layouts fully predictable, which is what headless measurement and tests
/// need.
///
/// [UAX #14]: https://www.unicode.org/reports/tr14/
#[derive(Clone, Debug)]
pub struct SimpleLayout {
    text: String,
    font_size: f64,
    wrap_mode: WrapMode,
    alignment: HorizontalAlignment,
    formats: Vec<FormatRange>,
    /// Byte offsets at which a line may end.
    breaks: Vec<usize>,
    lines: Vec<LineData>,
    next_start: usize,
}

impl Default for SimpleLayout {
    fn default() -> Self {
        Self::new(16.0)
    }
}

impl SimpleLayout {
    /// Creates an empty layout with the given font size.
    pub fn new(font_size: f64) -> Self {
        Self {
            text: String::new(),
            font_size,
            wrap_mode: WrapMode::NoWrap,
            alignment: HorizontalAlignment::Left,
            formats: Vec::new(),
            breaks: Vec::new(),
            lines: Vec::new(),
            next_start: 0,
        }
    }

    fn char_advance(&self, c: char) -> f64 {
        if c == LINE_SEPARATOR {
            0.0
        } else {
            self.font_size * ADVANCE_RATIO
        }
    }

    fn measure(&self, text: &str) -> f64 {
        text.chars().map(|c| self.char_advance(c)).sum()
    }

    /// Width of `range` without trailing whitespace.
    fn natural_width(&self, range: Range<usize>) -> f64 {
        self.measure(self.text[range].trim_end())
    }

    /// End of the hard line starting at `start`, including its separator.
    fn hard_end(&self, start: usize) -> usize {
        self.text[start..]
            .find(LINE_SEPARATOR)
            .map_or(self.text.len(), |i| start + i + LINE_SEPARATOR.len_utf8())
    }

    fn break_line(&self, start: usize, width: f64) -> usize {
        let hard_end = self.hard_end(start);
        if self.wrap_mode == WrapMode::NoWrap
            || width >= UNBOUNDED_LINE_WIDTH
            || self.natural_width(start..hard_end) <= width
        {
            return hard_end;
        }
        let fits = |end: usize| self.natural_width(start..end) <= width;
        let word_break = || {
            self.breaks
                .iter()
                .copied()
                .filter(|&b| b > start && b < hard_end)
                .take_while(|&b| fits(b))
                .last()
        };
        let char_break = || {
            let mut end = None;
            for (i, c) in self.text[start..hard_end].char_indices() {
                let candidate = start + i + c.len_utf8();
                if end.is_some() && !fits(candidate) {
                    break;
                }
                end = Some(candidate);
            }
            end.unwrap_or(hard_end)
        };
        match self.wrap_mode {
            WrapMode::NoWrap => hard_end,
            WrapMode::WrapAnywhere => char_break(),
            WrapMode::Wrap => word_break().unwrap_or_else(char_break),
            WrapMode::WordWrap => word_break().unwrap_or_else(|| {
                self.breaks
                    .iter()
                    .copied()
                    .find(|&b| b > start && b < hard_end)
                    .unwrap_or(hard_end)
            }),
        }
    }

    fn alignment_offset(&self, width: f64, natural_width: f64) -> f64 {
        if width >= UNBOUNDED_LINE_WIDTH {
            return 0.0;
        }
        match self.alignment {
            HorizontalAlignment::Left | HorizontalAlignment::Justify => 0.0,
            HorizontalAlignment::Right => width - natural_width,
            HorizontalAlignment::Center => (width - natural_width) / 2.0,
        }
    }

    fn metrics(&self) -> FontMetrics {
        let size = self.font_size;
        FontMetrics {
            id: FontId(size.to_bits()),
            size,
            ascent: size * 0.75,
            descent: size * 0.25,
            line_thickness: (size / 16.0).max(1.0),
            underline_position: size * 0.1,
        }
    }

    fn relayout_line(&mut self, index: usize, width: f64) {
        let Some(start) = self.lines.get(index).map(|line| line.range.start) else {
            return;
        };
        let end = self.break_line(start, width);
        let natural_width = self.natural_width(start..end);
        let alignment_offset = self.alignment_offset(width, natural_width);
        let line = &mut self.lines[index];
        line.range = start..end;
        line.width = width;
        line.natural_width = natural_width;
        line.alignment_offset = alignment_offset;
        if index + 1 == self.lines.len() {
            self.next_start = end;
        }
    }

    fn segment_run(&self, line: &LineData, range: Range<usize>) -> Option<GlyphRun> {
        let mut x = line.position.x
            + line.alignment_offset
            + self.measure(&self.text[line.range.start..range.start]);
        let x0 = x;
        let baseline = line.position.y + line.font.ascent;
        let mut glyphs = Vec::new();
        for c in self.text[range.clone()].chars() {
            if c == LINE_SEPARATOR {
                continue;
            }
            glyphs.push(Glyph {
                id: c as u32,
                x,
                y: baseline,
            });
            x += self.char_advance(c);
        }
        if glyphs.is_empty() {
            return None;
        }
        let mut run = GlyphRun {
            font: line.font,
            glyphs,
            text_range: range.clone(),
            bounds: Rect::new(
                x0,
                line.position.y,
                x,
                line.position.y + line.font.height(),
            ),
            underline: false,
            overline: false,
            strikeout: false,
            rtl: false,
        };
        for format in &self.formats {
            if format.range.start < range.end && format.range.end > range.start {
                run.underline |= format.format.underline;
                run.overline |= format.format.overline;
                run.strikeout |= format.format.strikeout;
            }
        }
        Some(run)
    }
}

impl ParagraphEngine for SimpleLayout {
    fn set_text(&mut self, text: &str) {
        text.clone_into(&mut self.text);
        // Mandatory breaks are also handled through `hard_end`.
        self.breaks = linebreaks(text).map(|(index, _)| index).collect();
        self.clear_layout();
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
    }

    fn font(&self) -> FontMetrics {
        self.metrics()
    }

    fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    fn set_alignment(&mut self, alignment: HorizontalAlignment) {
        self.alignment = alignment;
    }

    fn set_formats(&mut self, formats: &[FormatRange]) {
        self.formats = formats.to_vec();
    }

    fn formats(&self) -> &[FormatRange] {
        &self.formats
    }

    fn begin_layout(&mut self) {
        self.clear_layout();
    }

    fn create_line(&mut self) -> Option<usize> {
        let first_empty = self.text.is_empty() && self.lines.is_empty();
        if self.next_start >= self.text.len() && !first_empty {
            return None;
        }
        let index = self.lines.len();
        self.lines.push(LineData {
            range: self.next_start..self.next_start,
            position: Point::ZERO,
            width: UNBOUNDED_LINE_WIDTH,
            natural_width: 0.0,
            alignment_offset: 0.0,
            font: self.metrics(),
        });
        self.relayout_line(index, UNBOUNDED_LINE_WIDTH);
        Some(index)
    }

    fn set_line_width(&mut self, line: usize, width: f64) {
        if line + 1 == self.lines.len() {
            self.relayout_line(line, width);
        } else if let Some(data) = self.lines.get_mut(line) {
            // Only the most recent line can be re-broken.
            data.width = width;
        }
    }

    fn set_line_position(&mut self, line: usize, position: Point) {
        if let Some(data) = self.lines.get_mut(line) {
            data.position = position;
        }
    }

    fn end_layout(&mut self) {}

    fn clear_layout(&mut self) {
        self.lines.clear();
        self.next_start = 0;
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<LineInfo> {
        let line = self.lines.get(index)?;
        Some(LineInfo {
            index,
            text_range: line.range.clone(),
            position: line.position,
            width: line.width,
            natural_width: line.natural_width,
            alignment_offset: line.alignment_offset,
            height: line.font.height(),
            ascent: line.font.ascent,
            descent: line.font.descent,
        })
    }

    fn maximum_width(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| line.natural_width)
            .fold(0.0, f64::max)
    }

    fn glyph_runs(&self, line: usize, range: Range<usize>) -> Vec<GlyphRun> {
        let Some(data) = self.lines.get(line) else {
            return Vec::new();
        };
        let start = range.start.max(data.range.start);
        let end = range.end.min(data.range.end);
        if start >= end {
            return Vec::new();
        }
        let mut cuts = vec![start, end];
        for format in &self.formats {
            for cut in [format.range.start, format.range.end] {
                if cut > start && cut < end && self.text.is_char_boundary(cut) {
                    cuts.push(cut);
                }
            }
        }
        cuts.sort_unstable();
        cuts.dedup();
        cuts.windows(2)
            .filter_map(|w| self.segment_run(data, w[0]..w[1]))
            .collect()
    }

    fn cursor_to_x(&self, line: usize, index: usize, trailing: bool) -> f64 {
        let Some(data) = self.lines.get(line) else {
            return 0.0;
        };
        let index = index.clamp(data.range.start, data.range.end);
        let mut x = data.position.x
            + data.alignment_offset
            + self
                .text
                .get(data.range.start..index)
                .map_or(0.0, |s| self.measure(s));
        if trailing {
            if let Some(c) = self.text.get(index..).and_then(|s| s.chars().next()) {
                x += self.char_advance(c);
            }
        }
        x
    }

    fn advance(&self, text: &str) -> f64 {
        self.measure(text)
    }

    fn elide_str(&self, text: &str, mode: ElideMode, width: f64) -> String {
        if mode == ElideMode::None || self.measure(text) <= width {
            return text.to_owned();
        }
        let ellipsis = self.char_advance(ELLIPSIS);
        if ellipsis > width {
            return String::new();
        }
        let available = width - ellipsis;
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let mut head = 0;
        let mut tail = graphemes.len();
        let mut used = 0.0;
        match mode {
            ElideMode::None => {}
            ElideMode::Right => {
                while head < tail && used + self.measure(graphemes[head]) <= available {
                    used += self.measure(graphemes[head]);
                    head += 1;
                }
            }
            ElideMode::Left => {
                while tail > head && used + self.measure(graphemes[tail - 1]) <= available {
                    used += self.measure(graphemes[tail - 1]);
                    tail -= 1;
                }
            }
            ElideMode::Middle => loop {
                let mut grew = false;
                if head < tail && used + self.measure(graphemes[head]) <= available {
                    used += self.measure(graphemes[head]);
                    head += 1;
                    grew = true;
                }
                if tail > head && used + self.measure(graphemes[tail - 1]) <= available {
                    used += self.measure(graphemes[tail - 1]);
                    tail -= 1;
                    grew = true;
                }
                if !grew {
                    break;
                }
            },
        }
        let mut out = String::with_capacity(text.len());
        out.extend(graphemes[..head].iter().copied());
        out.push(ELLIPSIS);
        out.extend(graphemes[tail..].iter().copied());
        out
    }
}
