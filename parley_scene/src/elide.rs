// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Eliding lines that do not fit.

use crate::engine::char_before;
use crate::format::remap_formats;
use crate::{ElideMode, FormatRange, ParagraphEngine, ELLIPSIS};

/// The abbreviated rendition of the text that did not fit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElidedText {
    /// The abbreviated text, including the ellipsis.
    pub text: String,
    /// Formats re-mapped onto `text`.
    pub formats: Vec<FormatRange>,
    /// Byte offset in the laid out text where the elided line starts.
    pub start: usize,
    /// Byte offset in the laid out text where the text the elided line was produced from ends.
    pub end: usize,
}

/// Produces the abbreviated text of a line.
#[derive(Clone, Copy)]
pub struct Elider<'a> {
    layout: &'a dyn ParagraphEngine,
}

impl core::fmt::Debug for Elider<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Elider").finish_non_exhaustive()
    }
}

impl<'a> Elider<'a> {
    /// Creates an elider for lines of `layout`.
    pub fn new(layout: &'a dyn ParagraphEngine) -> Self {
        Self { layout }
    }

    /// Elides `line` so that it fits `width`.
    ///
    /// With a `next_line`, the text of both lines is handed to the engine so that the tail of
    /// the paragraph is pulled into the elided line. Without one, the last character of the
    /// line is replaced by an ellipsis, falling back to metrics based eliding when that would
    /// not fit. Text with formats is always elided through metrics.
    ///
    /// A line that ends the text and already fits is returned unchanged.
    pub fn elide_line(
        &self,
        mode: ElideMode,
        width: f64,
        line: usize,
        next_line: Option<usize>,
    ) -> String {
        let text = self.layout.text();
        let Some(info) = self.layout.line(line) else {
            return String::new();
        };
        if let Some(next) = next_line.and_then(|next| self.layout.line(next)) {
            return self
                .layout
                .elided_range(mode, width, info.text_range.start..next.text_end());
        }
        let slice = &text[info.text_range.clone()];
        if info.text_end() >= text.len() && info.natural_width <= width {
            return slice.to_owned();
        }
        if !self.layout.formats().is_empty() {
            return self.layout.elide_str(slice, mode, width);
        }
        let mut elided = String::with_capacity(slice.len() + ELLIPSIS.len_utf8());
        if let Some(last) = char_before(slice, slice.len()) {
            elided.push_str(&slice[..slice.len() - last.len_utf8()]);
        }
        elided.push(ELLIPSIS);
        if self.layout.advance(ELLIPSIS.encode_utf8(&mut [0; 4])) + info.natural_width >= width {
            elided = self.layout.elide_str(&elided, mode, width);
        }
        elided
    }

    /// Re-maps the formats of the layout onto `elided`.
    ///
    /// `start..end` is the range of the laid out text the elided text was produced from.
    pub fn elide_formats(
        &self,
        mode: ElideMode,
        elided: &str,
        start: usize,
        end: usize,
    ) -> Vec<FormatRange> {
        let formats = self.layout.formats();
        let mut out = Vec::new();
        if formats.is_empty() {
            return out;
        }
        let marker = ELLIPSIS.len_utf8();
        let kept = elided.len().saturating_sub(marker);
        match mode {
            ElideMode::None => {}
            ElideMode::Right => remap_formats(formats, start, kept, 0, elided, &mut out),
            ElideMode::Left => remap_formats(
                formats,
                end.saturating_sub(kept),
                kept,
                marker,
                elided,
                &mut out,
            ),
            ElideMode::Middle => {
                if let Some(index) = elided.find(ELLIPSIS) {
                    let tail = elided.len() - index - marker;
                    remap_formats(formats, start, index, 0, elided, &mut out);
                    remap_formats(
                        formats,
                        end.saturating_sub(tail),
                        tail,
                        index + marker,
                        elided,
                        &mut out,
                    );
                }
            }
        }
        out
    }
}
