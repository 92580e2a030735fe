// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{FormatRange, LINE_SEPARATOR, MULTILENGTH_SEPARATOR};

/// The source text of a layout, split into progressively shorter alternatives.
///
/// Fragments are separated by [`MULTILENGTH_SEPARATOR`]. Newlines are converted to
/// [`LINE_SEPARATOR`] so that the paragraph engine treats them as hard breaks.
#[derive(Clone, Debug)]
pub(crate) struct MultiLengthText<'a> {
    source: &'a str,
    /// Byte offset in `source` of the fragment in use.
    start: usize,
    /// Byte offset in `source` of the separator ending the fragment in use.
    end: Option<usize>,
}

impl<'a> MultiLengthText<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            start: 0,
            end: source.find(MULTILENGTH_SEPARATOR),
        }
    }

    /// Returns `true` if a shorter alternative follows the fragment in use.
    pub(crate) fn has_shorter(&self) -> bool {
        self.end.is_some()
    }

    /// Returns `true` if the fragment in use is not the first one.
    pub(crate) fn is_abbreviated(&self) -> bool {
        self.start != 0
    }

    /// Switches to the next shorter alternative, returning `false` if there is none.
    pub(crate) fn advance(&mut self) -> bool {
        let Some(end) = self.end else {
            return false;
        };
        self.start = end + MULTILENGTH_SEPARATOR.len_utf8();
        self.end = self.source[self.start..]
            .find(MULTILENGTH_SEPARATOR)
            .map(|i| self.start + i);
        true
    }

    /// The fragment in use, with newlines converted.
    pub(crate) fn layout_text(&self) -> String {
        let end = self.end.unwrap_or(self.source.len());
        self.source[self.start..end].replace('\n', LINE_SEPARATOR.encode_utf8(&mut [0; 4]))
    }

    /// Formats of the source text, mapped onto the first fragment's layout text.
    pub(crate) fn layout_formats(&self, formats: &[FormatRange]) -> Vec<FormatRange> {
        formats
            .iter()
            .map(|format| {
                let start = layout_offset(self.source, format.range.start);
                let end = layout_offset(self.source, format.range.end);
                FormatRange::new(start..end, format.format)
            })
            .collect()
    }
}

/// Maps a byte offset in `source` to the text handed to the paragraph engine.
///
/// Every newline before `index` grows into a [`LINE_SEPARATOR`].
pub(crate) fn layout_offset(source: &str, index: usize) -> usize {
    let newlines = source
        .get(..index)
        .map_or(0, |prefix| prefix.bytes().filter(|&b| b == b'\n').count());
    index + newlines * (LINE_SEPARATOR.len_utf8() - 1)
}

#[cfg(test)]
mod tests {
    use super::{layout_offset, MultiLengthText};
    use crate::{CharFormat, FormatRange};

    #[test]
    fn walks_fragments() {
        let mut text = MultiLengthText::new("Long text\u{9c}Short\u{9c}S");
        assert!(text.has_shorter());
        assert_eq!(text.layout_text(), "Long text");
        assert!(text.advance());
        assert_eq!(text.layout_text(), "Short");
        assert!(text.is_abbreviated());
        assert!(text.advance());
        assert_eq!(text.layout_text(), "S");
        assert!(!text.has_shorter());
        assert!(!text.advance());
    }

    #[test]
    fn converts_newlines() {
        let text = MultiLengthText::new("a\nb");
        assert!(!text.has_shorter());
        assert_eq!(text.layout_text(), "a\u{2028}b");
    }

    #[test]
    fn offsets_account_for_separators() {
        let source = "ab\ncd";
        assert_eq!(layout_offset(source, 2), 2);
        assert_eq!(layout_offset(source, 3), 5);
        assert_eq!(layout_offset(source, 5), 7);

        let text = MultiLengthText::new(source);
        let formats = [FormatRange::new(3..5, CharFormat::default().with_underline())];
        let mapped = text.layout_formats(&formats);
        assert_eq!(mapped[0].range, 5..7);
        assert_eq!(&text.layout_text()[5..7], "cd");
    }
}
