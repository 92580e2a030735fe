// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Error returned when a caller-supplied range does not fit the text it refers to.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the attempted range and the length of the text
/// at the time of the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    start: usize,
    end: usize,
    len: usize,
}

#[expect(
    clippy::len_without_is_empty,
    reason = "`Error::len` reports the text length at the time of failure, not a collection size."
)]
impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The start byte index of the offending range.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The end byte index of the offending range.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The length in bytes of the text at the time of the error.
    pub fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn invalid_bounds(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::InvalidBounds,
            start,
            end,
            len,
        }
    }

    pub(crate) fn invalid_range(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::InvalidRange,
            start,
            end,
            len,
        }
    }

    pub(crate) fn not_on_char_boundary(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::NotOnCharBoundary,
            start,
            end,
            len,
        }
    }

    pub(crate) fn unsorted_formats(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::UnsortedFormats,
            start,
            end,
            len,
        }
    }

    /// Checks that `start..end` is a valid, char-aligned range of `text`.
    pub(crate) fn check_range(text: &str, start: usize, end: usize) -> Result<(), Self> {
        let len = text.len();
        if start > end {
            return Err(Self::invalid_range(start, end, len));
        }
        if end > len {
            return Err(Self::invalid_bounds(start, end, len));
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(Self::not_on_char_boundary(start, end, len));
        }
        Ok(())
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::InvalidBounds => write!(
                f,
                "range {}..{} out of bounds for len {}",
                self.start, self.end, self.len
            ),
            ErrorKind::InvalidRange => {
                write!(f, "invalid range {}..{}: start > end", self.start, self.end)
            }
            ErrorKind::NotOnCharBoundary => write!(
                f,
                "range {}..{} not on UTF-8 boundary",
                self.start, self.end
            ),
            ErrorKind::UnsortedFormats => write!(
                f,
                "format range {}..{} is not sorted by start",
                self.start, self.end
            ),
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Range indices were out of bounds relative to the text length.
    InvalidBounds,

    /// The range had `start > end`.
    InvalidRange,

    /// Either `start` or `end` was not aligned to a UTF-8 character boundary.
    NotOnCharBoundary,

    /// Format ranges were not sorted by start.
    UnsortedFormats,
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn check_range_reports_kind() {
        let text = "h\u{e9}llo";
        assert!(Error::check_range(text, 0, 3).is_ok());
        assert_eq!(
            Error::check_range(text, 3, 1).unwrap_err().kind(),
            ErrorKind::InvalidRange
        );
        assert_eq!(
            Error::check_range(text, 0, 99).unwrap_err().kind(),
            ErrorKind::InvalidBounds
        );
        assert_eq!(
            Error::check_range(text, 2, 4).unwrap_err().kind(),
            ErrorKind::NotOnCharBoundary
        );
    }

    #[test]
    fn display_mentions_range() {
        let err = Error::invalid_bounds(2, 10, 4);
        assert_eq!(err.to_string(), "range 2..10 out of bounds for len 4");
        assert_eq!(err.len(), 4);
        let err = Error::unsorted_formats(1, 2, 6);
        assert_eq!(err.to_string(), "format range 1..2 is not sorted by start");
    }
}
