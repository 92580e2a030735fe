// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font size search.

/// The font size search stops once the remaining interval is narrower than this.
pub const FONT_SIZE_TOLERANCE: f64 = 0.01;

/// Bisection over font sizes.
///
/// The search only decides which size to probe next. Laying the text out at that size and
/// judging whether it fits is left to the caller, which reports the outcome through
/// [`next`](Self::next).
///
/// The first probe is the requested size. Every probe halves the interval between the largest
/// size known to fit and the smallest size known not to, so the number of probes is bounded
/// by `log2((requested - minimum) / FONT_SIZE_TOLERANCE)` plus two.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontSizeSearch {
    low: f64,
    high: f64,
    current: f64,
}

impl FontSizeSearch {
    /// Creates a search over `[minimum, requested]`, starting at `requested`.
    ///
    /// A `minimum` larger than `requested` is clamped to it.
    pub fn new(minimum: f64, requested: f64) -> Self {
        Self {
            low: minimum.min(requested),
            high: requested,
            current: requested,
        }
    }

    /// The size that should be probed.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Returns `true` if the search interval is empty.
    pub fn is_degenerate(&self) -> bool {
        self.high - self.low < f64::EPSILON
    }

    /// Records whether the text fit at the current size, returning the next size to probe.
    ///
    /// Returns `None` once the search has converged. The last probed size is then the answer:
    /// either the largest fitting size found, or the minimum size if nothing fits.
    pub fn next(&mut self, fits: bool) -> Option<f64> {
        if fits {
            self.low = self.current;
            if self.high - self.low < FONT_SIZE_TOLERANCE {
                return None;
            }
        } else {
            self.high = self.current;
            if self.high - self.low < FONT_SIZE_TOLERANCE {
                if self.current > self.low {
                    // Settle on the largest size known to fit, or the minimum.
                    self.current = self.low;
                    return Some(self.current);
                }
                return None;
            }
        }
        self.current = (self.low + self.high) / 2.0;
        Some(self.current)
    }
}
