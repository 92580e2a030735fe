// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parley Scene turns laid out paragraphs into a small set of draw primitives for a retained
//! scene graph, and decides how text has to be wrapped, elided and font-scaled to fit a box in
//! the first place.
//!
//! The crate has two halves:
//!
//! - [`LineFitter`] drives a [`ParagraphEngine`] under width, height, line count and font size
//!   constraints until wrapping, eliding and font scaling converge.
//! - [`TextNodeEngine`] consumes the resulting lines as glyph runs, classifies them against a
//!   selection and per-range formats, merges decorations across neighbouring runs and batches
//!   glyphs that share a font, clip and color into as few draw calls as possible.
//!
//! [`TextElement`] ties both halves together behind a small state machine that tracks whether
//! a layout or a node sync is pending.
//!
//! The paragraph engine itself is a collaborator: anything that can break lines and produce
//! glyph runs can implement [`ParagraphEngine`]. [`SimpleLayout`] is a deterministic fixed-advance
//! implementation that is used for headless measurement and throughout the tests.
//!
//! ## Example
//!
//! ```
//! use parley_scene::{ElideMode, LayoutConstraints, SceneRecorder, SimpleLayout, TextElement};
//!
//! let mut element = TextElement::new(SimpleLayout::default());
//! element.set_text("Hello world");
//! element.set_constraints(
//!     LayoutConstraints::default()
//!         .with_width(48.0)
//!         .with_elide_mode(ElideMode::Right),
//! );
//! let result = element.request_layout();
//! assert!(result.truncated);
//!
//! let mut scene = SceneRecorder::default();
//! assert!(element.sync_scene_nodes(&mut scene));
//! assert!(!element.sync_scene_nodes(&mut scene));
//! ```
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use peniko;
pub use peniko::kurbo;

mod constraints;
mod element;
mod elide;
mod engine;
mod error;
mod format;
mod image;
mod simple;

pub mod fit;
pub mod node;

pub use constraints::{
    ElideMode, FontSizeMode, HorizontalAlignment, LayoutConstraints, LineHeightMode,
    VerticalAlignment, WrapMode,
};
pub use element::{aligned_x, aligned_y, TextElement, UpdateState, MAX_LAYOUT_BOUNCES};
pub use elide::{ElidedText, Elider};
pub use engine::{FontId, FontMetrics, Glyph, GlyphRun, LineInfo, ParagraphEngine};
pub use error::{Error, ErrorKind};
pub use fit::{FitRequest, FitResult, LayoutObserver, LineFitter, LineGeometry};
pub use format::{CharFormat, FormatRange, FormatRanges};
pub use image::{
    ImageAlignment, ImageError, ImageKey, ImageProvider, ImageStatus, InlineImage,
    PLACEHOLDER_IMAGE_SIZE,
};
pub use node::{
    GlyphStyle, NodeColors, Primitive, SceneRecorder, SceneSink, SelectionState, TextNodeEngine,
};
pub use simple::SimpleLayout;

/// The ellipsis character appended to elided text.
pub const ELLIPSIS: char = '\u{2026}';

/// Separates alternative, progressively shorter renditions of the same text.
///
/// When a source string contains this character, the fitter tries each fragment in turn before
/// falling back to eliding characters of the last one.
pub const MULTILENGTH_SEPARATOR: char = '\u{9c}';

/// The character newlines are converted to before handing text to a [`ParagraphEngine`].
pub const LINE_SEPARATOR: char = '\u{2028}';
