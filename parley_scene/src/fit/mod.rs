// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fitting text into a constrained box.

mod geometry;
mod search;
mod source;

use crate::elide::{ElidedText, Elider};
use crate::engine::char_before;
use crate::image::{ImageAlignment, ImageProvider, InlineImage};
use crate::kurbo::{Point, Rect, Size};
use crate::{
    ElideMode, FontSizeMode, FormatRange, HorizontalAlignment, LayoutConstraints, LineHeightMode,
    LineInfo, ParagraphEngine, WrapMode, LINE_SEPARATOR,
};

pub use geometry::{LineGeometry, UNBOUNDED_LINE_WIDTH};
pub use search::{FontSizeSearch, FONT_SIZE_TOLERANCE};

pub(crate) use source::layout_offset;
use source::MultiLengthText;

/// The maximum number of extra layout passes run to react to the implicit size feedback.
///
/// One pass re-breaks lines once the width is known, and one more re-runs the layout once the
/// height is known. Font size probes and shorter text alternatives come on top of these.
pub const MAX_CORRECTIVE_PASSES: usize = 2;

/// Receives notifications while text is being fitted.
///
/// All methods have empty default implementations. The unit type implements this trait for
/// callers that do not care.
pub trait LayoutObserver {
    /// Called when the implicit size of the text changes.
    ///
    /// The observer may react by changing `constraints`, for example by binding the width to
    /// the implicit width. The fitter picks the new constraints up in its corrective passes.
    fn implicit_size_changed(&mut self, size: Size, constraints: &mut LayoutConstraints) {
        let _ = (size, constraints);
    }

    /// Whether [`line_laid_out`](Self::line_laid_out) should be called for every line.
    ///
    /// Inline images are not placed when this returns `true`.
    fn wants_line_geometry(&self) -> bool {
        false
    }

    /// Called for every line, with the geometry the fitter would assign already applied.
    fn line_laid_out(&mut self, line: &mut LineGeometry<'_>) {
        let _ = line;
    }

    /// Called when the text becomes truncated or stops being truncated.
    fn truncated_changed(&mut self, truncated: bool) {
        let _ = truncated;
    }

    /// Called when the number of visible lines changes.
    fn line_count_changed(&mut self, count: usize) {
        let _ = count;
    }
}

impl LayoutObserver for () {}

/// The text and collaborators for one call to [`LineFitter::fit`].
///
/// Byte offsets of formats and images refer to `text`.
pub struct FitRequest<'a> {
    /// The source text, possibly holding shorter alternatives.
    pub text: &'a str,
    /// Character formats, sorted by start. Ignored for text with shorter alternatives.
    pub formats: &'a [FormatRange],
    /// Inline images. Their placement is written back during layout.
    pub images: &'a mut [InlineImage],
    /// Loads inline images.
    pub provider: &'a mut dyn ImageProvider,
    /// Receives layout notifications.
    pub observer: &'a mut dyn LayoutObserver,
}

impl core::fmt::Debug for FitRequest<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FitRequest")
            .field("text", &self.text)
            .field("formats", &self.formats)
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

impl<'a> FitRequest<'a> {
    /// Creates a request for plain `text`.
    pub fn new(
        text: &'a str,
        provider: &'a mut dyn ImageProvider,
        observer: &'a mut dyn LayoutObserver,
    ) -> Self {
        Self {
            text,
            formats: &[],
            images: &mut [],
            provider,
            observer,
        }
    }

    /// Sets the character formats.
    pub fn with_formats(mut self, formats: &'a [FormatRange]) -> Self {
        self.formats = formats;
        self
    }

    /// Sets the inline images.
    pub fn with_images(mut self, images: &'a mut [InlineImage]) -> Self {
        self.images = images;
        self
    }
}

/// The outcome of [`LineFitter::fit`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitResult {
    /// The visible lines in order. If the text was elided, the last entry is the elided line.
    pub lines: Vec<LineInfo>,
    /// The elided line, if any.
    pub elided: Option<ElidedText>,
    /// The rectangle covered by the visible lines, with its top at zero.
    pub bounds: Rect,
    /// The natural size of the text including padding.
    pub implicit_size: Size,
    /// Number of visible lines, including the elided line.
    pub line_count: usize,
    /// Whether any content was dropped by eliding, line count limits or shorter alternatives.
    pub truncated: bool,
    /// Whether the content was wider than the available width at some point.
    pub width_exceeded: bool,
    /// Whether the content was taller than the available height at some point.
    pub height_exceeded: bool,
    /// The font size the text was finally laid out with.
    pub font_size: f64,
    /// Distance from the top of the text to the baseline of the first line.
    pub baseline: f64,
    /// Horizontal advance of the last line, and vertical distance between first and last line.
    pub advance: Size,
    /// The width lines were broken at.
    pub line_width: f64,
    /// Indices of the inline images placed on visible lines.
    pub visible_images: Vec<usize>,
    /// Whether an inline image changed size during layout.
    pub needs_relayout: bool,
    /// How many corrective passes were run.
    pub corrective_passes: usize,
}

impl FitResult {
    /// Number of visible lines taken from the main layout, excluding the elided line.
    pub fn unelided_line_count(&self) -> usize {
        if self.elided.is_some() {
            self.line_count.saturating_sub(1)
        } else {
            self.line_count
        }
    }
}

/// Lays text out under a set of [`LayoutConstraints`].
///
/// The fitter repeatedly breaks the text into lines with a [`ParagraphEngine`] until the result
/// is stable: the natural size is known, lines are broken at the available width, the number of
/// lines respects the maximum line count and height, lines that do not fit are elided, and the
/// font size is the largest one that fits when font scaling is enabled.
///
/// A second engine of the same type holds the elided line, so that the main layout keeps the
/// untouched lines.
#[derive(Clone, Debug)]
pub struct LineFitter<E> {
    layout: E,
    elide_layout: Option<E>,
    source: String,
    last_constraints: Option<LayoutConstraints>,
    implicit_size: Size,
    implicit_valid: bool,
    truncated: bool,
    line_count: usize,
}

impl<E: ParagraphEngine + Default> Default for LineFitter<E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// The first pass, which also establishes the implicit size.
    First,
    /// The pass after the line width was corrected.
    WidthCorrected,
    Settled,
}

#[derive(Clone, Copy, Debug)]
struct PassParams {
    line_width: f64,
    max_height: f64,
    max_line_count: usize,
    single_line_elide: bool,
    multi_line_elide: bool,
    no_break_last_line: bool,
    has_shorter: bool,
    custom: bool,
}

/// State gathered by one pass over the lines.
#[derive(Clone, Debug, Default)]
struct Pass {
    visible_count: usize,
    last_line: Option<usize>,
    unwrapped_line_count: usize,
    wrapped: bool,
    truncated: bool,
    truncate_height: bool,
    elide: bool,
    width_exceeded: bool,
    height_exceeded: bool,
    natural_height: f64,
    height: f64,
    bounds: Option<Rect>,
    unelided: Option<Rect>,
    elided: Option<ElidedText>,
}

struct LineContext<'r> {
    source: &'r str,
    images: &'r mut [InlineImage],
    provider: &'r mut dyn ImageProvider,
    observer: &'r mut dyn LayoutObserver,
    place_images: bool,
    /// Image index and the line it was placed on.
    visible_images: Vec<(usize, usize)>,
    needs_relayout: bool,
}

impl LineContext<'_> {
    /// Breaks `line` at `line_width` and stacks it below `height`, making room for images.
    fn set_line_geometry(
        &mut self,
        layout: &mut dyn ParagraphEngine,
        constraints: &LayoutConstraints,
        line: usize,
        line_width: f64,
        height: &mut f64,
    ) {
        layout.set_line_width(line, line_width);
        let Some(info) = layout.line(line) else {
            return;
        };
        let source = self.source;
        let ends_text = info.text_end() >= layout.text().len();
        let on_line: Vec<usize> = if self.place_images {
            self.images
                .iter()
                .enumerate()
                .filter(|(_, image)| {
                    let position = layout_offset(source, image.position);
                    // Images at the very end belong to the last line.
                    info.text_range.contains(&position)
                        || (ends_text && position == info.text_end())
                })
                .map(|(index, _)| index)
                .collect()
        } else {
            Vec::new()
        };
        if on_line.is_empty() {
            layout.set_line_position(line, Point::new(info.position.x, *height));
            *height += constraints.line_advance(info.height);
            return;
        }

        let text_height = info.height;
        let mut text_top: f64 = 0.0;
        for &index in &on_line {
            let image = &mut self.images[index];
            self.needs_relayout |= image.ensure_requested(&mut *self.provider);
            let image_height = image.layout_size().height;
            image.pos.y = match image.alignment {
                ImageAlignment::Top => 0.0,
                ImageAlignment::Middle => text_height / 2.0 - image_height / 2.0,
                ImageAlignment::Bottom => text_height - image_height,
            };
            // Images reaching above the line push the text down.
            text_top = text_top.max(-image.pos.y);
        }

        let mut total_height = text_height;
        for &index in &on_line {
            let image = &mut self.images[index];
            let size = image.layout_size();
            total_height = total_height.max(text_top + image.pos.y + size.height);
            let position = layout_offset(source, image.position);
            let leading = layout.cursor_to_x(line, position, false);
            let trailing = layout.cursor_to_x(line, position, true);
            image.pos.x = if trailing < leading {
                leading - image.offset - size.width
            } else {
                leading + image.offset
            };
            image.pos.y += *height + text_top;
            self.visible_images.push((index, line));
        }

        layout.set_line_position(line, Point::new(info.position.x, *height + text_top));
        *height += match constraints.line_height_mode {
            LineHeightMode::Fixed => constraints.line_height,
            LineHeightMode::Proportional => total_height * constraints.line_height,
        };
    }

    /// Assigns default geometry to `line` and lets the observer adjust it.
    fn custom_line_geometry(
        &mut self,
        layout: &mut dyn ParagraphEngine,
        constraints: &LayoutConstraints,
        line: usize,
        height: &mut f64,
        offset: usize,
    ) {
        let full_len = layout.text().len();
        let width = if constraints.width_valid()
            && (constraints.wrap_mode != WrapMode::NoWrap
                || constraints.horizontal_alignment != HorizontalAlignment::Left)
        {
            constraints.available_width(0.0)
        } else {
            UNBOUNDED_LINE_WIDTH
        };
        let mut geometry = LineGeometry::new(layout, line, offset, full_len);
        geometry.set_y(*height);
        geometry.set_width(width);
        if constraints.line_height != 1.0 {
            let natural = geometry.height();
            geometry.set_height(constraints.line_advance(natural));
        }
        self.observer.line_laid_out(&mut geometry);
        *height += geometry.height();
    }
}

impl<E: ParagraphEngine + Default> LineFitter<E> {
    /// Creates a fitter that lays text out with `layout`.
    pub fn new(layout: E) -> Self {
        Self {
            layout,
            elide_layout: None,
            source: String::new(),
            last_constraints: None,
            implicit_size: Size::ZERO,
            implicit_valid: false,
            truncated: false,
            line_count: 0,
        }
    }

    /// The layout holding the unelided lines.
    pub fn layout(&self) -> &E {
        &self.layout
    }

    /// The layout holding the elided line, if the text was elided.
    pub fn elide_layout(&self) -> Option<&E> {
        self.elide_layout.as_ref()
    }

    /// The last computed implicit size.
    pub fn implicit_size(&self) -> Size {
        self.implicit_size
    }

    /// Forces the next fit to recompute the implicit size.
    ///
    /// Changes of the text or of constraints other than the width and height are detected
    /// automatically. This is for changes the fitter cannot see, such as new fonts.
    pub fn invalidate(&mut self) {
        self.implicit_valid = false;
    }

    /// Releases cached font data of both layouts.
    pub fn invalidate_font_caches(&mut self) {
        self.layout.invalidate_font_caches();
        if let Some(layout) = &mut self.elide_layout {
            layout.invalidate_font_caches();
        }
    }

    /// Lays `request.text` out under `constraints`.
    ///
    /// `constraints` is mutable because the observer may change it in reaction to implicit size
    /// changes.
    pub fn fit(
        &mut self,
        constraints: &mut LayoutConstraints,
        request: FitRequest<'_>,
    ) -> FitResult {
        let FitRequest {
            text,
            formats,
            images,
            provider,
            observer,
        } = request;

        let sizeless = LayoutConstraints {
            width: None,
            height: None,
            ..constraints.clone()
        };
        if self.source != text || self.last_constraints.as_ref() != Some(&sizeless) {
            text.clone_into(&mut self.source);
            self.last_constraints = Some(sizeless);
            self.implicit_valid = false;
        }

        let mut cx = LineContext {
            source: text,
            images,
            provider,
            observer,
            place_images: true,
            visible_images: Vec::new(),
            needs_relayout: false,
        };
        let custom = cx.observer.wants_line_geometry();
        if custom {
            cx.place_images = false;
        }

        self.layout.set_font_size(constraints.font_size);
        let font = self.layout.font();

        if text.is_empty() && !custom && constraints.font_size_mode == FontSizeMode::Fixed {
            return self.fit_empty(constraints, &mut cx);
        }

        let mut single_line_elide = constraints.single_line_elide();
        let mut multi_line_elide = constraints.multi_line_elide();
        let available_width = constraints.available_width(self.implicit_size.width);
        let available_height = constraints.available_height(self.implicit_size.height);
        // Eliding needs an explicit width, so no implicit size is involved here.
        if (single_line_elide && available_width <= 0.0)
            || (multi_line_elide && constraints.height_valid() && available_height <= 0.0)
        {
            log::debug!("no room for text, collapsing the layout");
            self.layout.clear_layout();
            self.elide_layout = None;
            let height = constraints.line_advance(font.height().ceil());
            self.update_state(true, 0, cx.observer);
            return FitResult {
                bounds: Rect::new(0.0, 0.0, 0.0, height),
                implicit_size: self.implicit_size,
                truncated: true,
                width_exceeded: single_line_elide && available_width <= 0.0,
                height_exceeded: multi_line_elide && available_height <= 0.0,
                font_size: constraints.font_size,
                baseline: font.ascent,
                line_width: available_width,
                ..FitResult::default()
            };
        }

        let mut multi_length = MultiLengthText::new(text);
        let layout_formats = if multi_length.has_shorter() {
            Vec::new()
        } else {
            multi_length.layout_formats(formats)
        };
        self.layout.set_text(&multi_length.layout_text());
        self.layout.set_formats(&layout_formats);
        self.layout.set_wrap_mode(constraints.wrap_mode);
        self.layout.set_alignment(constraints.horizontal_alignment);

        let element_width = constraints
            .width
            .or(self.implicit_valid.then_some(self.implicit_size.width));
        let mut line_width = match element_width {
            Some(width) if width > 0.0 => available_width,
            _ => UNBOUNDED_LINE_WIDTH,
        };
        let mut max_height = if constraints.height_valid() {
            available_height
        } else {
            f64::INFINITY
        };
        let max_line_count = constraints.maximum_line_count.map_or(usize::MAX, |n| n.max(1));
        let mut can_wrap = constraints.can_wrap();
        let mut horizontal_fit = constraints.horizontal_fit();
        let mut vertical_fit = constraints.vertical_fit();
        let no_break_last_line = multi_line_elide
            && matches!(constraints.wrap_mode, WrapMode::Wrap | WrapMode::WordWrap);

        let requested = constraints.font_size;
        let minimum = if constraints.font_size_mode == FontSizeMode::Fixed {
            requested
        } else {
            constraints.minimum_font_size
        };
        let mut search = FontSizeSearch::new(minimum, requested);

        let mut width_exceeded =
            available_width <= 0.0 && (single_line_elide || can_wrap || horizontal_fit);
        let mut height_exceeded = available_height <= 0.0 && (multi_line_elide || vertical_fit);
        let mut phase = Phase::First;
        let mut corrective_passes = 0;
        let mut advance;

        let mut pass = loop {
            self.layout.set_font_size(search.current());
            let params = PassParams {
                line_width,
                max_height,
                max_line_count,
                single_line_elide,
                multi_line_elide,
                no_break_last_line,
                has_shorter: multi_length.has_shorter(),
                custom,
            };
            cx.place_images = !custom && !multi_length.is_abbreviated();
            let mut pass = self.lay_out_lines(constraints, &params, &mut cx);
            width_exceeded |= pass.width_exceeded || pass.wrapped;
            height_exceeded |= pass.height_exceeded;

            match phase {
                Phase::First => {
                    phase = Phase::Settled;
                    self.complete_implicit_lines(constraints, &mut cx, &mut pass, &params);
                    self.layout.end_layout();

                    let natural_width = self.layout.maximum_width();
                    let offset = constraints.line_height_offset(self.layout.font().height());
                    let implicit = Size::new(
                        natural_width + constraints.horizontal_padding(),
                        pass.natural_height + offset.max(0.0) + constraints.vertical_padding(),
                    );
                    self.set_implicit_size(implicit, constraints, cx.observer);

                    single_line_elide = constraints.single_line_elide();
                    multi_line_elide = constraints.multi_line_elide();
                    can_wrap = constraints.can_wrap();
                    horizontal_fit = constraints.horizontal_fit();
                    vertical_fit = constraints.vertical_fit();

                    let old_width = line_width;
                    let old_height = max_height;
                    line_width = if constraints.width.is_some_and(|width| width > 0.0) {
                        constraints.available_width(self.implicit_size.width)
                    } else {
                        natural_width
                    };
                    max_height = if constraints.height_valid() {
                        constraints.available_height(self.implicit_size.height)
                    } else {
                        f64::INFINITY
                    };

                    if (!fuzzy_eq(line_width, old_width)
                        || (width_exceeded && line_width > old_width))
                        && (single_line_elide
                            || multi_line_elide
                            || can_wrap
                            || horizontal_fit
                            || constraints.horizontal_alignment != HorizontalAlignment::Left)
                    {
                        log::trace!("line width changed from {old_width} to {line_width}");
                        phase = Phase::WidthCorrected;
                        corrective_passes += 1;
                        width_exceeded = line_width >= old_width.min(natural_width);
                        height_exceeded = false;
                        continue;
                    }
                    if (max_height < old_height.min(pass.natural_height)
                        || (height_exceeded && max_height > old_height))
                        && (multi_line_elide
                            || (can_wrap && constraints.maximum_line_count.is_some()))
                    {
                        log::trace!("maximum height changed from {old_height} to {max_height}");
                        corrective_passes += 1;
                        width_exceeded = false;
                        height_exceeded = false;
                        continue;
                    }
                    if !constraints.width_valid()
                        && !self.implicit_valid
                        && pass.unwrapped_line_count > 1
                        && constraints.horizontal_alignment != HorizontalAlignment::Left
                    {
                        // Alignment needs the widest line, which is only known now.
                        corrective_passes += 1;
                        width_exceeded = false;
                        height_exceeded = false;
                        continue;
                    }
                }
                Phase::WidthCorrected => {
                    phase = Phase::Settled;
                    if pass.last_line.is_some() {
                        while self.layout.line_count() < max_line_count {
                            let Some(line) = self.layout.create_line() else {
                                break;
                            };
                            cx.set_line_geometry(
                                &mut self.layout,
                                constraints,
                                line,
                                line_width,
                                &mut pass.natural_height,
                            );
                        }
                    }
                    self.layout.end_layout();

                    let offset = constraints.line_height_offset(self.layout.font().height());
                    let implicit = Size::new(
                        self.implicit_size.width,
                        pass.natural_height + offset.max(0.0) + constraints.vertical_padding(),
                    );
                    self.set_implicit_size(implicit, constraints, cx.observer);

                    multi_line_elide = constraints.multi_line_elide();
                    vertical_fit = constraints.vertical_fit();
                    let old_height = max_height;
                    max_height = if constraints.height_valid() {
                        constraints.available_height(self.implicit_size.height)
                    } else {
                        f64::INFINITY
                    };
                    if (max_height < old_height.min(pass.natural_height)
                        || (height_exceeded && max_height > old_height))
                        && (multi_line_elide
                            || (can_wrap && constraints.maximum_line_count.is_some()))
                    {
                        log::trace!("maximum height changed from {old_height} to {max_height}");
                        corrective_passes += 1;
                        width_exceeded = false;
                        height_exceeded = false;
                        continue;
                    }
                }
                Phase::Settled => self.layout.end_layout(),
            }

            if pass.elide && multi_length.advance() {
                log::debug!("text does not fit, trying a shorter alternative");
                self.layout.set_text(&multi_length.layout_text());
                self.layout.set_formats(&[]);
                continue;
            }

            let last = self.layout.line_count().checked_sub(1);
            advance = match (
                self.layout.line(0),
                last.and_then(|index| self.layout.line(index)),
            ) {
                (Some(first), Some(last)) => Size::new(
                    last.horizontal_advance(),
                    last.position.y - first.position.y,
                ),
                _ => Size::ZERO,
            };

            if !horizontal_fit && !vertical_fit {
                break pass;
            }
            if search.is_degenerate() {
                break pass;
            }
            let unelided = pass.unelided.unwrap_or(Rect::ZERO);
            let too_wide = horizontal_fit
                && (unelided.width() > line_width || (!vertical_fit && pass.wrapped));
            let too_tall =
                vertical_fit && (pass.truncate_height || unelided.height() > max_height);
            width_exceeded |= too_wide;
            height_exceeded |= too_tall;
            match search.next(!too_wide && !too_tall) {
                Some(size) => log::trace!("probing font size {size}"),
                None => break pass,
            }
        };
        debug_assert!(
            corrective_passes <= MAX_CORRECTIVE_PASSES,
            "corrective passes are bounded"
        );

        if multi_length.is_abbreviated() {
            pass.truncated = true;
        }

        let mut bounds = pass.bounds;
        let mut height = pass.height;
        if let Some(elided) = &pass.elided {
            let mut elide_layout = self.elide_layout.take().unwrap_or_default();
            elide_layout.set_font_size(search.current());
            elide_layout.set_wrap_mode(constraints.wrap_mode);
            elide_layout.set_alignment(constraints.horizontal_alignment);
            elide_layout.set_text(&elided.text);
            elide_layout.set_formats(&elided.formats);
            elide_layout.begin_layout();
            if let Some(line) = elide_layout.create_line() {
                elide_layout.set_line_position(line, Point::new(0.0, height));
                cx.place_images = false;
                if custom {
                    let offset = pass.visible_count.saturating_sub(1);
                    cx.custom_line_geometry(
                        &mut elide_layout,
                        constraints,
                        line,
                        &mut height,
                        offset,
                    );
                } else {
                    cx.set_line_geometry(
                        &mut elide_layout,
                        constraints,
                        line,
                        line_width,
                        &mut height,
                    );
                }
                if let Some(info) = elide_layout.line(line) {
                    bounds = Some(union(bounds, info.natural_rect()));
                }
            }
            elide_layout.end_layout();
            if pass.visible_count == 1 {
                self.layout.clear_layout();
            }
            self.elide_layout = Some(elide_layout);
        } else {
            self.elide_layout = None;
        }

        let bounds = bounds.unwrap_or(Rect::ZERO);
        let bounds_height = if custom { bounds.height() } else { height };
        let bounds = Rect::new(bounds.x0, 0.0, bounds.x1, bounds_height);

        let unelided_count = if self.elide_layout.is_some() {
            pass.visible_count.saturating_sub(1)
        } else {
            pass.visible_count
        };
        let mut lines: Vec<LineInfo> = (0..unelided_count)
            .filter_map(|i| self.layout.line(i))
            .collect();
        if let Some(line) = self.elide_layout.as_ref().and_then(|layout| layout.line(0)) {
            lines.push(line);
        }
        let baseline = lines
            .first()
            .map_or(font.ascent, |line| line.position.y + line.ascent);

        let mut visible_images: Vec<usize> = cx
            .visible_images
            .iter()
            .filter(|(_, line)| *line < unelided_count)
            .map(|(index, _)| *index)
            .collect();
        visible_images.dedup();

        self.implicit_valid = true;
        self.update_state(pass.truncated, pass.visible_count, cx.observer);

        FitResult {
            lines,
            elided: pass.elided,
            bounds,
            implicit_size: self.implicit_size,
            line_count: pass.visible_count,
            truncated: pass.truncated,
            width_exceeded,
            height_exceeded,
            font_size: search.current(),
            baseline,
            advance,
            line_width,
            visible_images,
            needs_relayout: cx.needs_relayout,
            corrective_passes,
        }
    }

    /// Empty text occupies one line of the font height and no width.
    fn fit_empty(
        &mut self,
        constraints: &mut LayoutConstraints,
        cx: &mut LineContext<'_>,
    ) -> FitResult {
        self.layout.set_text("");
        self.elide_layout = None;
        let font = self.layout.font();
        let height = constraints.line_advance(font.height().ceil());
        let implicit = Size::new(
            constraints.horizontal_padding(),
            height + constraints.vertical_padding(),
        );
        self.set_implicit_size(implicit, constraints, cx.observer);
        self.implicit_valid = true;
        self.update_state(false, 1, cx.observer);
        FitResult {
            bounds: Rect::new(0.0, 0.0, 0.0, height),
            implicit_size: self.implicit_size,
            line_count: 1,
            font_size: constraints.font_size,
            baseline: font.ascent,
            line_width: constraints.available_width(self.implicit_size.width),
            ..FitResult::default()
        }
    }

    /// Breaks the text into lines once, stopping at the first line that does not fit.
    fn lay_out_lines(
        &mut self,
        constraints: &LayoutConstraints,
        params: &PassParams,
        cx: &mut LineContext<'_>,
    ) -> Pass {
        let layout = &mut self.layout;
        cx.visible_images.clear();
        layout.begin_layout();
        let text_len = layout.text().len();
        let mut pass = Pass {
            unwrapped_line_count: 1,
            ..Pass::default()
        };
        let mut natural_height = 0.0;
        let mut previous_height = 0.0;
        let mut visible_count = 1;
        loop {
            let Some(line) = layout.create_line() else {
                visible_count -= 1;
                break;
            };
            pass.last_line = Some(line);

            let last_allowed = params.no_break_last_line && visible_count == params.max_line_count;
            if last_allowed {
                // Fill the last line completely before it is elided.
                layout.set_wrap_mode(WrapMode::WrapAnywhere);
            }
            if params.custom {
                cx.custom_line_geometry(&mut *layout, constraints, line, &mut natural_height, 0);
            } else {
                cx.set_line_geometry(
                    &mut *layout,
                    constraints,
                    line,
                    params.line_width,
                    &mut natural_height,
                );
            }
            if last_allowed {
                layout.set_wrap_mode(constraints.wrap_mode);
            }

            let Some(info) = layout.line(line) else {
                break;
            };
            let unelided = union(pass.bounds, info.natural_rect());
            pass.unelided = Some(unelided);

            if params.multi_line_elide && natural_height > params.max_height && visible_count > 1
            {
                pass.elide = true;
                pass.height_exceeded = true;
                if params.has_shorter {
                    break;
                }
                pass.truncated = true;
                pass.truncate_height = true;
                visible_count -= 1;
                let previous = visible_count - 1;
                let ends_paragraph =
                    char_before(layout.text(), info.text_range.start) == Some(LINE_SEPARATOR);
                let next = (!ends_paragraph).then_some(line);
                pass.elided = Some(elide_line(&*layout, info.width, previous, next));
                pass.height = previous_height;
                break;
            }

            if info.text_end() >= text_len {
                if params.single_line_elide
                    && visible_count == 1
                    && info.natural_width > info.width
                {
                    pass.elide = true;
                    pass.width_exceeded = true;
                    if params.has_shorter {
                        break;
                    }
                    pass.truncated = true;
                    let mode = constraints.elide_mode;
                    let text = layout.elided_range(mode, info.width, info.text_range.clone());
                    let formats = Elider::new(&*layout).elide_formats(
                        mode,
                        &text,
                        info.text_range.start,
                        info.text_end(),
                    );
                    pass.elided = Some(ElidedText {
                        text,
                        formats,
                        start: info.text_range.start,
                        end: info.text_end(),
                    });
                } else {
                    pass.bounds = Some(unelided);
                    pass.height = natural_height;
                }
                break;
            }

            let wrapped_line = char_before(layout.text(), info.text_end()) != Some(LINE_SEPARATOR);
            pass.wrapped |= wrapped_line;
            if !wrapped_line {
                pass.unwrapped_line_count += 1;
            }

            if visible_count == params.max_line_count {
                pass.truncated = true;
                pass.height_exceeded |= pass.wrapped;
                if params.multi_line_elide {
                    pass.elide = true;
                    if params.has_shorter {
                        break;
                    }
                    let next = layout.create_line();
                    let next = if wrapped_line { next } else { None };
                    pass.elided = Some(elide_line(&*layout, info.width, line, next));
                } else {
                    pass.bounds = Some(unelided);
                    pass.height = natural_height;
                }
                break;
            }

            pass.bounds = Some(unelided);
            previous_height = pass.height;
            pass.height = natural_height;
            visible_count += 1;
        }
        pass.visible_count = visible_count;
        pass.natural_height = natural_height;
        pass
    }

    /// Lays out the lines hidden by the line count so that the implicit size covers them.
    fn complete_implicit_lines(
        &mut self,
        constraints: &LayoutConstraints,
        cx: &mut LineContext<'_>,
        pass: &mut Pass,
        params: &PassParams,
    ) {
        let Some(mut line) = pass.last_line else {
            return;
        };
        if pass.unwrapped_line_count >= params.max_line_count {
            return;
        }
        let mut unwrapped = pass.unwrapped_line_count;
        let mut valid = true;
        while self.layout.line_count() < params.max_line_count {
            let Some(next) = self.layout.create_line() else {
                valid = false;
                break;
            };
            line = next;
            let start = self.layout.line(line).map_or(0, |info| info.text_range.start);
            if char_before(self.layout.text(), start) == Some(LINE_SEPARATOR) {
                unwrapped += 1;
            }
            cx.set_line_geometry(
                &mut self.layout,
                constraints,
                line,
                params.line_width,
                &mut pass.natural_height,
            );
        }

        // The remaining paragraphs are created unbroken, which gives the implicit width.
        let text_len = self.layout.text().len();
        let end = if valid {
            self.layout.line(line).map_or(text_len, |info| info.text_end())
        } else {
            text_len
        };
        if end < text_len && self.layout.text()[end..].chars().next() != Some(LINE_SEPARATOR) {
            valid = self.layout.create_line().is_some();
        }
        while valid && unwrapped <= params.max_line_count {
            valid = self.layout.create_line().is_some();
            unwrapped = unwrapped.saturating_add(1);
        }
    }

    fn set_implicit_size(
        &mut self,
        size: Size,
        constraints: &mut LayoutConstraints,
        observer: &mut dyn LayoutObserver,
    ) {
        if size != self.implicit_size {
            self.implicit_size = size;
            observer.implicit_size_changed(size, constraints);
        }
    }

    fn update_state(
        &mut self,
        truncated: bool,
        line_count: usize,
        observer: &mut dyn LayoutObserver,
    ) {
        if self.line_count != line_count {
            self.line_count = line_count;
            observer.line_count_changed(line_count);
        }
        if self.truncated != truncated {
            self.truncated = truncated;
            observer.truncated_changed(truncated);
        }
    }
}

/// Right-elides `line`, optionally pulling in the text of `next`.
fn elide_line(
    layout: &dyn ParagraphEngine,
    width: f64,
    line: usize,
    next: Option<usize>,
) -> ElidedText {
    let elider = Elider::new(layout);
    let text = elider.elide_line(ElideMode::Right, width, line, next);
    let start = layout.line(line).map_or(0, |info| info.text_range.start);
    let end = next
        .or(Some(line))
        .and_then(|index| layout.line(index))
        .map_or(start, |info| info.text_end());
    let formats = elider.elide_formats(ElideMode::Right, &text, start, end);
    ElidedText {
        text,
        formats,
        start,
        end,
    }
}

fn union(rect: Option<Rect>, other: Rect) -> Rect {
    rect.map_or(other, |rect| rect.union(other))
}

/// Relative comparison of two widths.
fn fuzzy_eq(a: f64, b: f64) -> bool {
    (a - b).abs() * 1e12 <= a.abs().min(b.abs())
}

#[cfg(test)]
mod tests {
    use super::{FitRequest, FitResult, LineFitter};
    use crate::{ElideMode, LayoutConstraints, SimpleLayout, WrapMode};

    fn fit(text: &str, constraints: &mut LayoutConstraints) -> FitResult {
        let mut fitter = LineFitter::<SimpleLayout>::default();
        let mut provider = ();
        let mut observer = ();
        fitter.fit(constraints, FitRequest::new(text, &mut provider, &mut observer))
    }

    #[test]
    fn unconstrained_text_uses_natural_size() {
        let result = fit("Hello", &mut LayoutConstraints::default());
        assert_eq!(result.line_count, 1);
        assert!(!result.truncated);
        assert_eq!(result.implicit_size.width, 40.0);
        assert_eq!(result.implicit_size.height, 16.0);
        assert_eq!(result.bounds.height(), 16.0);
        assert_eq!(result.baseline, 12.0);
        assert_eq!(result.corrective_passes, 0);
    }

    #[test]
    fn wrapped_lines_stack() {
        let mut constraints = LayoutConstraints::default()
            .with_width(80.0)
            .with_wrap_mode(WrapMode::WordWrap);
        let result = fit("Hello big world", &mut constraints);
        assert_eq!(result.line_count, 2);
        assert_eq!(result.lines[1].position.y, 16.0);
        assert_eq!(result.bounds.height(), 32.0);
        assert!(result.width_exceeded);
    }

    #[test]
    fn single_line_is_elided() {
        let mut constraints = LayoutConstraints::default()
            .with_width(48.0)
            .with_elide_mode(ElideMode::Right);
        let result = fit("Hello world", &mut constraints);
        assert!(result.truncated);
        assert_eq!(result.line_count, 1);
        let elided = result.elided.as_ref().unwrap();
        assert_eq!(elided.text, "Hello\u{2026}");
        assert!(result.bounds.width() <= 48.0);
        assert_eq!(result.unelided_line_count(), 0);
    }

    #[test]
    fn fuzzy_comparison() {
        assert!(super::fuzzy_eq(0.0, 0.0));
        assert!(super::fuzzy_eq(100.0, 100.0 + 1e-12));
        assert!(!super::fuzzy_eq(100.0, 100.5));
    }
}
