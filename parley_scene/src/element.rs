// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-element update state machine.

use core::ops::Range;

use crate::fit::{layout_offset, UNBOUNDED_LINE_WIDTH};
use crate::kurbo::{Point, Rect};
use crate::node::{SceneSink, SelectionState, TextNodeEngine};
use crate::{
    Error, FitRequest, FitResult, FormatRange, FormatRanges, HorizontalAlignment, ImageProvider,
    InlineImage, LayoutConstraints, LayoutObserver, LineFitter, NodeColors, ParagraphEngine,
    VerticalAlignment, MULTILENGTH_SEPARATOR,
};

/// How many times a layout is redone in one update because inline images changed size.
pub const MAX_LAYOUT_BOUNCES: usize = 1;

/// What a [`TextElement`] has to do before its scene nodes are current.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpdateState {
    /// Layout and nodes are up to date.
    Clean,
    /// Text, constraints or images changed; lines have to be fitted again.
    #[default]
    NeedsLayout,
    /// Lines are current but the scene nodes are not.
    NeedsNodeSync,
}

/// Horizontal offset of a block `text_width` wide inside `available_width`.
pub fn aligned_x(text_width: f64, available_width: f64, alignment: HorizontalAlignment) -> f64 {
    match alignment {
        HorizontalAlignment::Left | HorizontalAlignment::Justify => 0.0,
        HorizontalAlignment::Right => available_width - text_width,
        HorizontalAlignment::Center => (available_width - text_width) / 2.0,
    }
}

/// Vertical offset of a block `text_height` tall inside `available_height`.
pub fn aligned_y(text_height: f64, available_height: f64, alignment: VerticalAlignment) -> f64 {
    match alignment {
        VerticalAlignment::Top => 0.0,
        VerticalAlignment::Bottom => available_height - text_height,
        VerticalAlignment::Center => (available_height - text_height) / 2.0,
    }
}

/// A text item of a retained scene.
///
/// The element owns the text, its formats and inline images, and the fitter that lays them
/// out. Changes are tracked by an [`UpdateState`]: setters that affect line breaking move the
/// element to [`UpdateState::NeedsLayout`], setters that only affect drawing move a clean
/// element to [`UpdateState::NeedsNodeSync`]. [`request_layout`](Self::request_layout) and
/// [`sync_scene_nodes`](Self::sync_scene_nodes) do the pending work.
pub struct TextElement<E, O = ()> {
    fitter: LineFitter<E>,
    text: String,
    formats: FormatRanges,
    constraints: LayoutConstraints,
    colors: NodeColors,
    selection: Option<Range<usize>>,
    images: Vec<InlineImage>,
    provider: Box<dyn ImageProvider>,
    observer: O,
    result: FitResult,
    state: UpdateState,
    bridge_selection_seams: bool,
}

impl<E: core::fmt::Debug, O> core::fmt::Debug for TextElement<E, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextElement")
            .field("fitter", &self.fitter)
            .field("text", &self.text)
            .field("formats", &self.formats)
            .field("constraints", &self.constraints)
            .field("colors", &self.colors)
            .field("selection", &self.selection)
            .field("images", &self.images)
            .field("result", &self.result)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<E: ParagraphEngine + Default> TextElement<E> {
    /// Creates an empty element laid out by `layout`.
    pub fn new(layout: E) -> Self {
        Self::with_observer(layout, ())
    }
}

impl<E: ParagraphEngine + Default, O: LayoutObserver> TextElement<E, O> {
    /// Creates an empty element whose layout notifications go to `observer`.
    pub fn with_observer(layout: E, observer: O) -> Self {
        Self {
            fitter: LineFitter::new(layout),
            text: String::new(),
            formats: FormatRanges::default(),
            constraints: LayoutConstraints::default(),
            colors: NodeColors::default(),
            selection: None,
            images: Vec::new(),
            provider: Box::new(()),
            observer,
            result: FitResult::default(),
            state: UpdateState::NeedsLayout,
            bridge_selection_seams: true,
        }
    }

    /// The text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the text.
    ///
    /// Formats, inline images and the selection refer to byte offsets of the old text and are
    /// cleared.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.text = text;
        self.formats = FormatRanges::default();
        self.images.clear();
        self.selection = None;
        self.state = UpdateState::NeedsLayout;
    }

    /// The character formats.
    pub fn formats(&self) -> &[FormatRange] {
        self.formats.as_slice()
    }

    /// Replaces the character formats.
    ///
    /// Ranges must be sorted by start and lie on character boundaries of the text.
    pub fn set_formats(
        &mut self,
        formats: impl IntoIterator<Item = FormatRange>,
    ) -> Result<(), Error> {
        self.formats = FormatRanges::new(&self.text, formats)?;
        self.state = UpdateState::NeedsLayout;
        Ok(())
    }

    /// The layout constraints.
    pub fn constraints(&self) -> &LayoutConstraints {
        &self.constraints
    }

    /// Replaces the layout constraints.
    pub fn set_constraints(&mut self, constraints: LayoutConstraints) {
        if constraints != self.constraints {
            self.constraints = constraints;
            self.state = UpdateState::NeedsLayout;
        }
    }

    /// The colors text is drawn with.
    pub fn colors(&self) -> &NodeColors {
        &self.colors
    }

    /// Replaces the colors text is drawn with.
    pub fn set_colors(&mut self, colors: NodeColors) {
        if colors != self.colors {
            self.colors = colors;
            self.mark_nodes_dirty();
        }
    }

    /// The selected byte range of the text.
    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// Selects a byte range of the text, or clears the selection.
    ///
    /// The selection is ignored for text holding shorter alternatives.
    pub fn set_selection(&mut self, selection: Option<Range<usize>>) -> Result<(), Error> {
        if let Some(range) = &selection {
            Error::check_range(&self.text, range.start, range.end)?;
        }
        if selection != self.selection {
            self.selection = selection;
            self.mark_nodes_dirty();
        }
        Ok(())
    }

    /// Sets whether unselected glyphs next to the selection are redrawn inside it.
    pub fn set_bridge_selection_seams(&mut self, bridge: bool) {
        if bridge != self.bridge_selection_seams {
            self.bridge_selection_seams = bridge;
            self.mark_nodes_dirty();
        }
    }

    /// The inline images.
    pub fn images(&self) -> &[InlineImage] {
        &self.images
    }

    /// Places an image inline with the text.
    pub fn add_inline_image(&mut self, image: InlineImage) -> Result<(), Error> {
        Error::check_range(&self.text, image.position, image.position)?;
        self.images.push(image);
        self.state = UpdateState::NeedsLayout;
        Ok(())
    }

    /// Sets where inline images are loaded from.
    ///
    /// Images are requested again from the new provider.
    pub fn set_image_provider(&mut self, provider: impl ImageProvider + 'static) {
        self.provider = Box::new(provider);
        for image in &mut self.images {
            image.status = None;
        }
        self.state = UpdateState::NeedsLayout;
    }

    /// Tells the element that the image at `url` finished loading.
    ///
    /// Matching images are requested again on the next layout.
    pub fn image_ready(&mut self, url: &str) {
        let mut found = false;
        for image in self.images.iter_mut().filter(|image| &*image.url == url) {
            image.status = None;
            found = true;
        }
        if found {
            self.state = UpdateState::NeedsLayout;
        }
    }

    /// The observer receiving layout notifications.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access to the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// The pending work.
    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// The result of the last layout.
    pub fn result(&self) -> &FitResult {
        &self.result
    }

    /// The fitter holding the laid out lines.
    pub fn fitter(&self) -> &LineFitter<E> {
        &self.fitter
    }

    fn mark_nodes_dirty(&mut self) {
        if self.state == UpdateState::Clean {
            self.state = UpdateState::NeedsNodeSync;
        }
    }

    /// Fits the text if a layout is pending and returns the result.
    ///
    /// When an inline image becomes ready without a declared size during layout, the layout
    /// is redone with its intrinsic size, at most [`MAX_LAYOUT_BOUNCES`] times.
    pub fn request_layout(&mut self) -> &FitResult {
        if self.state != UpdateState::NeedsLayout {
            return &self.result;
        }
        let mut bounces = 0;
        loop {
            let request = FitRequest {
                text: &self.text,
                formats: self.formats.as_slice(),
                images: &mut self.images,
                provider: &mut *self.provider,
                observer: &mut self.observer,
            };
            self.result = self.fitter.fit(&mut self.constraints, request);
            if !self.result.needs_relayout || bounces >= MAX_LAYOUT_BOUNCES {
                break;
            }
            bounces += 1;
            log::debug!("inline image changed size, laying out again");
        }
        self.state = UpdateState::NeedsNodeSync;
        &self.result
    }

    /// Brings the nodes in `sink` up to date.
    ///
    /// Runs a pending layout first. Returns `false` if nothing changed since the last sync, in
    /// which case `sink` is left alone.
    pub fn sync_scene_nodes(&mut self, sink: &mut dyn SceneSink) -> bool {
        self.request_layout();
        if self.state == UpdateState::Clean {
            return false;
        }
        self.state = UpdateState::Clean;
        sink.clear();
        if self.text.is_empty() {
            return true;
        }

        let origin = self.origin();
        let result = &self.result;
        let selection = self
            .selection
            .clone()
            .filter(|range| !range.is_empty() && !self.text.contains(MULTILENGTH_SEPARATOR));
        let layout_selection = selection.clone().map(|range| {
            layout_offset(&self.text, range.start)..layout_offset(&self.text, range.end)
        });

        let mut engine = TextNodeEngine::new(self.colors);
        engine.set_bridge_selection_seams(self.bridge_selection_seams);
        engine.add_text_layout(
            origin,
            self.fitter.layout(),
            layout_selection,
            0..result.unelided_line_count(),
        );
        if let Some(layout) = self.fitter.elide_layout() {
            engine.add_text_layout(origin, layout, None, 0..1);
        }
        for image in result
            .visible_images
            .iter()
            .filter_map(|&index| self.images.get(index))
            .filter(|image| image.is_ready())
        {
            let rect = Rect::from_origin_size(origin + image.pos.to_vec2(), image.layout_size());
            let state = match &selection {
                Some(range) if range.contains(&image.position) => SelectionState::Selected,
                _ => SelectionState::Unselected,
            };
            engine.add_inline_image(rect, image.key(), state);
        }
        engine.emit(sink);
        self.fitter.invalidate_font_caches();
        true
    }

    /// Where the top-left corner of the text block lands inside the element.
    fn origin(&self) -> Point {
        let constraints = &self.constraints;
        let result = &self.result;
        let implicit = result.implicit_size;
        let text_width = if result.line_width >= UNBOUNDED_LINE_WIDTH {
            result.bounds.width()
        } else {
            result.line_width
        };
        let font_height = self.fitter.layout().font().height();
        let x = aligned_x(
            text_width,
            constraints.available_width(implicit.width),
            constraints.horizontal_alignment,
        );
        let y = aligned_y(
            result.bounds.height() + constraints.line_height_offset(font_height),
            constraints.available_height(implicit.height),
            constraints.vertical_alignment,
        );
        Point::new(x + constraints.padding.x0, y + constraints.padding.y0)
    }
}

#[cfg(test)]
mod tests {
    use super::{aligned_x, aligned_y, TextElement, UpdateState};
    use crate::kurbo::{Rect, Size};
    use crate::node::{NodeColors, Primitive, SceneRecorder};
    use crate::peniko::color::palette::css;
    use crate::{
        ErrorKind, HorizontalAlignment, ImageProvider, ImageStatus, InlineImage,
        LayoutConstraints, SimpleLayout, VerticalAlignment,
    };

    struct Ready;

    impl ImageProvider for Ready {
        fn request(&mut self, _url: &str) -> ImageStatus {
            ImageStatus::Ready {
                size: Size::new(20.0, 10.0),
            }
        }
    }

    fn element(text: &str) -> TextElement<SimpleLayout> {
        let mut element = TextElement::new(SimpleLayout::default());
        element.set_text(text);
        element
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(aligned_x(40.0, 100.0, HorizontalAlignment::Left), 0.0);
        assert_eq!(aligned_x(40.0, 100.0, HorizontalAlignment::Justify), 0.0);
        assert_eq!(aligned_x(40.0, 100.0, HorizontalAlignment::Right), 60.0);
        assert_eq!(aligned_x(40.0, 100.0, HorizontalAlignment::Center), 30.0);
        assert_eq!(aligned_y(16.0, 48.0, VerticalAlignment::Top), 0.0);
        assert_eq!(aligned_y(16.0, 48.0, VerticalAlignment::Bottom), 32.0);
        assert_eq!(aligned_y(16.0, 48.0, VerticalAlignment::Center), 16.0);
    }

    #[test]
    fn state_follows_changes() {
        let mut element = element("Hello");
        assert_eq!(element.state(), UpdateState::NeedsLayout);
        element.request_layout();
        assert_eq!(element.state(), UpdateState::NeedsNodeSync);

        let mut scene = SceneRecorder::default();
        assert!(element.sync_scene_nodes(&mut scene));
        assert_eq!(element.state(), UpdateState::Clean);

        element.set_colors(NodeColors {
            text: css::RED,
            ..NodeColors::default()
        });
        assert_eq!(element.state(), UpdateState::NeedsNodeSync);

        element.set_text("Hello again");
        assert_eq!(element.state(), UpdateState::NeedsLayout);
        // Drawing changes do not skip a pending layout.
        element.set_selection(Some(0..2)).unwrap();
        assert_eq!(element.state(), UpdateState::NeedsLayout);
    }

    #[test]
    fn unchanged_setters_keep_element_clean() {
        let mut element = element("Hello");
        let mut scene = SceneRecorder::default();
        element.sync_scene_nodes(&mut scene);
        element.set_text("Hello");
        element.set_constraints(LayoutConstraints::default());
        element.set_selection(None).unwrap();
        assert_eq!(element.state(), UpdateState::Clean);
        assert!(!element.sync_scene_nodes(&mut scene));
    }

    #[test]
    fn invalid_selection_is_rejected() {
        let mut element = element("añb");
        let err = element.set_selection(Some(0..2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotOnCharBoundary);
        let err = element.set_selection(Some(0..10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBounds);
        assert_eq!(element.selection(), None);
    }

    #[test]
    fn empty_text_emits_nothing() {
        let mut element = element("");
        let mut scene = SceneRecorder::default();
        assert!(element.sync_scene_nodes(&mut scene));
        assert!(scene.primitives.is_empty());
        assert_eq!(element.result().line_count, 1);
        assert_eq!(element.result().bounds, Rect::new(0.0, 0.0, 0.0, 16.0));
    }

    #[test]
    fn padding_offsets_glyphs() {
        let mut element = element("ab");
        element.set_constraints(LayoutConstraints::default().with_padding((5.0, 7.0, 0.0, 0.0)));
        let mut scene = SceneRecorder::default();
        element.sync_scene_nodes(&mut scene);
        let Some(Primitive::Glyphs { glyphs, .. }) = scene.primitives.first() else {
            panic!("expected glyphs, got {:?}", scene.primitives);
        };
        assert_eq!((glyphs[0].x, glyphs[0].y), (5.0, 7.0 + 12.0));
        assert_eq!(element.result().implicit_size, Size::new(21.0, 23.0));
    }

    #[test]
    fn ready_image_bounces_once() {
        let mut element = element("ab");
        element.set_image_provider(Ready);
        element.add_inline_image(InlineImage::new(1, "a.png")).unwrap();
        let result = element.request_layout();
        assert!(!result.needs_relayout);
        assert_eq!(result.visible_images, [0]);
        assert_eq!(element.images()[0].layout_size(), Size::new(20.0, 10.0));

        let mut scene = SceneRecorder::default();
        element.sync_scene_nodes(&mut scene);
        let images: Vec<_> = scene
            .primitives
            .iter()
            .filter_map(|primitive| match primitive {
                Primitive::Image { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].size(), Size::new(20.0, 10.0));
        assert_eq!(images[0].x0, 8.0);
    }

    #[test]
    fn images_outside_text_are_rejected() {
        let mut element = element("ab");
        let err = element
            .add_inline_image(InlineImage::new(3, "a.png"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBounds);
        assert!(element.images().is_empty());
    }
}
