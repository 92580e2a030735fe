// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The environment most tests run in.

use parley_scene::kurbo::Point;
use parley_scene::{
    FitResult, LayoutConstraints, ParagraphEngine, SceneRecorder, SimpleLayout, TextElement,
    WrapMode,
};

use super::{glyph_batches, GlyphBatch, RecordingObserver};

/// A text element laid out with [`SimpleLayout`] and the scene it was last synced to.
pub(crate) struct TestEnv {
    name: &'static str,
    pub(crate) element: TextElement<SimpleLayout, RecordingObserver>,
    pub(crate) scene: SceneRecorder,
}

impl TestEnv {
    pub(crate) fn new(name: &'static str, text: &str) -> Self {
        Self::with_observer(name, text, RecordingObserver::default())
    }

    pub(crate) fn with_observer(
        name: &'static str,
        text: &str,
        observer: RecordingObserver,
    ) -> Self {
        let mut element = TextElement::with_observer(SimpleLayout::default(), observer);
        element.set_text(text);
        Self {
            name,
            element,
            scene: SceneRecorder::default(),
        }
    }

    /// Applies `constraints` and lays the text out.
    pub(crate) fn layout(&mut self, constraints: LayoutConstraints) -> FitResult {
        self.element.set_constraints(constraints);
        self.element.request_layout().clone()
    }

    /// Syncs the element into the scene, returning whether anything was redrawn.
    pub(crate) fn sync(&mut self) -> bool {
        self.element.sync_scene_nodes(&mut self.scene)
    }

    pub(crate) fn batches(&self) -> Vec<GlyphBatch> {
        glyph_batches(&self.scene)
    }

    /// Asserts that the glyphs drawn outside of any clip spell `expected`.
    pub(crate) fn check_text(&self, expected: &str) {
        let text: String = self
            .batches()
            .iter()
            .filter(|batch| batch.clip.is_none())
            .map(|batch| batch.text.as_str())
            .collect();
        assert_eq!(text, expected, "unexpected text drawn in {}", self.name);
    }
}

/// Lays `text` out directly, breaking every line at `width` and stacking lines 16px apart.
pub(crate) fn laid_out(text: &str, width: f64, wrap_mode: WrapMode) -> SimpleLayout {
    let mut layout = SimpleLayout::default();
    layout.set_text(text);
    layout.set_wrap_mode(wrap_mode);
    layout.begin_layout();
    let mut y = 0.0;
    while let Some(line) = layout.create_line() {
        layout.set_line_width(line, width);
        layout.set_line_position(line, Point::new(0.0, y));
        y += layout.font().height();
    }
    layout.end_layout();
    layout
}
