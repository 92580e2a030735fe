// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use parley_scene::kurbo::Size;
use parley_scene::{LayoutConstraints, LayoutObserver, LineGeometry};

/// A notification received by [`RecordingObserver`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    ImplicitSize(Size),
    Truncated(bool),
    LineCount(usize),
    Line(usize),
}

/// Records layout notifications.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingObserver {
    pub(crate) events: Vec<Event>,
    /// Bind the explicit width to the implicit width, like a layout that sizes to content.
    pub(crate) bind_width: bool,
    /// Take over line geometry, moving every line to this x.
    pub(crate) line_x: Option<f64>,
}

impl RecordingObserver {
    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }
}

impl LayoutObserver for RecordingObserver {
    fn implicit_size_changed(&mut self, size: Size, constraints: &mut LayoutConstraints) {
        self.events.push(Event::ImplicitSize(size));
        if self.bind_width {
            constraints.width = Some(size.width);
        }
    }

    fn wants_line_geometry(&self) -> bool {
        self.line_x.is_some()
    }

    fn line_laid_out(&mut self, line: &mut LineGeometry<'_>) {
        self.events.push(Event::Line(line.number()));
        if let Some(x) = self.line_x {
            line.set_x(x);
        }
    }

    fn truncated_changed(&mut self, truncated: bool) {
        self.events.push(Event::Truncated(truncated));
    }

    fn line_count_changed(&mut self, count: usize) {
        self.events.push(Event::LineCount(count));
    }
}
