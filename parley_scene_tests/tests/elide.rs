// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Eliding text that does not fit.

use crate::test_name;
use crate::util::{laid_out, TestEnv};
use parley_scene::{
    CharFormat, ElideMode, Elider, FormatRange, LayoutConstraints, ParagraphEngine, SimpleLayout,
    WrapMode,
};
use peniko::color::palette::css;

#[test]
fn elide_fitting_line_is_unchanged() {
    let layout = laid_out("Hello", 100.0, WrapMode::NoWrap);
    let elider = Elider::new(&layout);
    for mode in [ElideMode::Left, ElideMode::Right, ElideMode::Middle] {
        assert_eq!(elider.elide_line(mode, 100.0, 0, None), "Hello");
        assert_eq!(elider.elide_line(mode, 40.0, 0, None), "Hello");
        assert_eq!(layout.elide_str("Hello", mode, 40.0), "Hello");
    }
}

#[test]
fn elide_modes_place_ellipsis() {
    let layout = SimpleLayout::default();
    let text = "Hello world";
    assert_eq!(layout.elide_str(text, ElideMode::Right, 48.0), "Hello\u{2026}");
    assert_eq!(layout.elide_str(text, ElideMode::Left, 48.0), "\u{2026}world");
    assert_eq!(layout.elide_str(text, ElideMode::Middle, 48.0), "Hel\u{2026}ld");
    assert_eq!(layout.elide_str(text, ElideMode::None, 48.0), text);
    // Not even the ellipsis fits.
    assert_eq!(layout.elide_str(text, ElideMode::Right, 4.0), "");
}

#[test]
fn elide_last_character_is_replaced() {
    let layout = laid_out("AAAA\u{2028}BBBB", 100.0, WrapMode::NoWrap);
    let elider = Elider::new(&layout);
    assert_eq!(elider.elide_line(ElideMode::Right, 100.0, 0, None), "AAAA\u{2026}");
}

#[test]
fn elide_left_keeps_formats_of_tail() {
    let mut env = TestEnv::new(test_name!(), "Hello world");
    env.element
        .set_formats([FormatRange::new(
            6..11,
            CharFormat::default().with_foreground(css::RED),
        )])
        .unwrap();
    let result = env.layout(
        LayoutConstraints::default()
            .with_width(48.0)
            .with_elide_mode(ElideMode::Left),
    );

    let elided = result.elided.as_ref().unwrap();
    assert_eq!(elided.text, "\u{2026}world");
    assert_eq!(elided.formats.len(), 1);
    assert_eq!(elided.formats[0].range, 3..8);

    env.sync();
    let batches = env.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].text, "\u{2026}");
    assert_eq!(batches[0].color, css::BLACK);
    assert_eq!(batches[1].text, "world");
    assert_eq!(batches[1].color, css::RED);
}

#[test]
fn elide_middle_element() {
    let mut env = TestEnv::new(test_name!(), "Hello world");
    let result = env.layout(
        LayoutConstraints::default()
            .with_width(48.0)
            .with_elide_mode(ElideMode::Middle),
    );

    assert!(result.truncated);
    env.sync();
    env.check_text("Hel\u{2026}ld");
}

#[test]
fn elide_none_overflows() {
    let mut env = TestEnv::new(test_name!(), "Hello world");
    let result = env.layout(LayoutConstraints::default().with_width(48.0));

    assert!(!result.truncated);
    assert!(result.elided.is_none());
    assert_eq!(result.bounds.width(), 88.0);
    env.sync();
    env.check_text("Hello world");
}
