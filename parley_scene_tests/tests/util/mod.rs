// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

mod asserts;
pub(crate) mod env;
mod observer;
mod provider;

pub(crate) use asserts::{
    assert_selection_sound, coverage, decorations, glyph_batches, images, rectangles,
    GlyphBatch,
};
pub(crate) use env::{laid_out, TestEnv};
pub(crate) use observer::{Event, RecordingObserver};
pub(crate) use provider::ScriptedProvider;

/// Returns the current function name (for use in test naming).
#[macro_export]
macro_rules! test_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            core::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = &name[..name.len() - 3];
        let name = &name[name.rfind(':').map(|x| x + 1).unwrap_or(0)..];

        name
    }};
}
