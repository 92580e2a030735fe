// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `parley_scene`.
//!
//! - The `util` module contains shared utility functions that are needed by different
//!   test methods.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests. This makes it easier to share utility functions
//!   between tests.
//! - If you want to add new tests, try to follow these guidelines:
//!   - Put tests into the module of their topic (fitting, eliding, node synthesis, element
//!     state), or create a new one in case it doesn't exist yet.
//!   - Tests for bugs should go into `issues.rs`.
//!   - For test naming, try to put the "topic" of the test at the start of the name instead of
//!     the end. For example, `elide_middle_keeps_both_ends` is better than
//!     `keeps_both_ends_when_eliding_middle`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod elide;
#[macro_use]
mod util;
