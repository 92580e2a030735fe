// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use parley_scene::{ImageProvider, ImageStatus};

/// An image provider answering from a script, shared with the test through cloning.
///
/// Unknown urls stay loading.
#[derive(Clone, Debug, Default)]
pub(crate) struct ScriptedProvider {
    responses: Rc<RefCell<HashMap<String, ImageStatus>>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl ScriptedProvider {
    pub(crate) fn respond(&self, url: &str, status: ImageStatus) {
        self.responses.borrow_mut().insert(url.to_owned(), status);
    }

    /// Urls requested so far, in order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ImageProvider for ScriptedProvider {
    fn request(&mut self, url: &str) -> ImageStatus {
        self.requests.borrow_mut().push(url.to_owned());
        self.responses
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or(ImageStatus::Loading)
    }
}
