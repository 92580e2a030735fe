// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inline images.

use std::sync::Arc;

use crate::kurbo::{Point, Size};

/// Size used for an image whose intrinsic size is not known yet.
pub const PLACEHOLDER_IMAGE_SIZE: Size = Size::new(16.0, 16.0);

/// Vertical alignment of an inline image relative to the text of its line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageAlignment {
    /// The top of the image is aligned with the top of the line.
    Top,
    /// The image is centered on the line.
    Middle,
    /// The bottom of the image is aligned with the bottom of the line.
    #[default]
    Bottom,
}

/// Identifies the pixels of an image towards the scene sink.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageKey(pub Arc<str>);

impl ImageKey {
    /// The url of the image.
    pub fn url(&self) -> &str {
        &self.0
    }
}

/// Why an image could not be provided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageError {
    /// Human readable description of the failure.
    pub message: String,
}

impl ImageError {
    /// Creates a new error with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ImageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for ImageError {}

/// State of an image request.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageStatus {
    /// The image is being loaded.
    Loading,
    /// The image is available.
    Ready {
        /// The intrinsic size of the image.
        size: Size,
    },
    /// The image could not be loaded.
    Error(ImageError),
}

impl ImageStatus {
    /// Returns `true` if the image is ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Loads the images referenced by inline image tags.
///
/// Requests must not block. A provider that returns [`ImageStatus::Loading`] is expected to
/// report completion through [`TextElement::image_ready`](crate::TextElement::image_ready).
pub trait ImageProvider {
    /// Requests the image at `url`.
    fn request(&mut self, url: &str) -> ImageStatus;
}

impl ImageProvider for () {
    fn request(&mut self, url: &str) -> ImageStatus {
        ImageStatus::Error(ImageError::new(format!("no image provider to load {url}")))
    }
}

/// An image placed inline with the text.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineImage {
    /// Byte offset of the image in the text.
    pub position: usize,
    /// Where the image is loaded from.
    pub url: Arc<str>,
    /// Declared size, or the intrinsic size once known.
    pub size: Option<Size>,
    /// Vertical alignment on the line.
    pub alignment: ImageAlignment,
    /// Horizontal offset from the caret position at `position`.
    pub offset: f64,
    /// State of the last request, `None` if the image has not been requested yet.
    pub status: Option<ImageStatus>,
    /// Top-left corner of the image, relative to the text origin.
    pub pos: Point,
}

impl InlineImage {
    /// Creates an image at byte `position` loaded from `url`.
    pub fn new(position: usize, url: impl Into<Arc<str>>) -> Self {
        Self {
            position,
            url: url.into(),
            size: None,
            alignment: ImageAlignment::default(),
            offset: 0.0,
            status: None,
            pos: Point::ZERO,
        }
    }

    /// Sets the declared size.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the vertical alignment.
    pub fn with_alignment(mut self, alignment: ImageAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the horizontal offset.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// The size the image occupies on its line.
    pub fn layout_size(&self) -> Size {
        self.size.unwrap_or(PLACEHOLDER_IMAGE_SIZE)
    }

    /// Returns `true` if the image pixels are available.
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(ImageStatus::is_ready)
    }

    /// The key identifying this image towards the scene sink.
    pub fn key(&self) -> ImageKey {
        ImageKey(self.url.clone())
    }

    /// Requests the image from `provider` unless it has been requested before.
    ///
    /// Returns `true` if the image became ready without a declared size, in which case the
    /// layout has to be redone with the intrinsic size.
    pub(crate) fn ensure_requested(&mut self, provider: &mut dyn ImageProvider) -> bool {
        if self.status.is_some() {
            return false;
        }
        let status = provider.request(&self.url);
        let mut needs_relayout = false;
        match &status {
            ImageStatus::Loading => {}
            ImageStatus::Ready { size } => {
                if self.size.is_none() {
                    self.size = Some(*size);
                    needs_relayout = true;
                }
            }
            ImageStatus::Error(err) => {
                log::warn!("failed to load inline image {}: {err}", self.url);
            }
        }
        self.status = Some(status);
        needs_relayout
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageProvider, ImageStatus, InlineImage, PLACEHOLDER_IMAGE_SIZE};
    use crate::kurbo::Size;

    struct Fixed(Size);

    impl ImageProvider for Fixed {
        fn request(&mut self, _url: &str) -> ImageStatus {
            ImageStatus::Ready { size: self.0 }
        }
    }

    #[test]
    fn ready_image_adopts_intrinsic_size_once() {
        let mut image = InlineImage::new(0, "a.png");
        let mut provider = Fixed(Size::new(20.0, 10.0));
        assert_eq!(image.layout_size(), PLACEHOLDER_IMAGE_SIZE);
        assert!(image.ensure_requested(&mut provider));
        assert_eq!(image.layout_size(), Size::new(20.0, 10.0));
        assert!(!image.ensure_requested(&mut provider));
    }

    #[test]
    fn failed_image_keeps_placeholder() {
        let mut image = InlineImage::new(0, "missing.png");
        assert!(!image.ensure_requested(&mut ()));
        assert!(!image.is_ready());
        assert_eq!(image.layout_size(), PLACEHOLDER_IMAGE_SIZE);
    }
}
