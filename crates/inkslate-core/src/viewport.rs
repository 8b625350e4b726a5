//! Screen ↔ document coordinate transforms for the rendered page.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// The rendered page as the caller currently displays it.
///
/// `document = (screen - origin) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Rendered page width in screen pixels.
    pub width: f64,
    /// Rendered page height in screen pixels.
    pub height: f64,
    /// Zoom factor (screen pixels per document unit).
    pub scale: f64,
    /// Screen position of the document origin.
    #[serde(default)]
    pub origin: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            origin: Vec2::ZERO,
        }
    }
}

impl Viewport {
    /// Viewport with the page origin at the screen origin.
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            origin: Vec2::ZERO,
        }
    }

    /// Zoom factor guarded against zero or non-finite values.
    pub fn effective_scale(&self) -> f64 {
        if self.scale.is_finite() && self.scale > f64::EPSILON {
            self.scale
        } else {
            1.0
        }
    }

    /// Document → screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin) * Affine::scale(self.effective_scale())
    }

    /// Screen → document transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.effective_scale()) * Affine::translate(-self.origin)
    }

    pub fn screen_to_document(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    pub fn document_to_screen(&self, document: Point) -> Point {
        self.transform() * document
    }

    /// Map a document-space rect to screen space.
    pub fn document_rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_points(
            self.document_to_screen(rect.origin()),
            self.document_to_screen(Point::new(rect.x1, rect.y1)),
        )
    }

    /// Map a document-space rect to pixels relative to the page's top-left,
    /// the frame `width` and `height` are measured in.
    pub fn document_rect_to_page(&self, rect: Rect) -> Rect {
        self.document_rect_to_screen(rect) - self.origin
    }

    /// Convert a screen-pixel length to document units.
    pub fn screen_len_to_document(&self, pixels: f64) -> f64 {
        pixels / self.effective_scale()
    }

    /// Rendered page size in screen pixels.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
