//! Resize handles and the resize policy per annotation kind.

use crate::annotation::{Annotation, AnnotationPatch, AnnotationType};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A named resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    Top,
    Right,
    Bottom,
    Left,
    /// Arrow tail.
    Start,
    /// Arrow head.
    End,
}

impl HandleKind {
    /// Box handles in hit-test priority order (corners first).
    pub const BOX: [HandleKind; 8] = [
        HandleKind::TopLeft,
        HandleKind::TopRight,
        HandleKind::BottomRight,
        HandleKind::BottomLeft,
        HandleKind::Top,
        HandleKind::Right,
        HandleKind::Bottom,
        HandleKind::Left,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            HandleKind::TopLeft | HandleKind::TopRight | HandleKind::BottomRight | HandleKind::BottomLeft
        )
    }

    fn moves_left(self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::BottomLeft | HandleKind::Left)
    }

    fn moves_right(self) -> bool {
        matches!(self, HandleKind::TopRight | HandleKind::BottomRight | HandleKind::Right)
    }

    fn moves_top(self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::TopRight | HandleKind::Top)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, HandleKind::BottomLeft | HandleKind::BottomRight | HandleKind::Bottom)
    }

    /// Position of this handle on a box.
    fn position_on(self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            HandleKind::TopLeft => Point::new(bounds.x0, bounds.y0),
            HandleKind::TopRight => Point::new(bounds.x1, bounds.y0),
            HandleKind::BottomRight => Point::new(bounds.x1, bounds.y1),
            HandleKind::BottomLeft => Point::new(bounds.x0, bounds.y1),
            HandleKind::Top => Point::new(center.x, bounds.y0),
            HandleKind::Right => Point::new(bounds.x1, center.y),
            HandleKind::Bottom => Point::new(center.x, bounds.y1),
            HandleKind::Left => Point::new(bounds.x0, center.y),
            HandleKind::Start => bounds.origin(),
            HandleKind::End => Point::new(bounds.x1, bounds.y1),
        }
    }

    /// Cursor shown while hovering or dragging this handle.
    pub fn cursor(self) -> CursorStyle {
        match self {
            HandleKind::TopLeft | HandleKind::BottomRight => CursorStyle::NwseResize,
            HandleKind::TopRight | HandleKind::BottomLeft => CursorStyle::NeswResize,
            HandleKind::Top | HandleKind::Bottom => CursorStyle::NsResize,
            HandleKind::Left | HandleKind::Right => CursorStyle::EwResize,
            HandleKind::Start | HandleKind::End => CursorStyle::Crosshair,
        }
    }
}

/// Pointer cursor the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorStyle {
    #[default]
    Default,
    Crosshair,
    Text,
    Move,
    NwseResize,
    NeswResize,
    NsResize,
    EwResize,
}

/// A handle with its document-space position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
}

impl Handle {
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Check if a document-space point hits this handle.
    pub fn hit_test(&self, point: Point, radius: f64) -> bool {
        (point - self.position).hypot2() <= radius * radius
    }
}

/// Resize handles exposed by an annotation.
///
/// Boxes get corners and edge midpoints, arrows their two endpoints.
/// Free-draw strokes are move-only and legacy kinds are not editable.
pub fn handles_for(annotation: &Annotation) -> Vec<Handle> {
    match annotation.kind {
        AnnotationType::Arrow => {
            let (start, end) = annotation.endpoints();
            vec![
                Handle::new(HandleKind::Start, start),
                Handle::new(HandleKind::End, end),
            ]
        }
        ref kind if kind.is_boxed() => {
            let bounds = annotation.bounds();
            HandleKind::BOX
                .iter()
                .map(|&kind| Handle::new(kind, kind.position_on(bounds)))
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Find which handle (if any) is hit at the given document-space point.
pub fn hit_test_handles(annotation: &Annotation, point: Point, radius: f64) -> Option<HandleKind> {
    handles_for(annotation)
        .into_iter()
        .find(|handle| handle.hit_test(point, radius))
        .map(|handle| handle.kind)
}

/// Geometry patch for dragging `handle` by `delta` from the `original` state.
///
/// `delta` is measured from the gesture anchor, never from the previous frame.
pub fn resize(
    original: &Annotation,
    handle: HandleKind,
    delta: Vec2,
    lock_aspect: bool,
    min_size: f64,
) -> AnnotationPatch {
    match (&original.kind, handle) {
        (AnnotationType::Arrow, HandleKind::Start | HandleKind::End) => resize_arrow(original, handle, delta),
        (kind, handle) if kind.is_boxed() && !matches!(handle, HandleKind::Start | HandleKind::End) => {
            resize_box(original, handle, delta, lock_aspect, min_size)
        }
        _ => AnnotationPatch::default(),
    }
}

fn resize_arrow(original: &Annotation, handle: HandleKind, delta: Vec2) -> AnnotationPatch {
    let (mut start, mut end) = original.endpoints();
    if handle == HandleKind::Start {
        start += delta;
    } else {
        end += delta;
    }
    AnnotationPatch::geometry(start.x, start.y, end.x - start.x, end.y - start.y)
}

fn resize_box(
    original: &Annotation,
    handle: HandleKind,
    delta: Vec2,
    lock_aspect: bool,
    min_size: f64,
) -> AnnotationPatch {
    let bounds = original.bounds();
    let (mut left, mut top, mut right, mut bottom) = (bounds.x0, bounds.y0, bounds.x1, bounds.y1);

    if handle.moves_left() {
        left += delta.x;
    }
    if handle.moves_right() {
        right += delta.x;
    }
    if handle.moves_top() {
        top += delta.y;
    }
    if handle.moves_bottom() {
        bottom += delta.y;
    }

    if lock_aspect && handle.is_corner() {
        let ratio = if original.kind == AnnotationType::Circle
            || bounds.width() < f64::EPSILON
            || bounds.height() < f64::EPSILON
        {
            1.0
        } else {
            bounds.width() / bounds.height()
        };

        let mut width = (right - left).max(min_size);
        let mut height = (bottom - top).max(min_size);
        // Shrink whichever side outgrew the locked ratio.
        if width / height > ratio {
            width = height * ratio;
        } else {
            height = width / ratio;
        }
        let grow = (min_size / width).max(min_size / height).max(1.0);
        width *= grow;
        height *= grow;

        let x = if handle.moves_left() { right - width } else { left };
        let y = if handle.moves_top() { bottom - height } else { top };
        return AnnotationPatch::geometry(x, y, width, height);
    }

    // Clamp on the edge the handle controls, never the opposite one.
    if right - left < min_size {
        if handle.moves_left() {
            left = right - min_size;
        } else {
            right = left + min_size;
        }
    }
    if bottom - top < min_size {
        if handle.moves_top() {
            top = bottom - min_size;
        } else {
            bottom = top + min_size;
        }
    }

    AnnotationPatch::geometry(left, top, right - left, bottom - top)
}

/// Keyboard resize by `(dx, dy)` document units.
///
/// Free-draw and legacy kinds have no resize and yield `None`. Arrow vectors
/// change component-wise and keep each component's sign with a magnitude of
/// at least `min_size`. A zero component takes the sign of the step. Boxes grow or shrink with the same floor as pointer
/// resizes.
pub fn keyboard_resize(annotation: &Annotation, dx: f64, dy: f64, min_size: f64) -> Option<AnnotationPatch> {
    match annotation.kind {
        AnnotationType::Arrow => {
            let mut patch = AnnotationPatch::default();
            if dx != 0.0 {
                patch.width = Some(signed_floor(annotation.width, dx, min_size));
            }
            if dy != 0.0 {
                patch.height = Some(signed_floor(annotation.height, dy, min_size));
            }
            Some(patch)
        }
        ref kind if kind.is_boxed() => {
            let mut patch = AnnotationPatch::default();
            if dx != 0.0 {
                patch.width = Some((annotation.width + dx).max(min_size));
            }
            if dy != 0.0 {
                patch.height = Some((annotation.height + dy).max(min_size));
            }
            Some(patch)
        }
        _ => None,
    }
}

fn signed_floor(original: f64, delta: f64, min_size: f64) -> f64 {
    let sign = if original < 0.0 || (original == 0.0 && delta < 0.0) {
        -1.0
    } else {
        1.0
    };
    (original + delta).abs().max(min_size) * sign
}
