//! Geometry helpers over annotation records.

use super::{Annotation, AnnotationPatch, AnnotationType};
use crate::geometry::{point_to_polyline_dist, point_to_segment_dist};
use kurbo::{Point, Rect, Vec2};

/// Stroke points of an annotation.
///
/// The structured `points` field wins; records without it are read from a
/// JSON array mirrored in `content`. Entries with non-finite coordinates are
/// dropped, and `None` means there is nothing to draw. Never fails.
pub fn points_of(annotation: &Annotation) -> Option<Vec<Point>> {
    if let Some(points) = &annotation.points {
        let valid: Vec<Point> = points.iter().copied().filter(is_finite).collect();
        if !valid.is_empty() {
            return Some(valid);
        }
    }
    parse_content_points(&annotation.content)
}

fn is_finite(point: &Point) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

fn parse_content_points(content: &str) -> Option<Vec<Point>> {
    if content.trim().is_empty() {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    let points: Vec<Point> = value
        .as_array()?
        .iter()
        .filter_map(|entry| {
            let x = entry.get("x")?.as_f64()?;
            let y = entry.get("y")?.as_f64()?;
            Some(Point::new(x, y))
        })
        .filter(is_finite)
        .collect();

    if points.is_empty() {
        log::debug!("content held no usable points");
        None
    } else {
        Some(points)
    }
}

/// Tight bounding box of a point set. One point gives a zero-size box.
pub fn bounding_box(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |rect, p| rect.union_pt(*p))
}

/// Patch setting a free-draw annotation's points, their box and the
/// `content` mirror.
pub fn free_draw_geometry(points: &[Point]) -> AnnotationPatch {
    let bounds = bounding_box(points);
    AnnotationPatch {
        points: Some(points.to_vec()),
        content: serde_json::to_string(points).ok(),
        ..AnnotationPatch::from_rect(bounds)
    }
}

/// Patch moving an annotation by `(dx, dy)` document units.
///
/// Free-draw strokes shift every point and recompute their box.
pub fn translate(annotation: &Annotation, dx: f64, dy: f64) -> AnnotationPatch {
    if annotation.kind == AnnotationType::FreeDraw {
        if let Some(points) = points_of(annotation) {
            let delta = Vec2::new(dx, dy);
            let shifted: Vec<Point> = points.into_iter().map(|p| p + delta).collect();
            return free_draw_geometry(&shifted);
        }
    }

    AnnotationPatch {
        x: Some(annotation.x + dx),
        y: Some(annotation.y + dy),
        ..AnnotationPatch::default()
    }
}

/// Whether a document-space point lands on the annotation.
///
/// Hidden and legacy annotations are never hit.
pub fn hit_test(annotation: &Annotation, point: Point, tolerance: f64) -> bool {
    if !annotation.visible || !annotation.kind.is_interactive() {
        return false;
    }

    let stroke_slack = annotation.stroke_width.unwrap_or(0.0) / 2.0;
    match annotation.kind {
        AnnotationType::Arrow => {
            let (start, end) = annotation.endpoints();
            point_to_segment_dist(point, start, end) <= tolerance + stroke_slack
        }
        AnnotationType::FreeDraw => match points_of(annotation) {
            Some(points) => point_to_polyline_dist(point, &points) <= tolerance + stroke_slack,
            None => false,
        },
        _ => annotation.bounds().inflate(tolerance, tolerance).contains(point),
    }
}
