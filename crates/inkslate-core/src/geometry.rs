//! Polyline simplification and smooth-curve generation for freehand strokes.

use crate::config::{SIMPLIFY_TOLERANCE, SMOOTHING_TENSION};
use kurbo::{Affine, BezPath, Point, Vec2};

/// Perpendicular distance from `point` to the infinite line through `a` and `b`.
///
/// A zero-length `a→b` yields 0.
pub fn perpendicular_distance(point: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return 0.0;
    }

    // Twice the triangle area over the base length.
    let area2 = ((point.x - a.x) * dy - (point.y - a.y) * dx).abs();
    area2 / len_sq.sqrt()
}

/// Distance from a point to the segment `a→b`.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Ramer–Douglas–Peucker simplification.
///
/// Inputs of two points or fewer come back unchanged. The first and last
/// points are always kept. Ranges are processed from an explicit stack, so
/// long strokes cannot overflow the call stack.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut ranges = vec![(0usize, last)];
    while let Some((start, end)) = ranges.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in start + 1..end {
            let dist = perpendicular_distance(points[i], points[start], points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }

        if max_dist > tolerance {
            keep[max_index] = true;
            ranges.push((start, max_index));
            ranges.push((max_index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}

/// Smooth screen-space path through a document-space stroke.
///
/// Uses the default simplification tolerance and tension.
pub fn smooth_path(points: &[Point], scale: f64) -> BezPath {
    smooth_path_with(points, scale, SIMPLIFY_TOLERANCE, SMOOTHING_TENSION)
}

/// Smooth path with explicit simplification tolerance and curve tension.
///
/// Fewer than two points give an empty path and exactly two a straight
/// segment. Longer strokes are simplified first, then every remaining point is
/// joined by a cubic whose control points come from its neighbours
/// (Catmull-Rom tangents), so the curve passes through each kept point with a
/// continuous tangent.
pub fn smooth_path_with(points: &[Point], scale: f64, tolerance: f64, tension: f64) -> BezPath {
    let mut path = BezPath::new();

    let pts = match points.len() {
        0 | 1 => return path,
        2 => points.to_vec(),
        _ => simplify(points, tolerance),
    };

    path.move_to(pts[0]);
    if pts.len() == 2 {
        path.line_to(pts[1]);
    } else {
        let k = tension / 3.0;
        let last = pts.len() - 1;
        for i in 0..last {
            let p0 = pts[i.saturating_sub(1)];
            let p1 = pts[i];
            let p2 = pts[i + 1];
            let p3 = pts[(i + 2).min(last)];

            let tangent_in: Vec2 = (p2 - p0) * k;
            let tangent_out: Vec2 = (p3 - p1) * k;
            path.curve_to(p1 + tangent_in, p2 - tangent_out, p2);
        }
    }

    path.apply_affine(Affine::scale(scale));
    path
}

/// SVG `d` attribute for [`smooth_path`].
pub fn smooth_svg_path(points: &[Point], scale: f64) -> String {
    smooth_path(points, scale).to_svg()
}
