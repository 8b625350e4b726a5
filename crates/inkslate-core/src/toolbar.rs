//! Placement of the floating contextual toolbar next to the selection.

use crate::config::EngineConfig;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Where the toolbar sits relative to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolbarAnchor {
    /// Right of the selection, top edges aligned.
    RightAbove,
    /// Right of the selection, bottom edges aligned.
    RightBelow,
    LeftAbove,
    LeftBelow,
    CenteredAbove,
    CenteredBelow,
}

impl ToolbarAnchor {
    /// Candidates in tie-break order.
    pub const ALL: [ToolbarAnchor; 6] = [
        ToolbarAnchor::RightAbove,
        ToolbarAnchor::RightBelow,
        ToolbarAnchor::LeftAbove,
        ToolbarAnchor::LeftBelow,
        ToolbarAnchor::CenteredAbove,
        ToolbarAnchor::CenteredBelow,
    ];
}

/// Spacing and scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolbarLayout {
    /// Gap to the selection and inset from the viewport edges.
    pub padding: f64,
    /// Margin around the selection reserved for its handles.
    pub handle_clearance: f64,
    /// Multiplier on overlap area when scoring candidates.
    pub overlap_weight: f64,
}

impl From<&EngineConfig> for ToolbarLayout {
    fn from(config: &EngineConfig) -> Self {
        Self {
            padding: config.toolbar_padding,
            handle_clearance: config.toolbar_handle_clearance,
            overlap_weight: config.toolbar_overlap_weight,
        }
    }
}

impl Default for ToolbarLayout {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// The chosen toolbar position: its top-left corner in pixels relative to
/// the rendered page's top-left (add `Viewport::origin` for screen space).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolbarPlacement {
    pub position: Point,
    pub anchor: ToolbarAnchor,
}

/// Pick the toolbar position for a selection.
///
/// Each candidate is clamped into the padded viewport, then scored by its
/// overlap with the handle-inflated selection (heavily weighted) plus how far
/// clamping moved it. The lowest score wins; ties keep generation order.
pub fn place_toolbar(selection: Rect, toolbar: Size, viewport: Size, layout: &ToolbarLayout) -> ToolbarPlacement {
    let keep_clear = selection.inflate(layout.handle_clearance, layout.handle_clearance);

    let mut best: Option<(f64, ToolbarPlacement)> = None;
    for anchor in ToolbarAnchor::ALL {
        let wanted = candidate(anchor, keep_clear, toolbar, layout.padding);
        let position = Point::new(
            clamp_axis(wanted.x, toolbar.width, viewport.width, layout.padding),
            clamp_axis(wanted.y, toolbar.height, viewport.height, layout.padding),
        );

        let rect = Rect::from_origin_size(position, toolbar);
        let overlap = rect.intersect(keep_clear).area();
        let displacement = (wanted.x - position.x).abs() + (wanted.y - position.y).abs();
        let score = overlap * layout.overlap_weight + displacement;

        if best.as_ref().is_none_or(|(best_score, _)| score < *best_score) {
            best = Some((score, ToolbarPlacement { position, anchor }));
        }
    }

    match best {
        Some((_, placement)) => placement,
        None => ToolbarPlacement {
            position: Point::new(layout.padding, layout.padding),
            anchor: ToolbarAnchor::RightAbove,
        },
    }
}

/// Unclamped top-left for one candidate around the keep-clear rect.
fn candidate(anchor: ToolbarAnchor, keep_clear: Rect, toolbar: Size, gap: f64) -> Point {
    let right = keep_clear.x1 + gap;
    let left = keep_clear.x0 - gap - toolbar.width;
    let centered = keep_clear.center().x - toolbar.width / 2.0;
    let top_aligned = keep_clear.y0;
    let bottom_aligned = keep_clear.y1 - toolbar.height;
    let above = keep_clear.y0 - gap - toolbar.height;
    let below = keep_clear.y1 + gap;

    match anchor {
        ToolbarAnchor::RightAbove => Point::new(right, top_aligned),
        ToolbarAnchor::RightBelow => Point::new(right, bottom_aligned),
        ToolbarAnchor::LeftAbove => Point::new(left, top_aligned),
        ToolbarAnchor::LeftBelow => Point::new(left, bottom_aligned),
        ToolbarAnchor::CenteredAbove => Point::new(centered, above),
        ToolbarAnchor::CenteredBelow => Point::new(centered, below),
    }
}

/// Clamp one axis into `[padding, extent - size - padding]`.
///
/// A toolbar that cannot fit inside the padding is centered instead, never
/// starting before 0.
fn clamp_axis(value: f64, size: f64, extent: f64, padding: f64) -> f64 {
    let lo = padding;
    let hi = extent - size - padding;
    if hi < lo {
        ((extent - size) / 2.0).max(0.0)
    } else {
        value.clamp(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(800.0, 600.0);
    const TOOLBAR: Size = Size::new(160.0, 40.0);

    fn layout() -> ToolbarLayout {
        ToolbarLayout {
            padding: 8.0,
            handle_clearance: 12.0,
            overlap_weight: 1000.0,
        }
    }

    fn fits(placement: &ToolbarPlacement, toolbar: Size, viewport: Size) -> bool {
        let p = placement.position;
        p.x >= 0.0 && p.y >= 0.0 && p.x <= viewport.width - toolbar.width && p.y <= viewport.height - toolbar.height
    }

    #[test]
    fn test_prefers_right_above_when_free() {
        let selection = Rect::new(100.0, 200.0, 200.0, 260.0);
        let placement = place_toolbar(selection, TOOLBAR, VIEWPORT, &layout());
        assert_eq!(placement.anchor, ToolbarAnchor::RightAbove);
        assert_eq!(placement.position, Point::new(220.0, 188.0));
    }

    #[test]
    fn test_flips_left_near_right_edge() {
        let selection = Rect::new(650.0, 200.0, 760.0, 260.0);
        let placement = place_toolbar(selection, TOOLBAR, VIEWPORT, &layout());
        assert_eq!(placement.anchor, ToolbarAnchor::LeftAbove);
        assert!(placement.position.x + TOOLBAR.width <= 650.0 - 12.0);
    }

    #[test]
    fn test_bottom_right_corner_stays_inside() {
        for (x0, y0) in [(700.0, 550.0), (760.0, 580.0), (790.0, 595.0), (600.0, 500.0)] {
            let selection = Rect::new(x0, y0, 800.0, 600.0);
            let placement = place_toolbar(selection, TOOLBAR, VIEWPORT, &layout());
            assert!(fits(&placement, TOOLBAR, VIEWPORT), "{placement:?}");
        }
    }

    #[test]
    fn test_full_width_selection_goes_above_or_below() {
        let selection = Rect::new(0.0, 250.0, 800.0, 300.0);
        let placement = place_toolbar(selection, TOOLBAR, VIEWPORT, &layout());
        assert!(matches!(
            placement.anchor,
            ToolbarAnchor::CenteredAbove | ToolbarAnchor::CenteredBelow
        ));
        let rect = Rect::from_origin_size(placement.position, TOOLBAR);
        assert!(rect.intersect(selection.inflate(12.0, 12.0)).area() < f64::EPSILON);
    }

    #[test]
    fn test_tie_keeps_generation_order() {
        // Selection covering the whole viewport: every candidate overlaps equally.
        let selection = Rect::new(0.0, 0.0, 800.0, 600.0);
        let placement = place_toolbar(selection, TOOLBAR, VIEWPORT, &layout());
        assert!(fits(&placement, TOOLBAR, VIEWPORT));
    }

    #[test]
    fn test_oversized_toolbar_clamps_to_origin() {
        let toolbar = Size::new(900.0, 40.0);
        let selection = Rect::new(100.0, 100.0, 200.0, 200.0);
        let placement = place_toolbar(selection, toolbar, VIEWPORT, &layout());
        assert!(placement.position.x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_axis() {
        assert!((clamp_axis(-50.0, 100.0, 800.0, 8.0) - 8.0).abs() < f64::EPSILON);
        assert!((clamp_axis(790.0, 100.0, 800.0, 8.0) - 692.0).abs() < f64::EPSILON);
        assert!((clamp_axis(300.0, 100.0, 800.0, 8.0) - 300.0).abs() < f64::EPSILON);
    }
}
