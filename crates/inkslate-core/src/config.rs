//! Engine configuration.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Minimum width/height (document units) of a non-arrow annotation.
pub const MIN_SIZE: f64 = 5.0;
/// Douglas–Peucker tolerance applied before smoothing freehand strokes.
pub const SIMPLIFY_TOLERANCE: f64 = 1.5;
/// Catmull-Rom tension used when deriving cubic control points.
pub const SMOOTHING_TENSION: f64 = 0.5;
/// Idle window (ms) that keeps consecutive nudges in one history group.
pub const NUDGE_GROUP_IDLE_MS: u64 = 350;

/// Tunables for interaction, smoothing and toolbar placement.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum shape size in document units.
    pub min_size: f64,
    /// Freehand simplification tolerance in document units.
    pub simplify_tolerance: f64,
    /// Curve tension for smoothed freehand paths.
    pub smoothing_tension: f64,
    /// Arrow-key step in screen pixels.
    pub nudge_step_px: f64,
    /// Arrow-key step with Shift held, in screen pixels.
    pub nudge_large_step_px: f64,
    /// Nudge history grouping window in milliseconds.
    pub nudge_group_idle_ms: u64,
    /// Screen-space offset applied to duplicates.
    pub duplicate_offset_px: f64,
    /// Resize handle hit radius in screen pixels.
    pub handle_hit_radius_px: f64,
    /// Annotation hit tolerance in screen pixels.
    pub hit_tolerance_px: f64,
    /// Gap between selection and toolbar, and inset from the viewport edge.
    pub toolbar_padding: f64,
    /// Extra margin around the selection kept free for its handles.
    pub toolbar_handle_clearance: f64,
    /// Weight of overlap area relative to clamp distance.
    pub toolbar_overlap_weight: f64,
    /// Default width of a freshly placed text box (document units).
    pub text_box_width: f64,
    /// Default height of a freshly placed text box (document units).
    pub text_box_height: f64,
    /// Default font size for new text annotations.
    pub text_font_size: f64,
    /// Default background color for new text annotations.
    pub text_background_color: String,
    /// Default background opacity for new text annotations.
    pub text_background_opacity: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_SIZE,
            simplify_tolerance: SIMPLIFY_TOLERANCE,
            smoothing_tension: SMOOTHING_TENSION,
            nudge_step_px: 1.0,
            nudge_large_step_px: 10.0,
            nudge_group_idle_ms: NUDGE_GROUP_IDLE_MS,
            duplicate_offset_px: 20.0,
            handle_hit_radius_px: 8.0,
            hit_tolerance_px: 4.0,
            toolbar_padding: 8.0,
            toolbar_handle_clearance: 12.0,
            toolbar_overlap_weight: 1000.0,
            text_box_width: 200.0,
            text_box_height: 32.0,
            text_font_size: 16.0,
            text_background_color: "#ffffff".to_string(),
            text_background_opacity: 0.0,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every tunable is in a usable range.
    pub fn validate(&self) -> EngineResult<()> {
        let positive = [
            ("min_size", self.min_size),
            ("nudge_step_px", self.nudge_step_px),
            ("nudge_large_step_px", self.nudge_large_step_px),
            ("text_box_width", self.text_box_width),
            ("text_box_height", self.text_box_height),
            ("text_font_size", self.text_font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("simplify_tolerance", self.simplify_tolerance),
            ("smoothing_tension", self.smoothing_tension),
            ("duplicate_offset_px", self.duplicate_offset_px),
            ("handle_hit_radius_px", self.handle_hit_radius_px),
            ("hit_tolerance_px", self.hit_tolerance_px),
            ("toolbar_padding", self.toolbar_padding),
            ("toolbar_handle_clearance", self.toolbar_handle_clearance),
            ("toolbar_overlap_weight", self.toolbar_overlap_weight),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.text_background_opacity) {
            return Err(EngineError::InvalidConfig(format!(
                "text_background_opacity must be within 0..=1, got {}",
                self.text_background_opacity
            )));
        }

        Ok(())
    }
}

/// Style applied to annotations created by the active tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Stroke/fill color as a hex string.
    pub color: String,
    /// Opacity in `0..=1`.
    pub opacity: f64,
    /// Stroke width in document units.
    pub stroke_width: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            color: "#ff0000".to_string(),
            opacity: 1.0,
            stroke_width: 2.0,
        }
    }
}
