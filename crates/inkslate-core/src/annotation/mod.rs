//! Annotation records as the engine sees and edits them.
//!
//! The serialized form is the camelCase JSON used by the document sidecar
//! files, so records round-trip through [`crate::document`] unchanged.

mod ops;

pub use ops::{bounding_box, free_draw_geometry, hit_test, points_of, translate};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for annotations.
///
/// Records loaded from disk may carry arbitrary ids; the engine mints UUID v4
/// strings for everything it creates.
pub type AnnotationId = String;

/// Mint a new annotation id.
pub fn new_id() -> AnnotationId {
    Uuid::new_v4().to_string()
}

/// Current time as an RFC 3339 UTC timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Kind of annotation.
///
/// Unknown strings are kept verbatim as [`AnnotationType::Legacy`]; such
/// records are rendered by the caller but never hit, selected or edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnotationType {
    Highlight,
    Rectangle,
    Circle,
    Arrow,
    FreeDraw,
    Text,
    Legacy(String),
}

impl AnnotationType {
    pub fn as_str(&self) -> &str {
        match self {
            AnnotationType::Highlight => "highlight",
            AnnotationType::Rectangle => "rectangle",
            AnnotationType::Circle => "circle",
            AnnotationType::Arrow => "arrow",
            AnnotationType::FreeDraw => "free-draw",
            AnnotationType::Text => "text",
            AnnotationType::Legacy(name) => name,
        }
    }

    /// Whether the engine may select, move and edit this kind.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, AnnotationType::Legacy(_))
    }

    /// Kinds whose geometry is an axis-aligned box resized by eight handles.
    pub fn is_boxed(&self) -> bool {
        matches!(
            self,
            AnnotationType::Highlight
                | AnnotationType::Rectangle
                | AnnotationType::Circle
                | AnnotationType::Text
        )
    }

    /// Kinds created by dragging out two anchor points.
    pub fn is_drag_drawn(&self) -> bool {
        matches!(
            self,
            AnnotationType::Highlight
                | AnnotationType::Rectangle
                | AnnotationType::Circle
                | AnnotationType::Arrow
        )
    }
}

impl From<String> for AnnotationType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "highlight" => AnnotationType::Highlight,
            "rectangle" => AnnotationType::Rectangle,
            "circle" => AnnotationType::Circle,
            "arrow" => AnnotationType::Arrow,
            "free-draw" => AnnotationType::FreeDraw,
            "text" => AnnotationType::Text,
            _ => AnnotationType::Legacy(name),
        }
    }
}

impl From<AnnotationType> for String {
    fn from(kind: AnnotationType) -> Self {
        match kind {
            AnnotationType::Legacy(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

/// A single annotation on a document page.
///
/// Geometry is in document space. For arrows `width`/`height` hold the
/// start→end vector and may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    pub page_number: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Text for text annotations; JSON point mirror for free-draw.
    #[serde(default)]
    pub content: String,
    pub color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f64>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Stroke points for free-draw, authoritative over `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
}

impl Annotation {
    /// Create a visible annotation with a fresh id and timestamps.
    pub fn new(kind: AnnotationType, page_number: u32, x: f64, y: f64, width: f64, height: f64) -> Self {
        let now = timestamp();
        Self {
            id: new_id(),
            kind,
            page_number,
            x,
            y,
            width,
            height,
            content: String::new(),
            color: "#000000".to_string(),
            opacity: 1.0,
            stroke_width: None,
            font_size: None,
            background_color: None,
            background_opacity: None,
            created: now.clone(),
            modified: now,
            visible: true,
            points: None,
        }
    }

    /// Bounding box in document space (normalized, also for arrows).
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height).abs()
    }

    /// Start and end of an arrow's vector.
    pub fn endpoints(&self) -> (Point, Point) {
        (
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y + self.height),
        )
    }

    /// A copy with a new id and fresh timestamps.
    pub fn duplicate(&self) -> Self {
        let now = timestamp();
        Self {
            id: new_id(),
            created: now.clone(),
            modified: now,
            ..self.clone()
        }
    }

    /// Apply a patch and return the result.
    pub fn patched(&self, patch: &AnnotationPatch) -> Self {
        let mut next = self.clone();
        patch.apply_to(&mut next);
        next
    }
}

/// Partial update to an [`Annotation`]; only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl AnnotationPatch {
    /// Patch that moves/resizes to the given geometry.
    pub fn geometry(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Patch that sets the box from a rect.
    pub fn from_rect(rect: Rect) -> Self {
        Self::geometry(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stamp the modification time.
    pub fn touched(mut self) -> Self {
        self.modified = Some(timestamp());
        self
    }

    /// Write every present field into `annotation`.
    pub fn apply_to(&self, annotation: &mut Annotation) {
        if let Some(x) = self.x {
            annotation.x = x;
        }
        if let Some(y) = self.y {
            annotation.y = y;
        }
        if let Some(width) = self.width {
            annotation.width = width;
        }
        if let Some(height) = self.height {
            annotation.height = height;
        }
        if let Some(points) = &self.points {
            annotation.points = Some(points.clone());
        }
        if let Some(content) = &self.content {
            annotation.content = content.clone();
        }
        if let Some(color) = &self.color {
            annotation.color = color.clone();
        }
        if let Some(opacity) = self.opacity {
            annotation.opacity = opacity;
        }
        if let Some(stroke_width) = self.stroke_width {
            annotation.stroke_width = Some(stroke_width);
        }
        if let Some(font_size) = self.font_size {
            annotation.font_size = Some(font_size);
        }
        if let Some(background_color) = &self.background_color {
            annotation.background_color = Some(background_color.clone());
        }
        if let Some(background_opacity) = self.background_opacity {
            annotation.background_opacity = Some(background_opacity);
        }
        if let Some(visible) = self.visible {
            annotation.visible = visible;
        }
        if let Some(modified) = &self.modified {
            annotation.modified = modified.clone();
        }
    }
}
