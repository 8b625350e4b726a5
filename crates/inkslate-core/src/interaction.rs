//! Pointer gesture state machine.
//!
//! [`step`] is a pure transition: it takes the current [`Gesture`], a pointer
//! event and a read-only [`InteractionContext`], and returns the next gesture
//! plus the [`Effect`]s the engine should carry out. It never touches a sink.

use crate::annotation::{free_draw_geometry, hit_test, translate, Annotation, AnnotationId, AnnotationPatch, AnnotationType};
use crate::config::{EngineConfig, ToolConfig};
use crate::handles::{hit_test_handles, resize, CursorStyle, HandleKind};
use crate::input::{PointerButton, PointerEvent};
use crate::viewport::Viewport;
use kurbo::{Point, Rect};

/// The single live pointer gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// Drawing a new annotation with the active tool.
    Drawing {
        tool: AnnotationType,
        anchor: Point,
        current: Point,
        /// Every pointer position, for freehand strokes.
        points: Vec<Point>,
    },
    /// Moving an annotation.
    Dragging {
        id: AnnotationId,
        anchor: Point,
        /// State at gesture start; every frame is computed from it.
        original: Annotation,
    },
    /// Dragging a resize handle.
    Resizing {
        id: AnnotationId,
        handle: HandleKind,
        anchor: Point,
        original: Annotation,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// Id of the annotation being moved or resized.
    pub fn target(&self) -> Option<&str> {
        match self {
            Gesture::Dragging { id, .. } | Gesture::Resizing { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Cursor while this gesture is active.
    pub fn cursor(&self) -> Option<CursorStyle> {
        match self {
            Gesture::Idle => None,
            Gesture::Drawing { .. } => Some(CursorStyle::Crosshair),
            Gesture::Dragging { .. } => Some(CursorStyle::Move),
            Gesture::Resizing { handle, .. } => Some(handle.cursor()),
        }
    }

    /// Annotation being drawn, for live rendering. Never persisted.
    pub fn preview(&self, ctx: &InteractionContext<'_>) -> Option<Annotation> {
        let Gesture::Drawing {
            tool,
            anchor,
            current,
            points,
        } = self
        else {
            return None;
        };

        match tool {
            AnnotationType::FreeDraw if points.len() >= 2 => Some(stroke(points, ctx)),
            AnnotationType::Arrow => Some(arrow(*anchor, *current, ctx)),
            kind if kind.is_drag_drawn() => Some(styled(kind.clone(), Rect::from_points(*anchor, *current), ctx)),
            _ => None,
        }
    }
}

/// Read-only view of the engine state a transition needs.
#[derive(Debug, Clone, Copy)]
pub struct InteractionContext<'a> {
    pub annotations: &'a [Annotation],
    pub selected: Option<&'a str>,
    pub tool: Option<&'a AnnotationType>,
    pub style: &'a ToolConfig,
    pub viewport: &'a Viewport,
    pub config: &'a EngineConfig,
    pub page_number: u32,
}

impl InteractionContext<'_> {
    fn find(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Topmost annotation under a document point.
    pub fn annotation_at(&self, point: Point) -> Option<&Annotation> {
        let tolerance = self.viewport.screen_len_to_document(self.config.hit_tolerance_px);
        self.annotations
            .iter()
            .rev()
            .find(|a| hit_test(a, point, tolerance))
    }

    /// Handle of the selected annotation under a document point.
    pub fn handle_at(&self, point: Point) -> Option<(&Annotation, HandleKind)> {
        let selected = self.find(self.selected?)?;
        if !selected.visible || !selected.kind.is_interactive() {
            return None;
        }
        let radius = self.viewport.screen_len_to_document(self.config.handle_hit_radius_px);
        hit_test_handles(selected, point, radius).map(|handle| (selected, handle))
    }

    /// Cursor for an idle pointer hovering at a document point.
    pub fn hover_cursor(&self, point: Point) -> CursorStyle {
        if let Some((_, handle)) = self.handle_at(point) {
            return handle.cursor();
        }
        if self.annotation_at(point).is_some() {
            return CursorStyle::Move;
        }
        match self.tool {
            Some(AnnotationType::Text) => CursorStyle::Text,
            Some(tool) if tool.is_interactive() => CursorStyle::Crosshair,
            _ => CursorStyle::Default,
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Create(Annotation),
    Update { id: AnnotationId, patch: AnnotationPatch },
    Delete(AnnotationId),
    Select(Option<AnnotationId>),
    /// Open the freshly created text annotation for editing.
    EditText(AnnotationId),
    /// A drag or resize started; its edits form one undo entry.
    BeginGesture,
    EndGesture,
}

/// Advance the gesture by one pointer event.
pub fn step(gesture: Gesture, event: &PointerEvent, ctx: &InteractionContext<'_>) -> (Gesture, Vec<Effect>) {
    let point = event.position().map(|position| ctx.viewport.screen_to_document(position));
    let modifiers = event.modifiers();

    match (event, point) {
        (PointerEvent::Down { button, .. }, Some(point)) => {
            if !gesture.is_idle() || *button != PointerButton::Primary {
                return (gesture, Vec::new());
            }
            pointer_down(point, modifiers.duplicate_drag(), ctx)
        }
        (PointerEvent::Move { .. }, Some(point)) => pointer_move(gesture, point, modifiers.lock_aspect(), ctx),
        (PointerEvent::Up { .. } | PointerEvent::Leave, point) => finish(gesture, point, ctx),
        _ => (gesture, Vec::new()),
    }
}

/// Abandon the gesture without creating anything. Edits already sent stay.
pub fn cancel(gesture: Gesture) -> Vec<Effect> {
    match gesture {
        Gesture::Dragging { .. } | Gesture::Resizing { .. } => vec![Effect::EndGesture],
        Gesture::Drawing { .. } | Gesture::Idle => Vec::new(),
    }
}

fn pointer_down(point: Point, duplicate: bool, ctx: &InteractionContext<'_>) -> (Gesture, Vec<Effect>) {
    if let Some((selected, handle)) = ctx.handle_at(point) {
        log::debug!("resize {} via {:?}", selected.id, handle);
        let gesture = Gesture::Resizing {
            id: selected.id.clone(),
            handle,
            anchor: point,
            original: selected.clone(),
        };
        return (gesture, vec![Effect::BeginGesture]);
    }

    if let Some(hit) = ctx.annotation_at(point) {
        if duplicate {
            let copy = hit.duplicate();
            log::debug!("alt-drag duplicates {} as {}", hit.id, copy.id);
            let gesture = Gesture::Dragging {
                id: copy.id.clone(),
                anchor: point,
                original: copy.clone(),
            };
            let id = copy.id.clone();
            return (
                gesture,
                vec![Effect::BeginGesture, Effect::Create(copy), Effect::Select(Some(id))],
            );
        }

        let gesture = Gesture::Dragging {
            id: hit.id.clone(),
            anchor: point,
            original: hit.clone(),
        };
        return (
            gesture,
            vec![Effect::Select(Some(hit.id.clone())), Effect::BeginGesture],
        );
    }

    let mut effects = Vec::new();
    if ctx.selected.is_some() {
        effects.push(Effect::Select(None));
    }

    let gesture = match ctx.tool {
        Some(AnnotationType::Text) => {
            let text = text_box(point, ctx);
            let id = text.id.clone();
            effects.push(Effect::Create(text));
            effects.push(Effect::Select(Some(id.clone())));
            effects.push(Effect::EditText(id));
            Gesture::Idle
        }
        Some(tool) if tool.is_drag_drawn() || *tool == AnnotationType::FreeDraw => Gesture::Drawing {
            tool: tool.clone(),
            anchor: point,
            current: point,
            points: vec![point],
        },
        _ => Gesture::Idle,
    };
    (gesture, effects)
}

fn pointer_move(gesture: Gesture, point: Point, lock_aspect: bool, ctx: &InteractionContext<'_>) -> (Gesture, Vec<Effect>) {
    match gesture {
        Gesture::Idle => (Gesture::Idle, Vec::new()),
        Gesture::Drawing {
            tool,
            anchor,
            mut points,
            ..
        } => {
            if tool == AnnotationType::FreeDraw {
                points.push(point);
            }
            (
                Gesture::Drawing {
                    tool,
                    anchor,
                    current: point,
                    points,
                },
                Vec::new(),
            )
        }
        Gesture::Dragging { id, anchor, original } => {
            let delta = point - anchor;
            let patch = translate(&original, delta.x, delta.y).touched();
            let effects = vec![Effect::Update { id: id.clone(), patch }];
            (Gesture::Dragging { id, anchor, original }, effects)
        }
        Gesture::Resizing {
            id,
            handle,
            anchor,
            original,
        } => {
            let patch = resize(&original, handle, point - anchor, lock_aspect, ctx.config.min_size);
            let effects = if patch.is_empty() {
                Vec::new()
            } else {
                vec![Effect::Update {
                    id: id.clone(),
                    patch: patch.touched(),
                }]
            };
            (
                Gesture::Resizing {
                    id,
                    handle,
                    anchor,
                    original,
                },
                effects,
            )
        }
    }
}

/// End the gesture at `release` (or where it last was, for pointer-leave).
fn finish(gesture: Gesture, release: Option<Point>, ctx: &InteractionContext<'_>) -> (Gesture, Vec<Effect>) {
    match gesture {
        Gesture::Idle => (Gesture::Idle, Vec::new()),
        Gesture::Dragging { .. } | Gesture::Resizing { .. } => (Gesture::Idle, vec![Effect::EndGesture]),
        Gesture::Drawing {
            tool,
            anchor,
            current,
            mut points,
        } => {
            let end = release.unwrap_or(current);
            if tool == AnnotationType::FreeDraw && points.last() != Some(&end) {
                points.push(end);
            }
            let created = complete_drawing(&tool, anchor, end, &points, ctx);
            match &created {
                Some(annotation) => log::info!("created {} {}", annotation.kind, annotation.id),
                None => log::debug!("{tool} gesture too small, discarded"),
            }
            (Gesture::Idle, created.map(Effect::Create).into_iter().collect())
        }
    }
}

fn complete_drawing(
    tool: &AnnotationType,
    anchor: Point,
    end: Point,
    points: &[Point],
    ctx: &InteractionContext<'_>,
) -> Option<Annotation> {
    let min_size = ctx.config.min_size;
    match tool {
        AnnotationType::FreeDraw => (points.len() > 2).then(|| stroke(points, ctx)),
        AnnotationType::Arrow => ((end - anchor).hypot() > min_size).then(|| arrow(anchor, end, ctx)),
        kind if kind.is_drag_drawn() => {
            let rect = Rect::from_points(anchor, end);
            (rect.width() > min_size && rect.height() > min_size).then(|| styled(kind.clone(), rect, ctx))
        }
        _ => None,
    }
}

fn styled(kind: AnnotationType, rect: Rect, ctx: &InteractionContext<'_>) -> Annotation {
    let mut annotation = Annotation::new(kind, ctx.page_number, rect.x0, rect.y0, rect.width(), rect.height());
    annotation.color = ctx.style.color.clone();
    annotation.opacity = ctx.style.opacity;
    if annotation.kind != AnnotationType::Highlight && annotation.kind != AnnotationType::Text {
        annotation.stroke_width = Some(ctx.style.stroke_width);
    }
    annotation
}

fn arrow(start: Point, end: Point, ctx: &InteractionContext<'_>) -> Annotation {
    let mut annotation = styled(AnnotationType::Arrow, Rect::ZERO, ctx);
    AnnotationPatch::geometry(start.x, start.y, end.x - start.x, end.y - start.y).apply_to(&mut annotation);
    annotation
}

fn stroke(points: &[Point], ctx: &InteractionContext<'_>) -> Annotation {
    let mut annotation = styled(AnnotationType::FreeDraw, Rect::ZERO, ctx);
    free_draw_geometry(points).apply_to(&mut annotation);
    annotation
}

fn text_box(at: Point, ctx: &InteractionContext<'_>) -> Annotation {
    let config = ctx.config;
    let rect = Rect::from_origin_size(at, (config.text_box_width, config.text_box_height));
    let mut annotation = styled(AnnotationType::Text, rect, ctx);
    annotation.font_size = Some(config.text_font_size);
    annotation.background_color = Some(config.text_background_color.clone());
    annotation.background_opacity = Some(config.text_background_opacity);
    annotation
}
