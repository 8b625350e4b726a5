//! The annotation engine: selection, keyboard shortcuts and sink dispatch.
//!
//! The host feeds device input and the current page's annotations in, and
//! reads selection, cursor, preview and toolbar placement back out. Every edit
//! goes to the [`AnnotationSink`] passed with the input, and is also applied to
//! the engine's own copy so consecutive edits compose before the host hands
//! back a fresh list through [`Engine::set_annotations`].

use crate::annotation::{points_of, translate, Annotation, AnnotationId, AnnotationPatch, AnnotationType};
use crate::config::{EngineConfig, ToolConfig};
use crate::error::{EngineResult, SinkResult};
use crate::geometry::smooth_path_with;
use crate::handles::{handles_for, keyboard_resize, CursorStyle, Handle};
use crate::history::{GroupKind, HistoryCoordinator};
use crate::input::{KeyEvent, PointerEvent, Shortcut};
use crate::interaction::{self, Effect, Gesture, InteractionContext};
use crate::sink::AnnotationSink;
use crate::timer::{Clock, SystemClock};
use crate::toolbar::{place_toolbar, ToolbarLayout, ToolbarPlacement};
use crate::viewport::Viewport;
use kurbo::{BezPath, Size};

/// Text annotation currently open in an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    id: AnnotationId,
    /// Created by the text tool for this session; blank content discards it.
    just_created: bool,
}

/// Interaction engine for one document page.
pub struct Engine {
    config: EngineConfig,
    viewport: Viewport,
    page_number: u32,
    annotations: Vec<Annotation>,
    tool: Option<AnnotationType>,
    style: ToolConfig,
    selected: Option<AnnotationId>,
    gesture: Gesture,
    history: HistoryCoordinator,
    clock: Box<dyn Clock>,
    toolbar_size: Size,
    editing: Option<TextEdit>,
    hover: CursorStyle,
}

impl Engine {
    /// Engine driven by the system clock.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_clock(config, Box::new(SystemClock::new()))
    }

    /// Engine reading time from `clock`.
    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> EngineResult<Self> {
        config.validate()?;
        let history = HistoryCoordinator::new(config.nudge_group_idle_ms);
        Ok(Self {
            config,
            viewport: Viewport::default(),
            page_number: 1,
            annotations: Vec::new(),
            tool: None,
            style: ToolConfig::default(),
            selected: None,
            gesture: Gesture::Idle,
            history,
            clock,
            toolbar_size: Size::ZERO,
            editing: None,
            hover: CursorStyle::Default,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Inputs ---

    /// Replace the annotations of the current page.
    ///
    /// Switching pages drops the selection and any gesture. On the same page
    /// the selection survives while its id is still present.
    pub fn set_annotations(&mut self, page_number: u32, annotations: Vec<Annotation>) {
        if page_number != self.page_number {
            log::debug!("page changed {} -> {}", self.page_number, page_number);
            self.page_number = page_number;
            self.gesture = Gesture::Idle;
            self.selected = None;
            self.editing = None;
        }
        self.annotations = annotations;

        if let Some(id) = &self.selected {
            if self.find(id).is_none() {
                log::debug!("selected annotation {id} vanished");
                self.selected = None;
            }
        }
        if let Some(edit) = &self.editing {
            if self.find(&edit.id).is_none() {
                self.editing = None;
            }
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Switch tools. `None` is plain selection mode.
    ///
    /// A mode change ends the current gesture and any open history group.
    pub fn set_tool(&mut self, tool: Option<AnnotationType>, sink: &mut dyn AnnotationSink) {
        if self.tool == tool {
            return;
        }
        log::debug!("tool changed to {tool:?}");
        self.interrupt(sink);
        self.tool = tool;
    }

    pub fn tool(&self) -> Option<&AnnotationType> {
        self.tool.as_ref()
    }

    /// Style for annotations created from now on.
    pub fn set_tool_config(&mut self, style: ToolConfig) {
        self.style = style;
    }

    pub fn tool_config(&self) -> &ToolConfig {
        &self.style
    }

    /// Select an annotation, or clear the selection with `None`.
    ///
    /// Unknown or non-interactive ids clear the selection.
    pub fn select(&mut self, id: Option<&str>) {
        let id = id.and_then(|id| self.find(id)).filter(|a| a.kind.is_interactive()).map(|a| a.id.clone());
        if matches!(self.gesture, Gesture::Drawing { .. }) {
            self.gesture = Gesture::Idle;
        }
        self.set_selection(id);
    }

    /// Feed a pointer event in screen coordinates.
    ///
    /// The host commits an open text editor before forwarding the pointer-down
    /// that blurs it. A pointer-down that does not start a gesture on the
    /// edited annotation abandons the session.
    pub fn pointer(&mut self, event: &PointerEvent, sink: &mut dyn AnnotationSink) {
        let gesture = std::mem::take(&mut self.gesture);
        let (next, effects, hover) = {
            let ctx = self.context();
            let (next, effects) = interaction::step(gesture, event, &ctx);
            let hover = match (event, event.position()) {
                (PointerEvent::Move { .. }, Some(position)) if next.is_idle() => {
                    Some(ctx.hover_cursor(self.viewport.screen_to_document(position)))
                }
                (PointerEvent::Leave, _) => Some(CursorStyle::Default),
                _ => None,
            };
            (next, effects, hover)
        };

        let abandon_edit = matches!(event, PointerEvent::Down { .. })
            && self.editing.as_ref().is_some_and(|edit| next.target() != Some(edit.id.as_str()));
        if abandon_edit {
            self.cancel_text_edit(sink);
        }

        self.gesture = next;
        if let Some(hover) = hover {
            self.hover = hover;
        }
        self.apply(effects, sink);
    }

    /// Feed a key press. Returns `false` when the key was not handled and
    /// should fall through to the host.
    pub fn key(&mut self, event: &KeyEvent, sink: &mut dyn AnnotationSink) -> bool {
        let Some(shortcut) =
            Shortcut::resolve(event, self.config.nudge_step_px, self.config.nudge_large_step_px)
        else {
            return false;
        };

        match shortcut {
            Shortcut::Cancel => {
                self.cancel(sink);
                true
            }
            Shortcut::Undo => {
                self.interrupt(sink);
                report("undo", sink.undo());
                true
            }
            Shortcut::Redo => {
                self.interrupt(sink);
                report("redo", sink.redo());
                true
            }
            Shortcut::Delete => self.delete_selected(sink),
            Shortcut::Duplicate => self.duplicate_selected(sink),
            Shortcut::Nudge { dx, dy } => self.nudge(dx, dy, false, sink),
            Shortcut::NudgeResize { dx, dy } => self.nudge(dx, dy, true, sink),
        }
    }

    /// Fire expired timers. Call periodically (e.g. once per frame).
    pub fn tick(&mut self, sink: &mut dyn AnnotationSink) {
        self.history.tick(self.clock.now_ms(), sink);
    }

    /// Clock time at which [`Engine::tick`] next has work, if any.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.history.next_deadline()
    }

    /// Escape: drop the gesture, end text editing, clear the selection and
    /// close any open history group.
    pub fn cancel(&mut self, sink: &mut dyn AnnotationSink) {
        self.interrupt(sink);
        self.cancel_text_edit(sink);
        self.set_selection(None);
    }

    // --- Text editing ---

    /// Open an existing text annotation for editing.
    pub fn edit_text(&mut self, id: &str) -> bool {
        let Some(annotation) = self.find(id).filter(|a| a.kind == AnnotationType::Text) else {
            return false;
        };
        let id = annotation.id.clone();
        self.set_selection(Some(id.clone()));
        self.editing = Some(TextEdit {
            id,
            just_created: false,
        });
        true
    }

    /// Id of the text annotation being edited.
    pub fn editing_text(&self) -> Option<&str> {
        self.editing.as_ref().map(|edit| edit.id.as_str())
    }

    /// Finish editing with `content`. A just-created annotation left blank is
    /// deleted instead.
    pub fn commit_text(&mut self, content: &str, sink: &mut dyn AnnotationSink) {
        let Some(edit) = self.editing.take() else {
            return;
        };

        if content.trim().is_empty() && edit.just_created {
            log::debug!("discarding blank text annotation {}", edit.id);
            self.apply(vec![Effect::Delete(edit.id)], sink);
            return;
        }

        let patch = AnnotationPatch {
            content: Some(content.to_string()),
            ..AnnotationPatch::default()
        };
        self.apply(
            vec![Effect::Update {
                id: edit.id,
                patch: patch.touched(),
            }],
            sink,
        );
    }

    /// Abandon editing. A just-created annotation that is still blank is
    /// deleted.
    pub fn cancel_text_edit(&mut self, sink: &mut dyn AnnotationSink) {
        let Some(edit) = self.editing.take() else {
            return;
        };
        let blank = self.find(&edit.id).map(|a| a.content.trim().is_empty());
        if edit.just_created && blank == Some(true) {
            self.apply(vec![Effect::Delete(edit.id)], sink);
        }
    }

    // --- Outputs ---

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Annotation> {
        self.find(self.selected.as_deref()?)
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Whether a nudge burst or pointer gesture history group is open.
    pub fn open_history_group(&self) -> Option<GroupKind> {
        self.history.open_group()
    }

    /// Resize handles of the selection, in document space.
    pub fn handles(&self) -> Vec<Handle> {
        self.selected().map(handles_for).unwrap_or_default()
    }

    /// Annotation being drawn, in document space.
    pub fn preview(&self) -> Option<Annotation> {
        self.gesture.preview(&self.context())
    }

    /// Smoothed screen-space path of a free-draw annotation.
    pub fn stroke_path(&self, annotation: &Annotation) -> Option<BezPath> {
        let points = points_of(annotation)?;
        let path = smooth_path_with(
            &points,
            self.viewport.effective_scale(),
            self.config.simplify_tolerance,
            self.config.smoothing_tension,
        );
        (!path.elements().is_empty()).then_some(path)
    }

    /// Cursor the host should show.
    pub fn cursor(&self) -> CursorStyle {
        self.gesture.cursor().unwrap_or(self.hover)
    }

    /// Report the rendered toolbar size so placement can account for it.
    pub fn set_toolbar_size(&mut self, size: Size) {
        self.toolbar_size = size;
    }

    /// Where to show the contextual toolbar, if anything is selected.
    pub fn toolbar_position(&self) -> Option<ToolbarPlacement> {
        let selected = self.selected().filter(|a| a.visible)?;
        let selection = self.viewport.document_rect_to_page(selected.bounds());
        Some(place_toolbar(
            selection,
            self.toolbar_size,
            self.viewport.size(),
            &ToolbarLayout::from(&self.config),
        ))
    }

    // --- Internals ---

    fn context(&self) -> InteractionContext<'_> {
        InteractionContext {
            annotations: &self.annotations,
            selected: self.selected.as_deref(),
            tool: self.tool.as_ref(),
            style: &self.style,
            viewport: &self.viewport,
            config: &self.config,
            page_number: self.page_number,
        }
    }

    fn find(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Selected annotation, if it can be edited right now.
    fn editable_selection(&self) -> Option<&Annotation> {
        if !self.gesture.is_idle() {
            return None;
        }
        self.selected().filter(|a| a.kind.is_interactive())
    }

    fn set_selection(&mut self, id: Option<AnnotationId>) {
        if self.selected != id {
            log::debug!("selection {:?} -> {:?}", self.selected, id);
            self.selected = id;
        }
    }

    /// End the active gesture and close whatever history group is open.
    fn interrupt(&mut self, sink: &mut dyn AnnotationSink) {
        let effects = interaction::cancel(std::mem::take(&mut self.gesture));
        self.apply(effects, sink);
        self.history.close(sink);
    }

    fn delete_selected(&mut self, sink: &mut dyn AnnotationSink) -> bool {
        let Some(id) = self.editable_selection().map(|a| a.id.clone()) else {
            return false;
        };
        self.history.close(sink);
        self.apply(vec![Effect::Delete(id)], sink);
        true
    }

    fn duplicate_selected(&mut self, sink: &mut dyn AnnotationSink) -> bool {
        let Some(original) = self.editable_selection() else {
            return false;
        };
        let offset = self.viewport.screen_len_to_document(self.config.duplicate_offset_px);
        let mut copy = original.duplicate();
        translate(&copy, offset, offset).apply_to(&mut copy);
        let id = copy.id.clone();

        self.history.close(sink);
        self.apply(vec![Effect::Create(copy), Effect::Select(Some(id))], sink);
        true
    }

    /// Arrow-key move, or resize with `resize`, by a screen-pixel step.
    fn nudge(&mut self, dx: f64, dy: f64, resize: bool, sink: &mut dyn AnnotationSink) -> bool {
        let Some(annotation) = self.editable_selection() else {
            return false;
        };
        let dx = self.viewport.screen_len_to_document(dx);
        let dy = self.viewport.screen_len_to_document(dy);

        let patch = if resize {
            match keyboard_resize(annotation, dx, dy, self.config.min_size) {
                Some(patch) => patch,
                None => return false,
            }
        } else {
            translate(annotation, dx, dy)
        };
        let id = annotation.id.clone();

        self.history.nudge(self.clock.now_ms(), sink);
        self.apply(
            vec![Effect::Update {
                id,
                patch: patch.touched(),
            }],
            sink,
        );
        true
    }

    fn apply(&mut self, effects: Vec<Effect>, sink: &mut dyn AnnotationSink) {
        for effect in effects {
            match effect {
                Effect::Create(annotation) => {
                    log::info!("create {} {}", annotation.kind, annotation.id);
                    report("create", sink.create(&annotation));
                    self.annotations.push(annotation);
                }
                Effect::Update { id, patch } => {
                    report("update", sink.update(&id, &patch));
                    if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
                        patch.apply_to(annotation);
                    }
                }
                Effect::Delete(id) => {
                    log::info!("delete {id}");
                    report("delete", sink.delete(&id));
                    self.annotations.retain(|a| a.id != id);
                    if self.selected.as_deref() == Some(id.as_str()) {
                        self.selected = None;
                    }
                    if self.editing.as_ref().is_some_and(|edit| edit.id == id) {
                        self.editing = None;
                    }
                }
                Effect::Select(id) => self.set_selection(id),
                Effect::EditText(id) => {
                    self.cancel_text_edit(sink);
                    self.editing = Some(TextEdit {
                        id,
                        just_created: true,
                    })
                }
                Effect::BeginGesture => self.history.begin_gesture(sink),
                Effect::EndGesture => self.history.end_gesture(sink),
            }
        }
    }
}

fn report(operation: &str, result: SinkResult<()>) {
    if let Err(err) = result {
        log::warn!("sink {operation} failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::free_draw_geometry;
    use crate::error::SinkError;
    use crate::input::{Key, Modifiers};
    use crate::sink::{RecordingSink, SinkCall};
    use crate::store::MemoryStore;
    use crate::timer::ManualClock;
    use kurbo::{Point, Rect};

    fn engine() -> (Engine, ManualClock) {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = ManualClock::new();
        let mut engine = Engine::with_clock(EngineConfig::default(), Box::new(clock.clone())).unwrap();
        engine.set_viewport(Viewport::new(800.0, 600.0, 1.0));
        (engine, clock)
    }

    fn drag(engine: &mut Engine, sink: &mut dyn AnnotationSink, from: (f64, f64), to: (f64, f64)) {
        engine.pointer(&PointerEvent::down(Point::new(from.0, from.1)), sink);
        engine.pointer(&PointerEvent::moved(Point::new(to.0, to.1)), sink);
        engine.pointer(&PointerEvent::up(Point::new(to.0, to.1)), sink);
    }

    fn key(engine: &mut Engine, sink: &mut dyn AnnotationSink, key: Key, modifiers: Modifiers) -> bool {
        engine.key(&KeyEvent::new(key).with_modifiers(modifiers), sink)
    }

    fn with_selected(engine: &mut Engine, annotation: Annotation) -> AnnotationId {
        let id = annotation.id.clone();
        engine.set_annotations(1, vec![annotation]);
        engine.select(Some(&id));
        id
    }

    #[test]
    fn test_small_rectangle_drag_creates_nothing() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Rectangle), &mut sink);
        drag(&mut engine, &mut sink, (10.0, 10.0), (12.0, 12.0));
        assert!(sink.created().is_empty());
        assert!(engine.annotations().is_empty());
    }

    #[test]
    fn test_rectangle_drag_creates_box() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Rectangle), &mut sink);
        drag(&mut engine, &mut sink, (10.0, 10.0), (50.0, 40.0));

        let created = sink.created();
        assert_eq!(created.len(), 1);
        let rect = created[0];
        assert_eq!(rect.kind, AnnotationType::Rectangle);
        assert_eq!(rect.page_number, 1);
        assert_eq!(rect.bounds(), Rect::new(10.0, 10.0, 50.0, 40.0));
        assert_eq!(engine.annotations().len(), 1);
        // Drawing never opens a history group.
        assert_eq!(sink.group_calls(), (0, 0));
    }

    #[test]
    fn test_drawing_with_prior_selection_clears_it_and_creates() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        with_selected(&mut engine, Annotation::new(AnnotationType::Circle, 1, 300.0, 300.0, 40.0, 40.0));
        engine.set_tool(Some(AnnotationType::Rectangle), &mut sink);

        engine.pointer(&PointerEvent::down(Point::new(10.0, 10.0)), &mut sink);
        assert_eq!(engine.selected_id(), None);
        assert!(matches!(engine.gesture(), Gesture::Drawing { .. }));

        engine.pointer(&PointerEvent::moved(Point::new(50.0, 40.0)), &mut sink);
        engine.pointer(&PointerEvent::up(Point::new(50.0, 40.0)), &mut sink);
        let created = sink.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].bounds(), Rect::new(10.0, 10.0, 50.0, 40.0));
    }

    #[test]
    fn test_host_select_stops_drawing() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        let circle = Annotation::new(AnnotationType::Circle, 1, 300.0, 300.0, 40.0, 40.0);
        let id = circle.id.clone();
        engine.set_annotations(1, vec![circle]);
        engine.set_tool(Some(AnnotationType::Rectangle), &mut sink);

        engine.pointer(&PointerEvent::down(Point::new(10.0, 10.0)), &mut sink);
        engine.select(Some(&id));
        assert!(engine.gesture().is_idle());
        engine.pointer(&PointerEvent::up(Point::new(50.0, 40.0)), &mut sink);
        assert!(sink.created().is_empty());
    }

    #[test]
    fn test_two_nudges_share_one_group() {
        let (mut engine, clock) = engine();
        let mut sink = RecordingSink::new();
        let id = with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 10.0, 10.0, 40.0, 30.0));

        assert!(key(&mut engine, &mut sink, Key::ArrowRight, Modifiers::NONE));
        clock.advance(100);
        assert!(key(&mut engine, &mut sink, Key::ArrowDown, Modifiers::SHIFT));
        clock.advance(349);
        engine.tick(&mut sink);
        assert_eq!(sink.group_calls(), (1, 0));
        clock.advance(1);
        engine.tick(&mut sink);
        assert_eq!(sink.group_calls(), (1, 1));

        let moved = engine.selected().unwrap();
        assert_eq!(moved.id, id);
        assert!((moved.x - 11.0).abs() < f64::EPSILON);
        assert!((moved.y - 20.0).abs() < f64::EPSILON);
        assert_eq!(sink.updates().len(), 2);
    }

    #[test]
    fn test_nudge_step_scales_with_zoom() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_viewport(Viewport::new(800.0, 600.0, 4.0));
        with_selected(&mut engine, Annotation::new(AnnotationType::Circle, 1, 0.0, 0.0, 40.0, 40.0));

        key(&mut engine, &mut sink, Key::ArrowLeft, Modifiers::SHIFT);
        assert!((engine.selected().unwrap().x + 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_undo_closes_nudge_group_first() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 0.0, 0.0, 40.0, 30.0));

        key(&mut engine, &mut sink, Key::ArrowUp, Modifiers::NONE);
        key(&mut engine, &mut sink, Key::Char('z'), Modifiers::CTRL);
        let kinds: Vec<_> = sink
            .calls
            .iter()
            .map(|call| match call {
                SinkCall::Update(..) => "update",
                SinkCall::BeginGroup => "begin",
                SinkCall::EndGroup => "end",
                SinkCall::Undo => "undo",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["begin", "update", "end", "undo"]);
    }

    #[test]
    fn test_free_draw_duplicate_shifts_points() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_viewport(Viewport::new(800.0, 600.0, 2.0));

        let mut stroke = Annotation::new(AnnotationType::FreeDraw, 1, 0.0, 0.0, 0.0, 0.0);
        free_draw_geometry(&[Point::new(10.0, 10.0), Point::new(30.0, 20.0), Point::new(20.0, 40.0)])
            .apply_to(&mut stroke);
        let original_id = with_selected(&mut engine, stroke);

        assert!(key(&mut engine, &mut sink, Key::Char('d'), Modifiers::CTRL));
        let copy = sink.created()[0];
        assert_ne!(copy.id, original_id);
        assert_eq!(
            copy.points,
            Some(vec![Point::new(20.0, 20.0), Point::new(40.0, 30.0), Point::new(30.0, 50.0)])
        );
        assert_eq!(copy.bounds(), Rect::new(20.0, 20.0, 40.0, 50.0));
        assert_eq!(engine.selected_id(), Some(copy.id.as_str()));
    }

    #[test]
    fn test_drag_undoes_in_one_step() {
        let (mut engine, _) = engine();
        let annotation = Annotation::new(AnnotationType::Rectangle, 1, 100.0, 100.0, 50.0, 50.0);
        let id = annotation.id.clone();
        let mut store = MemoryStore::with_annotations(vec![annotation.clone()]);
        engine.set_annotations(1, vec![annotation]);

        engine.pointer(&PointerEvent::down(Point::new(120.0, 120.0)), &mut store);
        for x in [125.0, 140.0, 160.0] {
            engine.pointer(&PointerEvent::moved(Point::new(x, 120.0)), &mut store);
        }
        engine.pointer(&PointerEvent::up(Point::new(160.0, 120.0)), &mut store);
        assert!((store.get(&id).unwrap().x - 140.0).abs() < f64::EPSILON);
        assert_eq!(engine.open_history_group(), None);

        store.undo().unwrap();
        assert!((store.get(&id).unwrap().x - 100.0).abs() < f64::EPSILON);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_alt_drag_copy_undoes_with_move() {
        let (mut engine, _) = engine();
        let annotation = Annotation::new(AnnotationType::Highlight, 1, 0.0, 0.0, 100.0, 20.0);
        let mut store = MemoryStore::with_annotations(vec![annotation.clone()]);
        engine.set_annotations(1, vec![annotation]);

        engine.pointer(
            &PointerEvent::down(Point::new(50.0, 10.0)).with_modifiers(Modifiers::ALT),
            &mut store,
        );
        engine.pointer(&PointerEvent::moved(Point::new(50.0, 60.0)), &mut store);
        engine.pointer(&PointerEvent::up(Point::new(50.0, 60.0)), &mut store);
        assert_eq!(store.annotations().len(), 2);
        assert!((store.annotations()[1].y - 50.0).abs() < f64::EPSILON);

        store.undo().unwrap();
        assert_eq!(store.annotations().len(), 1);
    }

    #[test]
    fn test_escape_during_drag_resets() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_annotations(1, vec![Annotation::new(AnnotationType::Rectangle, 1, 0.0, 0.0, 50.0, 50.0)]);

        engine.pointer(&PointerEvent::down(Point::new(25.0, 25.0)), &mut sink);
        engine.pointer(&PointerEvent::moved(Point::new(35.0, 25.0)), &mut sink);
        assert!(engine.selected_id().is_some());

        assert!(key(&mut engine, &mut sink, Key::Escape, Modifiers::NONE));
        assert!(engine.gesture().is_idle());
        assert_eq!(engine.selected_id(), None);
        assert_eq!(sink.group_calls(), (1, 1));

        // Release after escape does nothing.
        engine.pointer(&PointerEvent::up(Point::new(35.0, 25.0)), &mut sink);
        assert_eq!(sink.group_calls(), (1, 1));
    }

    #[test]
    fn test_text_tool_blank_commit_deletes() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Text), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(40.0, 40.0)), &mut sink);
        engine.pointer(&PointerEvent::up(Point::new(40.0, 40.0)), &mut sink);

        let id = sink.created()[0].id.clone();
        assert_eq!(engine.editing_text(), Some(id.as_str()));
        assert_eq!(engine.selected_id(), Some(id.as_str()));

        engine.commit_text("   ", &mut sink);
        assert_eq!(sink.deleted(), vec![&id]);
        assert!(engine.annotations().is_empty());
        assert_eq!(engine.selected_id(), None);
    }

    #[test]
    fn test_second_text_click_discards_blank_first() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Text), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(40.0, 40.0)), &mut sink);
        engine.pointer(&PointerEvent::up(Point::new(40.0, 40.0)), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(400.0, 400.0)), &mut sink);
        engine.pointer(&PointerEvent::up(Point::new(400.0, 400.0)), &mut sink);

        let created: Vec<_> = sink.created().iter().map(|a| a.id.clone()).collect();
        assert_eq!(created.len(), 2);
        assert_eq!(sink.deleted(), vec![&created[0]]);
        assert_eq!(engine.editing_text(), Some(created[1].as_str()));

        engine.commit_text("hello", &mut sink);
        engine.cancel(&mut sink);
        assert_eq!(engine.annotations().len(), 1);
        assert_eq!(engine.annotations()[0].content, "hello");
    }

    #[test]
    fn test_empty_canvas_click_ends_text_session() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Text), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(40.0, 40.0)), &mut sink);
        engine.set_tool(None, &mut sink);

        engine.pointer(&PointerEvent::down(Point::new(500.0, 500.0)), &mut sink);
        assert_eq!(engine.editing_text(), None);
        assert_eq!(sink.deleted().len(), 1);
        assert!(engine.annotations().is_empty());
    }

    #[test]
    fn test_dragging_edited_text_keeps_session() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Text), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(40.0, 40.0)), &mut sink);
        let id = sink.created()[0].id.clone();

        drag(&mut engine, &mut sink, (140.0, 56.0), (160.0, 70.0));
        assert_eq!(engine.editing_text(), Some(id.as_str()));
        assert!(sink.deleted().is_empty());
    }

    #[test]
    fn test_text_commit_writes_content() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Text), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(40.0, 40.0)), &mut sink);
        engine.commit_text("Slide notes", &mut sink);

        let (_, patch) = sink.updates()[0];
        assert_eq!(patch.content.as_deref(), Some("Slide notes"));
        assert!(patch.modified.is_some());
        assert_eq!(engine.annotations()[0].content, "Slide notes");
        assert_eq!(engine.editing_text(), None);
    }

    #[test]
    fn test_escape_discards_new_empty_text() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::Text), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(40.0, 40.0)), &mut sink);

        let escape = KeyEvent::new(Key::Escape).in_text_input();
        assert!(engine.key(&escape, &mut sink));
        assert_eq!(sink.deleted().len(), 1);
        assert_eq!(engine.editing_text(), None);
    }

    #[test]
    fn test_cancel_keeps_existing_text() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        let mut text = Annotation::new(AnnotationType::Text, 1, 0.0, 0.0, 100.0, 30.0);
        text.content = "keep".to_string();
        let id = text.id.clone();
        engine.set_annotations(1, vec![text]);

        assert!(engine.edit_text(&id));
        engine.cancel_text_edit(&mut sink);
        assert!(sink.calls.is_empty());
        assert_eq!(engine.annotations().len(), 1);
    }

    #[test]
    fn test_keys_inside_text_input_fall_through() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 0.0, 0.0, 40.0, 30.0));

        let backspace = KeyEvent::new(Key::Backspace).in_text_input();
        assert!(!engine.key(&backspace, &mut sink));
        assert!(sink.calls.is_empty());
        assert!(engine.selected_id().is_some());
    }

    #[test]
    fn test_delete_selection() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        let id = with_selected(&mut engine, Annotation::new(AnnotationType::Arrow, 1, 0.0, 0.0, 40.0, 30.0));

        assert!(key(&mut engine, &mut sink, Key::Delete, Modifiers::NONE));
        assert_eq!(sink.deleted(), vec![&id]);
        assert_eq!(engine.selected_id(), None);
        assert!(!key(&mut engine, &mut sink, Key::Delete, Modifiers::NONE));
    }

    #[test]
    fn test_alt_arrow_resize() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        with_selected(&mut engine, Annotation::new(AnnotationType::Arrow, 1, 0.0, 0.0, -6.0, 30.0));

        assert!(key(&mut engine, &mut sink, Key::ArrowRight, Modifiers::ALT));
        assert!((engine.selected().unwrap().width + 5.0).abs() < f64::EPSILON);

        let stroke = Annotation::new(AnnotationType::FreeDraw, 1, 0.0, 0.0, 10.0, 10.0);
        with_selected(&mut engine, stroke);
        sink.clear();
        assert!(!key(&mut engine, &mut sink, Key::ArrowRight, Modifiers::ALT));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_set_annotations_drops_vanished_selection() {
        let (mut engine, _) = engine();
        let annotation = Annotation::new(AnnotationType::Rectangle, 1, 0.0, 0.0, 40.0, 30.0);
        with_selected(&mut engine, annotation.clone());

        engine.set_annotations(1, vec![annotation.clone()]);
        assert_eq!(engine.selected_id(), Some(annotation.id.as_str()));

        engine.set_annotations(1, Vec::new());
        assert_eq!(engine.selected_id(), None);
        assert!(engine.toolbar_position().is_none());
    }

    #[test]
    fn test_tool_change_closes_nudge_group() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 0.0, 0.0, 40.0, 30.0));

        key(&mut engine, &mut sink, Key::ArrowUp, Modifiers::NONE);
        engine.set_tool(Some(AnnotationType::Circle), &mut sink);
        assert_eq!(sink.group_calls(), (1, 1));
        assert_eq!(engine.open_history_group(), None);
    }

    #[test]
    fn test_sink_failure_is_not_fatal() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink {
            fail_with: Some(SinkError::Rejected("read-only".to_string())),
            ..RecordingSink::default()
        };
        engine.set_tool(Some(AnnotationType::Circle), &mut sink);
        drag(&mut engine, &mut sink, (0.0, 0.0), (30.0, 30.0));
        assert_eq!(sink.created().len(), 1);
        assert_eq!(engine.annotations().len(), 1);
    }

    #[test]
    fn test_toolbar_follows_selection() {
        let (mut engine, _) = engine();
        engine.set_toolbar_size(Size::new(160.0, 40.0));
        assert!(engine.toolbar_position().is_none());

        with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 740.0, 560.0, 50.0, 30.0));
        let placement = engine.toolbar_position().unwrap();
        assert!(placement.position.x >= 0.0 && placement.position.x <= 640.0);
        assert!(placement.position.y >= 0.0 && placement.position.y <= 560.0);
    }

    #[test]
    fn test_toolbar_is_page_relative() {
        let (mut engine, _) = engine();
        engine.set_viewport(Viewport {
            width: 800.0,
            height: 600.0,
            scale: 1.0,
            origin: kurbo::Vec2::new(300.0, 200.0),
        });
        engine.set_toolbar_size(Size::new(160.0, 40.0));
        with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 100.0, 100.0, 50.0, 30.0));

        let expected = place_toolbar(
            Rect::new(100.0, 100.0, 150.0, 130.0),
            Size::new(160.0, 40.0),
            Size::new(800.0, 600.0),
            &ToolbarLayout::from(engine.config()),
        );
        assert_eq!(engine.toolbar_position(), Some(expected));
    }

    #[test]
    fn test_next_deadline_follows_nudge_burst() {
        let (mut engine, clock) = engine();
        let mut sink = RecordingSink::new();
        with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 10.0, 10.0, 40.0, 30.0));
        assert_eq!(engine.next_deadline_ms(), None);

        clock.set(1000);
        key(&mut engine, &mut sink, Key::ArrowRight, Modifiers::NONE);
        assert_eq!(engine.next_deadline_ms(), Some(1000 + engine.config().nudge_group_idle_ms));

        clock.advance(engine.config().nudge_group_idle_ms);
        engine.tick(&mut sink);
        assert_eq!(engine.next_deadline_ms(), None);
    }

    #[test]
    fn test_cursor_tracks_state() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        with_selected(&mut engine, Annotation::new(AnnotationType::Rectangle, 1, 100.0, 100.0, 100.0, 100.0));

        engine.pointer(&PointerEvent::moved(Point::new(200.0, 200.0)), &mut sink);
        assert_eq!(engine.cursor(), CursorStyle::NwseResize);
        engine.pointer(&PointerEvent::moved(Point::new(150.0, 150.0)), &mut sink);
        assert_eq!(engine.cursor(), CursorStyle::Move);
        engine.pointer(&PointerEvent::moved(Point::new(500.0, 500.0)), &mut sink);
        assert_eq!(engine.cursor(), CursorStyle::Default);

        engine.set_tool(Some(AnnotationType::Text), &mut sink);
        engine.pointer(&PointerEvent::moved(Point::new(501.0, 500.0)), &mut sink);
        assert_eq!(engine.cursor(), CursorStyle::Text);
    }

    #[test]
    fn test_preview_and_stroke_path() {
        let (mut engine, _) = engine();
        let mut sink = RecordingSink::new();
        engine.set_tool(Some(AnnotationType::FreeDraw), &mut sink);
        engine.pointer(&PointerEvent::down(Point::new(0.0, 0.0)), &mut sink);
        engine.pointer(&PointerEvent::moved(Point::new(10.0, 20.0)), &mut sink);
        engine.pointer(&PointerEvent::moved(Point::new(30.0, 0.0)), &mut sink);

        let preview = engine.preview().unwrap();
        assert_eq!(preview.kind, AnnotationType::FreeDraw);
        assert!(engine.stroke_path(&preview).is_some());
        assert_eq!(engine.cursor(), CursorStyle::Crosshair);

        engine.pointer(&PointerEvent::up(Point::new(30.0, 0.0)), &mut sink);
        assert!(engine.preview().is_none());
        assert_eq!(sink.created().len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            min_size: -1.0,
            ..EngineConfig::default()
        };
        assert!(Engine::new(config).is_err());
    }
}
