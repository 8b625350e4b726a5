//! Inkslate Core Library
//!
//! Annotation interaction engine for a rendered document page: drawing,
//! selection, move/resize, keyboard editing, freehand smoothing and floating
//! toolbar placement. Rendering and persistence stay with the host.

pub mod annotation;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod handles;
pub mod history;
pub mod input;
pub mod interaction;
pub mod sink;
pub mod store;
pub mod timer;
pub mod toolbar;
pub mod viewport;

pub use annotation::{Annotation, AnnotationId, AnnotationPatch, AnnotationType};
pub use config::{EngineConfig, ToolConfig};
pub use document::AnnotationsFile;
pub use engine::Engine;
pub use error::{EngineError, EngineResult, SinkError, SinkResult};
pub use geometry::{simplify, smooth_path, smooth_svg_path};
pub use handles::{CursorStyle, Handle, HandleKind};
pub use input::{Key, KeyEvent, Modifiers, PointerButton, PointerEvent};
pub use interaction::{Effect, Gesture};
pub use sink::{AnnotationSink, RecordingSink};
pub use store::MemoryStore;
pub use timer::{Clock, ManualClock, SystemClock};
pub use toolbar::{place_toolbar, ToolbarAnchor, ToolbarPlacement};
pub use viewport::Viewport;
