//! Replays a scripted input session through the engine.
//!
//! A script names the page, viewport and starting annotations, then lists
//! steps (tool changes, pointer and key events, clock advances, text commits).
//! The engine runs against a [`MemoryStore`] and the resulting annotations are
//! printed as a sidecar file.

use clap::Parser;
use inkslate_core::{
    Annotation, AnnotationType, AnnotationsFile, Engine, EngineConfig, EngineError, KeyEvent, ManualClock,
    MemoryStore, PointerEvent, ToolConfig, Viewport,
};
use kurbo::Size;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "inkslate-replay")]
#[command(about = "Replay scripted input through the annotation engine")]
pub struct Cli {
    /// Script to replay (JSON).
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,
    /// Write the resulting annotations here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Errors raised while replaying a script.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type ReplayResult<T> = Result<T, ReplayError>;

/// A recorded session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default = "default_pdf_path")]
    pub pdf_path: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub config: EngineConfig,
    pub viewport: Viewport,
    #[serde(default)]
    pub style: Option<ToolConfig>,
    #[serde(default)]
    pub toolbar_size: Option<Size>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub steps: Vec<Step>,
}

fn default_pdf_path() -> String {
    "document.pdf".to_string()
}

fn default_page() -> u32 {
    1
}

/// One scripted action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    /// Switch tools; `null` selects plain selection mode.
    Tool { tool: Option<AnnotationType> },
    Pointer { event: PointerEvent },
    Key { event: KeyEvent },
    /// Advance the clock and fire due timers.
    Advance { ms: u64 },
    /// Commit the text editor with this content.
    CommitText { content: String },
    Select { id: Option<String> },
}

pub fn run<I, T>(args: I) -> ReplayResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let script = load_script(&cli.script)?;
    let file = replay(&script)?;
    let json = file.to_json()?;

    match cli.output {
        Some(path) => fs::write(&path, json).map_err(|source| ReplayError::Write { path, source }),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

pub fn load_script(path: &Path) -> ReplayResult<Script> {
    let content = fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Run every step and return the final annotations.
pub fn replay(script: &Script) -> ReplayResult<AnnotationsFile> {
    let clock = ManualClock::new();
    let mut engine = Engine::with_clock(script.config.clone(), Box::new(clock.clone()))?;
    let mut store = MemoryStore::with_annotations(script.annotations.clone());

    engine.set_viewport(script.viewport);
    if let Some(style) = &script.style {
        engine.set_tool_config(style.clone());
    }
    if let Some(size) = script.toolbar_size {
        engine.set_toolbar_size(size);
    }
    engine.set_annotations(script.page, store.page(script.page));

    for (index, step) in script.steps.iter().enumerate() {
        log::debug!("step {index}: {step:?}");
        match step {
            Step::Tool { tool } => engine.set_tool(tool.clone(), &mut store),
            Step::Pointer { event } => engine.pointer(event, &mut store),
            Step::Key { event } => {
                if !engine.key(event, &mut store) {
                    log::info!("step {index}: key {:?} not handled", event.key);
                }
            }
            Step::Advance { ms } => {
                clock.advance(*ms);
                engine.tick(&mut store);
            }
            Step::CommitText { content } => engine.commit_text(content, &mut store),
            Step::Select { id } => engine.select(id.as_deref()),
        }
        // The host feeds the stored list back after every change.
        engine.set_annotations(script.page, store.page(script.page));
    }

    log::info!(
        "replayed {} steps: {} annotations, selected {:?}",
        script.steps.len(),
        store.annotations().len(),
        engine.selected_id()
    );
    if let Some(placement) = engine.toolbar_position() {
        log::info!("toolbar at {:?} ({:?})", placement.position, placement.anchor);
    }

    Ok(store.to_file(&script.pdf_path))
}
