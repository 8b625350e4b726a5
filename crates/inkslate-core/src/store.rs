//! In-memory annotation store with snapshot undo/redo.

use crate::annotation::{Annotation, AnnotationPatch};
use crate::document::AnnotationsFile;
use crate::error::{SinkError, SinkResult};
use crate::sink::AnnotationSink;

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Annotation list for every page plus undo history.
///
/// Each edit records a snapshot of the whole list before it runs. Inside a
/// history group only the first edit records one, so the group undoes as a
/// single step.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    annotations: Vec<Annotation>,
    undo_stack: Vec<Vec<Annotation>>,
    redo_stack: Vec<Vec<Annotation>>,
    group_depth: usize,
    group_recorded: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing annotations and no history.
    pub fn with_annotations(annotations: Vec<Annotation>) -> Self {
        Self {
            annotations,
            ..Self::default()
        }
    }

    /// Store seeded from a sidecar file.
    pub fn from_file(file: &AnnotationsFile) -> Self {
        Self::with_annotations(file.annotations.values().flatten().cloned().collect())
    }

    /// Every annotation, in creation order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations on one page, in creation order.
    pub fn page(&self, page_number: u32) -> Vec<Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.page_number == page_number)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Write the current state into a sidecar file.
    pub fn to_file(&self, pdf_path: &str) -> AnnotationsFile {
        let mut file = AnnotationsFile::new(pdf_path);
        file.set_annotations(&self.annotations);
        file
    }

    /// Record the current state before an edit.
    fn push_undo(&mut self) {
        if self.group_depth > 0 {
            if self.group_recorded {
                return;
            }
            self.group_recorded = true;
        }

        self.undo_stack.push(self.annotations.clone());
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    fn position(&self, id: &str) -> SinkResult<usize> {
        self.annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| SinkError::NotFound(id.to_string()))
    }

    fn close_groups(&mut self) {
        if self.group_depth > 0 {
            log::debug!("undo requested inside an open history group, closing it");
        }
        self.group_depth = 0;
        self.group_recorded = false;
    }
}

impl AnnotationSink for MemoryStore {
    fn create(&mut self, annotation: &Annotation) -> SinkResult<()> {
        if self.get(&annotation.id).is_some() {
            return Err(SinkError::Rejected(format!("duplicate id {}", annotation.id)));
        }
        self.push_undo();
        self.annotations.push(annotation.clone());
        Ok(())
    }

    fn update(&mut self, id: &str, patch: &AnnotationPatch) -> SinkResult<()> {
        let index = self.position(id)?;
        self.push_undo();
        patch.apply_to(&mut self.annotations[index]);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> SinkResult<()> {
        let index = self.position(id)?;
        self.push_undo();
        self.annotations.remove(index);
        Ok(())
    }

    fn undo(&mut self) -> SinkResult<()> {
        self.close_groups();
        if let Some(snapshot) = self.undo_stack.pop() {
            let current = std::mem::replace(&mut self.annotations, snapshot);
            self.redo_stack.push(current);
        }
        Ok(())
    }

    fn redo(&mut self) -> SinkResult<()> {
        self.close_groups();
        if let Some(snapshot) = self.redo_stack.pop() {
            let current = std::mem::replace(&mut self.annotations, snapshot);
            self.undo_stack.push(current);
        }
        Ok(())
    }

    fn begin_history_group(&mut self) {
        if self.group_depth == 0 {
            self.group_recorded = false;
        }
        self.group_depth += 1;
    }

    fn end_history_group(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
    }
}
