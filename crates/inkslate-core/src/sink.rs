//! The annotation store interface the engine writes through.

use crate::annotation::{Annotation, AnnotationId, AnnotationPatch};
use crate::error::{SinkError, SinkResult};

/// Receiver for every edit the engine makes.
///
/// Calls are synchronous and best-effort: the engine logs a returned error
/// and never retries.
pub trait AnnotationSink {
    /// Persist a newly created annotation.
    fn create(&mut self, annotation: &Annotation) -> SinkResult<()>;

    /// Apply a partial update to an existing annotation.
    fn update(&mut self, id: &str, patch: &AnnotationPatch) -> SinkResult<()>;

    /// Remove an annotation.
    fn delete(&mut self, id: &str) -> SinkResult<()>;

    fn undo(&mut self) -> SinkResult<()>;

    fn redo(&mut self) -> SinkResult<()>;

    /// Start recording subsequent edits as one undo entry.
    fn begin_history_group(&mut self);

    /// Close the entry opened by [`AnnotationSink::begin_history_group`].
    fn end_history_group(&mut self);
}

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Create(Annotation),
    Update(AnnotationId, AnnotationPatch),
    Delete(AnnotationId),
    Undo,
    Redo,
    BeginGroup,
    EndGroup,
}

/// Sink that records every call, for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    /// When set, create/update/delete report this error after recording.
    pub fail_with: Option<SinkError>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<&Annotation> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Create(annotation) => Some(annotation),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(&AnnotationId, &AnnotationPatch)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Update(id, patch) => Some((id, patch)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<&AnnotationId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Number of `(begin, end)` group calls.
    pub fn group_calls(&self) -> (usize, usize) {
        let begins = self.calls.iter().filter(|c| **c == SinkCall::BeginGroup).count();
        let ends = self.calls.iter().filter(|c| **c == SinkCall::EndGroup).count();
        (begins, ends)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn outcome(&self) -> SinkResult<()> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl AnnotationSink for RecordingSink {
    fn create(&mut self, annotation: &Annotation) -> SinkResult<()> {
        self.calls.push(SinkCall::Create(annotation.clone()));
        self.outcome()
    }

    fn update(&mut self, id: &str, patch: &AnnotationPatch) -> SinkResult<()> {
        self.calls.push(SinkCall::Update(id.to_string(), patch.clone()));
        self.outcome()
    }

    fn delete(&mut self, id: &str) -> SinkResult<()> {
        self.calls.push(SinkCall::Delete(id.to_string()));
        self.outcome()
    }

    fn undo(&mut self) -> SinkResult<()> {
        self.calls.push(SinkCall::Undo);
        Ok(())
    }

    fn redo(&mut self) -> SinkResult<()> {
        self.calls.push(SinkCall::Redo);
        Ok(())
    }

    fn begin_history_group(&mut self) {
        self.calls.push(SinkCall::BeginGroup);
    }

    fn end_history_group(&mut self) {
        self.calls.push(SinkCall::EndGroup);
    }
}
