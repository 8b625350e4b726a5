//! Sidecar file format holding every annotation of a document.
//!
//! `document.pdf` keeps its annotations in `document.pdf.annotations.json`.
//! Only the format lives here; reading and writing files is up to the caller.

use crate::annotation::Annotation;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// Annotations of a whole document, keyed by page number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationsFile {
    pub version: u32,
    pub pdf_path: String,
    pub annotations: BTreeMap<u32, Vec<Annotation>>,
    pub created_at: String,
    pub updated_at: String,
}

impl AnnotationsFile {
    /// Empty file for a document.
    pub fn new(pdf_path: &str) -> Self {
        let now = crate::annotation::timestamp();
        Self {
            version: FORMAT_VERSION,
            pdf_path: pdf_path.to_string(),
            annotations: BTreeMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Sidecar path for a document.
    pub fn sidecar_path(pdf_path: &str) -> PathBuf {
        PathBuf::from(format!("{pdf_path}.annotations.json"))
    }

    /// Replace the stored annotations, grouping them by page.
    pub fn set_annotations<'a>(&mut self, annotations: impl IntoIterator<Item = &'a Annotation>) {
        let mut pages: BTreeMap<u32, Vec<Annotation>> = BTreeMap::new();
        for annotation in annotations {
            pages.entry(annotation.page_number).or_default().push(annotation.clone());
        }
        self.annotations = pages;
        self.updated_at = crate::annotation::timestamp();
    }

    /// Annotations on one page.
    pub fn page(&self, page_number: u32) -> &[Annotation] {
        self.annotations.get(&page_number).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of annotations across pages.
    pub fn len(&self) -> usize {
        self.annotations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a file, rejecting unknown format versions.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let file: Self = serde_json::from_str(json)?;
        if file.version != FORMAT_VERSION {
            return Err(EngineError::UnsupportedVersion(file.version));
        }
        Ok(file)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
