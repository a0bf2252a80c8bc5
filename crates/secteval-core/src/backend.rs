use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Raw extractor output for one run: document id to section titles, in
/// extraction order. Produced fresh per run; never persisted by the
/// evaluation engine.
pub type ExtractionResult = HashMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{tool} is not usable: {reason}")]
    MissingTool { tool: String, reason: String },
    #[error("command exited with status {status}: {command}")]
    CommandFailed { status: i32, command: String },
    #[error("malformed output {path}: {reason}")]
    MalformedOutput { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for section-extraction backends.
///
/// Implementors own the mechanism — launching an external toolchain,
/// reading output files cached by document id, parsing tool-specific JSON
/// or XML schemas — and the evaluation engine depends only on this one
/// method. A backend may keep a disk cache keyed by document id and skip
/// recomputation; that is invisible to callers. Backends share scratch
/// directories keyed by id, so one backend must not be invoked
/// concurrently over an overlapping document set.
pub trait SectionExtractor: std::fmt::Debug {
    /// Extract the section titles of each document. Keys of the returned
    /// map are document ids (the PDF file stem).
    fn get_sections(&self, docs: &[PathBuf]) -> Result<ExtractionResult, BackendError>;
}

/// Document id of a PDF path: the file stem.
pub fn doc_id_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
