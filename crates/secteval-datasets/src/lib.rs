use std::path::PathBuf;

use thiserror::Error;

pub mod annotations;
pub mod fetch;
pub mod manifest;

pub use annotations::load_annotations;
pub use fetch::{FetchProgress, FetchSummary, fetch_missing};
pub use manifest::{Corpus, Dataset};

/// File name of the annotation store inside a data directory.
pub const ANNOTATIONS_FILE: &str = "section-annotations.json";

#[derive(Error, Debug)]
pub enum DatasetError {
    /// Document ids must be unique across all datasets combined.
    #[error(
        "duplicate document id {doc_id:?} (datasets {first:?} and {second:?}); \
         ids must be unique across all datasets"
    )]
    DuplicateDocId {
        doc_id: String,
        first: String,
        second: String,
    },
    #[error("annotation for {doc_id:?} does not match any dataset document")]
    UnknownAnnotatedDoc { doc_id: String },
    #[error("no dataset manifests found under {dir}")]
    NoDatasets { dir: PathBuf },
    #[error("unexpected file {path} in PDF directory (expected <doc_id>.pdf)")]
    UnexpectedFile { path: PathBuf },
    #[error("download failed for {doc_id} ({url}): {reason}")]
    Download {
        doc_id: String,
        url: String,
        reason: String,
    },
    #[error("HTTP client error: {0}")]
    Http(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
