//! The annotation store: a JSON object mapping document id to an ordered
//! list of raw section-title strings.
//!
//! A missing key and an empty list are not the same thing: a missing key
//! means "unannotated, exclude from scoring"; `[]` means "annotated as
//! having zero section titles".

use std::collections::BTreeMap;
use std::path::Path;

use secteval_core::{AnnotatedDocument, SectionTitle};

use crate::manifest::Corpus;
use crate::DatasetError;

/// Load the annotation store and join it against the corpus.
///
/// Returns one [`AnnotatedDocument`] per corpus document; documents absent
/// from the store carry `sections: None`. An annotation whose id matches
/// no corpus document is a fatal configuration error.
pub fn load_annotations(
    path: &Path,
    corpus: &Corpus,
) -> Result<BTreeMap<String, AnnotatedDocument>, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw: BTreeMap<String, Vec<String>> =
        serde_json::from_str(&content).map_err(|e| DatasetError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    for doc_id in raw.keys() {
        if !corpus.contains(doc_id) {
            return Err(DatasetError::UnknownAnnotatedDoc {
                doc_id: doc_id.clone(),
            });
        }
    }

    let mut documents = BTreeMap::new();
    for dataset in corpus.datasets() {
        for (doc_id, url) in &dataset.documents {
            let sections = raw.get(doc_id).map(|titles| {
                titles
                    .iter()
                    .map(|t| SectionTitle::new(t.as_str()))
                    .collect()
            });
            documents.insert(
                doc_id.clone(),
                AnnotatedDocument {
                    doc_id: doc_id.clone(),
                    url: url.clone(),
                    pdf_path: dataset.pdf_path(doc_id),
                    sections,
                },
            );
        }
    }

    let annotated = documents.values().filter(|d| d.is_annotated()).count();
    tracing::info!(
        total = documents.len(),
        annotated,
        path = %path.display(),
        "loaded annotations"
    );
    Ok(documents)
}
