//! Download missing corpus PDFs from their source URLs.
//!
//! Only files absent from a dataset's PDF directory are fetched; a file
//! already present is trusted. The PDF directory must contain nothing but
//! `<known doc id>.pdf` files — anything else aborts the scan, since a
//! stray file usually means a half-finished manual copy.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use secteval_core::backend::doc_id_of;

use crate::manifest::Corpus;
use crate::DatasetError;

/// Progress events emitted while fetching.
#[derive(Debug, Clone)]
pub enum FetchProgress {
    Scanned { present: usize, missing: usize },
    Downloading { doc_id: String, index: usize, total: usize },
    Downloaded { doc_id: String, bytes: u64 },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchSummary {
    pub already_present: usize,
    pub downloaded: usize,
}

/// Scan a PDF directory, returning the ids already present.
///
/// Creates the directory if it does not exist. Every present file must be
/// `<doc_id>.pdf` for a known id.
fn scan_pdf_dir(
    pdf_dir: &Path,
    documents: &BTreeMap<String, String>,
) -> Result<Vec<String>, DatasetError> {
    if !pdf_dir.is_dir() {
        tracing::info!(dir = %pdf_dir.display(), "creating PDF directory");
        std::fs::create_dir_all(pdf_dir)?;
        return Ok(Vec::new());
    }
    let mut present = Vec::new();
    for entry in std::fs::read_dir(pdf_dir)? {
        let path = entry?.path();
        let is_pdf = path.extension().is_some_and(|e| e == "pdf");
        let doc_id = doc_id_of(&path);
        if !is_pdf || !documents.contains_key(&doc_id) {
            return Err(DatasetError::UnexpectedFile { path });
        }
        present.push(doc_id);
    }
    Ok(present)
}

/// An HTML error page served where a PDF was expected.
fn looks_like_html(body: &[u8]) -> bool {
    let head = &body[..body.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Download every missing PDF across all datasets in the corpus.
///
/// Bodies are written to a temp file and atomically persisted to
/// `<pdf_dir>/<doc_id>.pdf`, so an interrupted run never leaves a partial
/// PDF behind and can simply be restarted.
pub async fn fetch_missing(
    corpus: &Corpus,
    mut progress: impl FnMut(FetchProgress),
) -> Result<FetchSummary, DatasetError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("secteval/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DatasetError::Http(e.to_string()))?;

    let mut summary = FetchSummary::default();
    let mut missing: Vec<(String, String, PathBuf)> = Vec::new();
    for dataset in corpus.datasets() {
        let present = scan_pdf_dir(&dataset.pdf_dir, &dataset.documents)?;
        summary.already_present += present.len();
        for (doc_id, url) in &dataset.documents {
            if !present.iter().any(|p| p == doc_id) {
                missing.push((doc_id.clone(), url.clone(), dataset.pdf_path(doc_id)));
            }
        }
    }
    missing.sort();
    progress(FetchProgress::Scanned {
        present: summary.already_present,
        missing: missing.len(),
    });
    tracing::info!(
        present = summary.already_present,
        missing = missing.len(),
        "scanned PDF directories"
    );

    let total = missing.len();
    for (index, (doc_id, url, target)) in missing.into_iter().enumerate() {
        progress(FetchProgress::Downloading {
            doc_id: doc_id.clone(),
            index,
            total,
        });
        let bytes = download_one(&client, &doc_id, &url).await?;
        let len = bytes.len() as u64;

        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&target).map_err(|e| e.error)?;

        tracing::debug!(doc_id = %doc_id, bytes = len, "downloaded");
        progress(FetchProgress::Downloaded {
            doc_id,
            bytes: len,
        });
        summary.downloaded += 1;
    }
    Ok(summary)
}

async fn download_one(
    client: &reqwest::Client,
    doc_id: &str,
    url: &str,
) -> Result<Vec<u8>, DatasetError> {
    let fail = |reason: String| DatasetError::Download {
        doc_id: doc_id.to_string(),
        url: url.to_string(),
        reason,
    };
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?;
    if !response.status().is_success() {
        return Err(fail(format!("HTTP status {}", response.status())));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| fail(e.to_string()))?;
    if body.is_empty() {
        return Err(fail("empty response body".to_string()));
    }
    if looks_like_html(&body) {
        return Err(fail("response looks like an HTML page, not a PDF".to_string()));
    }
    Ok(body.to_vec())
}
