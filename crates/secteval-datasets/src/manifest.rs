//! Dataset manifests: which documents exist, where their PDFs live, and
//! where they came from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::DatasetError;

/// On-disk manifest shape: one JSON file per dataset.
#[derive(Debug, Clone, Deserialize)]
struct DatasetManifest {
    name: String,
    /// PDF directory, relative to the manifest file's parent directory.
    pdf_dir: String,
    /// doc_id -> source URL
    documents: BTreeMap<String, String>,
}

/// One dataset: a set of document ids with source URLs and a directory of
/// `<doc_id>.pdf` files.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub pdf_dir: PathBuf,
    pub documents: BTreeMap<String, String>,
}

impl Dataset {
    pub fn load(manifest_path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(manifest_path).map_err(|e| DatasetError::Read {
            path: manifest_path.to_path_buf(),
            source: e,
        })?;
        let manifest: DatasetManifest =
            serde_json::from_str(&content).map_err(|e| DatasetError::Parse {
                path: manifest_path.to_path_buf(),
                source: e,
            })?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self {
            name: manifest.name,
            pdf_dir: base.join(manifest.pdf_dir),
            documents: manifest.documents,
        })
    }

    pub fn pdf_path(&self, doc_id: &str) -> PathBuf {
        self.pdf_dir.join(format!("{doc_id}.pdf"))
    }
}

/// All datasets combined. Construction fails if a document id appears in
/// more than one dataset.
#[derive(Debug, Clone)]
pub struct Corpus {
    datasets: Vec<Dataset>,
    /// doc_id -> index into `datasets`
    owner: BTreeMap<String, usize>,
}

impl Corpus {
    /// Load every `*.json` manifest under `<data_dir>/datasets`.
    pub fn load(data_dir: &Path) -> Result<Self, DatasetError> {
        let manifest_dir = data_dir.join("datasets");
        let mut manifest_paths = Vec::new();
        for entry in std::fs::read_dir(&manifest_dir).map_err(|e| DatasetError::Read {
            path: manifest_dir.clone(),
            source: e,
        })? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                manifest_paths.push(path);
            }
        }
        manifest_paths.sort();
        if manifest_paths.is_empty() {
            return Err(DatasetError::NoDatasets { dir: manifest_dir });
        }

        let mut datasets = Vec::new();
        for path in &manifest_paths {
            datasets.push(Dataset::load(path)?);
        }
        tracing::info!(
            datasets = datasets.len(),
            dir = %manifest_dir.display(),
            "loaded dataset manifests"
        );
        Self::from_datasets(datasets)
    }

    pub fn from_datasets(datasets: Vec<Dataset>) -> Result<Self, DatasetError> {
        let mut owner: BTreeMap<String, usize> = BTreeMap::new();
        for (i, dataset) in datasets.iter().enumerate() {
            for doc_id in dataset.documents.keys() {
                if let Some(&first) = owner.get(doc_id) {
                    return Err(DatasetError::DuplicateDocId {
                        doc_id: doc_id.clone(),
                        first: datasets[first].name.clone(),
                        second: dataset.name.clone(),
                    });
                }
                owner.insert(doc_id.clone(), i);
            }
        }
        Ok(Self { datasets, owner })
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.owner.contains_key(doc_id)
    }

    /// Source URL per document id, over all datasets.
    pub fn urls(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for dataset in &self.datasets {
            for (doc_id, url) in &dataset.documents {
                map.insert(doc_id.clone(), url.clone());
            }
        }
        map
    }

    /// Local PDF path per document id, over all datasets.
    pub fn pdf_files(&self) -> BTreeMap<String, PathBuf> {
        let mut map = BTreeMap::new();
        for dataset in &self.datasets {
            for doc_id in dataset.documents.keys() {
                map.insert(doc_id.clone(), dataset.pdf_path(doc_id));
            }
        }
        map
    }
}
