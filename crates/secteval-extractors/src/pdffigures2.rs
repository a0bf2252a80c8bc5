//! The sbt-launched Scala extractor (pdffigures2).
//!
//! One `sbt run` invocation processes the whole batch and drops one JSON
//! file per document into a scratch directory; section titles live at
//! `sections[*].title.text`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use secteval_core::backend::{BackendError, ExtractionResult, SectionExtractor, doc_id_of};

use crate::{join_paths, run_command};

#[derive(Debug)]
pub struct PdfFigures2 {
    home: PathBuf,
    scratch_dir: PathBuf,
}

impl PdfFigures2 {
    pub const NAME: &'static str = "pdffigures2";

    /// `home` is the checkout of the extractor (where `sbt run` works).
    /// The scratch directory is wiped on construction so stale output
    /// from a previous run can never leak into this one.
    pub fn new(home: PathBuf, scratch_dir: PathBuf) -> Result<Self, BackendError> {
        if !home.is_dir() {
            return Err(BackendError::MissingTool {
                tool: Self::NAME.to_string(),
                reason: format!("home directory {} not found", home.display()),
            });
        }
        if scratch_dir.is_dir() {
            for entry in std::fs::read_dir(&scratch_dir)? {
                std::fs::remove_file(entry?.path())?;
            }
        } else {
            std::fs::create_dir_all(&scratch_dir)?;
        }
        Ok(Self { home, scratch_dir })
    }
}

impl SectionExtractor for PdfFigures2 {
    fn get_sections(&self, docs: &[PathBuf]) -> Result<ExtractionResult, BackendError> {
        let mut cmd = Command::new("sbt");
        cmd.current_dir(&self.home).arg(format!(
            "run {} -q -g {}/",
            join_paths(docs),
            self.scratch_dir.display()
        ));
        run_command(&mut cmd)?;

        let mut sections = HashMap::new();
        for entry in std::fs::read_dir(&self.scratch_dir)? {
            let path = entry?.path();
            let content = std::fs::read_to_string(&path)?;
            sections.insert(doc_id_of(&path), sections_from_json(&content, &path)?);
        }
        Ok(sections)
    }
}

/// Parse one per-document output file. Sections without a recognized
/// title are skipped, matching how the tool reports untitled regions.
fn sections_from_json(content: &str, path: &Path) -> Result<Vec<String>, BackendError> {
    let malformed = |reason: String| BackendError::MalformedOutput {
        path: path.to_path_buf(),
        reason,
    };
    let data: serde_json::Value =
        serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;
    let sections = data
        .get("sections")
        .and_then(|s| s.as_array())
        .ok_or_else(|| malformed("missing \"sections\" array".to_string()))?;

    let mut titles = Vec::new();
    for section in sections {
        if let Some(text) = section
            .get("title")
            .and_then(|t| t.get("text"))
            .and_then(|t| t.as_str())
        {
            titles.push(text.to_string());
        }
    }
    Ok(titles)
}
