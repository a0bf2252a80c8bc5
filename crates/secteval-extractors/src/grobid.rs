//! GROBID backend: batch full-text processing via the one-jar build,
//! with a version-keyed disk cache of TEI output.
//!
//! Tested against GROBID 0.4; newer releases changed the TEI shape for
//! numbered sections and will not be scored correctly.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use secteval_core::backend::{BackendError, ExtractionResult, SectionExtractor, doc_id_of};

use crate::run_command;

/// Numbered section heads start like "1", "2.", "31.", per the TEI output
/// of the supported GROBID version.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+([0-9]+\.)*").unwrap());

#[derive(Debug)]
pub struct Grobid {
    jar: PathBuf,
    grobid_home: PathBuf,
    cache_dir: PathBuf,
    numbered_only: bool,
}

impl Grobid {
    pub const NAME: &'static str = "grobid";
    pub const NAME_NUMBERED: &'static str = "grobid-numbered";

    pub fn new(home: PathBuf, cache_root: &Path, numbered_only: bool) -> Result<Self, BackendError> {
        let tool_error = |reason: String| BackendError::MissingTool {
            tool: Self::NAME.to_string(),
            reason,
        };
        let target_dir = home.join("grobid-core").join("target");
        let mut jars = Vec::new();
        for entry in std::fs::read_dir(&target_dir).map_err(|e| {
            tool_error(format!("cannot read {}: {e}", target_dir.display()))
        })? {
            let path = entry?.path();
            if path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with("one-jar.jar"))
            {
                jars.push(path);
            }
        }
        let jar = match jars.len() {
            0 => {
                return Err(tool_error(format!(
                    "one-jar jar file not found in {} (GROBID not compiled?)",
                    target_dir.display()
                )));
            }
            1 => jars.remove(0),
            _ => {
                return Err(tool_error(format!(
                    "multiple one-jar jars found: {}",
                    jars.iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        };
        let version = version_from_jar_name(&jar).ok_or_else(|| {
            tool_error(format!(
                "cannot derive GROBID version from jar name {}",
                jar.display()
            ))
        })?;
        Ok(Self {
            jar,
            grobid_home: home.join("grobid-home"),
            cache_dir: cache_root.join(format!("grobid_cache_{version}")),
            numbered_only,
        })
    }

    fn cached_tei(&self, doc_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{doc_id}.tei.xml"))
    }

    /// Run GROBID over every document not already cached. GROBID takes an
    /// input directory, not a file list, so uncached PDFs are copied into
    /// a temp directory for the single batch invocation.
    fn build_cache(&self, docs: &[PathBuf]) -> Result<(), BackendError> {
        if !self.cache_dir.is_dir() {
            tracing::info!(cache = %self.cache_dir.display(), "cache not found, rebuilding");
            std::fs::create_dir_all(&self.cache_dir)?;
        }
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if !path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(".tei.xml"))
            {
                return Err(BackendError::MalformedOutput {
                    path,
                    reason: "unexpected file in cache".to_string(),
                });
            }
        }

        let to_add: Vec<&PathBuf> = docs
            .iter()
            .filter(|p| !self.cached_tei(&doc_id_of(p)).is_file())
            .collect();
        if to_add.is_empty() {
            return Ok(());
        }

        let input_dir = tempfile::tempdir()?;
        for pdf in &to_add {
            let file_name = pdf.file_name().ok_or_else(|| BackendError::MalformedOutput {
                path: pdf.to_path_buf(),
                reason: "PDF path has no file name".to_string(),
            })?;
            std::fs::copy(pdf, input_dir.path().join(file_name))?;
        }

        let mut cmd = Command::new("java");
        cmd.arg("-Xmx1024m")
            .arg("-jar")
            .arg(&self.jar)
            .arg("-gH")
            .arg(&self.grobid_home)
            .arg("-dIn")
            .arg(input_dir.path())
            .arg("-dOut")
            .arg(&self.cache_dir)
            .arg("-exe")
            .arg("processFullText")
            .arg("-ignoreAssets");
        run_command(&mut cmd)
    }
}

impl SectionExtractor for Grobid {
    fn get_sections(&self, docs: &[PathBuf]) -> Result<ExtractionResult, BackendError> {
        self.build_cache(docs)?;
        let mut sections = HashMap::new();
        for doc in docs {
            let doc_id = doc_id_of(doc);
            let tei = self.cached_tei(&doc_id);
            let content = std::fs::read_to_string(&tei)?;
            sections.insert(doc_id, sections_from_tei(content.as_bytes(), self.numbered_only));
        }
        Ok(sections)
    }
}

/// Version segment of `grobid-core-<version>.one-jar.jar`.
fn version_from_jar_name(jar: &Path) -> Option<String> {
    let name = jar.file_name()?.to_str()?;
    let rest = name.strip_prefix("grobid-core-")?;
    let version = rest.strip_suffix(".one-jar.jar")?;
    (!version.is_empty()).then(|| version.to_string())
}

/// Pull section heads out of a GROBID TEI document: the text of each
/// `<head>` that is a direct child of a top-level `<div>` under `<body>`.
///
/// Obviously bad heads are pruned — no alphabetic character, or a single
/// character. With `numbered_only`, heads not starting with a section
/// number are dropped as well.
pub(crate) fn sections_from_tei<R: BufRead>(reader: R, numbered_only: bool) -> Vec<String> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut head_text = String::new();
    let mut head_depth: u32 = 0;
    let mut sections = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag = local_name(e.name().as_ref());
                if head_depth > 0 {
                    head_depth += 1;
                } else if tag == "head" && stack_is_body_div(&stack) {
                    head_depth = 1;
                    head_text.clear();
                }
                stack.push(tag);
            }
            Ok(Event::Text(ref e)) => {
                if head_depth > 0 {
                    head_text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
                if head_depth > 0 {
                    head_depth -= 1;
                    if head_depth == 0 {
                        if keep_head(&head_text, numbered_only) {
                            sections.push(head_text.clone());
                        }
                        head_text.clear();
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    sections
}

/// Strip a namespace prefix: `tei:head` -> `head`.
fn local_name(qname: &[u8]) -> String {
    let name = String::from_utf8_lossy(qname);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

/// The head's parent must be a `<div>` directly under `<body>`; heads of
/// nested sub-divs belong to subsections the annotations don't cover.
fn stack_is_body_div(stack: &[String]) -> bool {
    matches!(
        stack,
        [.., grandparent, parent] if grandparent == "body" && parent == "div"
    )
}

fn keep_head(text: &str, numbered_only: bool) -> bool {
    if text.is_empty() {
        return false;
    }
    if numbered_only && !NUMBER_RE.is_match(text) {
        return false;
    }
    // Prune obviously bad headers
    text.chars().any(|c| c.is_alphabetic()) && text.chars().count() > 1
}
