//! ParsCit backend: `pdftotext` into the perl `citeExtract.pl` script,
//! one document at a time, with an id-keyed XML cache.
//!
//! Section quality from ParsCit is known to be rough when fed pdftotext
//! output; it is kept for comparison against the structured-PDF tools.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

use quick_xml::Reader;
use quick_xml::events::Event;

use secteval_core::backend::{BackendError, ExtractionResult, SectionExtractor, doc_id_of};

use crate::run_command;

#[derive(Debug)]
pub struct Parscit {
    script: PathBuf,
    cache_dir: PathBuf,
}

impl Parscit {
    pub const NAME: &'static str = "parscit";

    pub fn new(home: PathBuf, cache_root: &Path) -> Result<Self, BackendError> {
        let script = home.join("bin").join("citeExtract.pl");
        if !script.is_file() {
            return Err(BackendError::MissingTool {
                tool: Self::NAME.to_string(),
                reason: format!("{} not found", script.display()),
            });
        }
        Ok(Self {
            script,
            cache_dir: cache_root.join("parscit_cache"),
        })
    }

    fn cached_xml(&self, doc_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{doc_id}.xml"))
    }

    fn build_cache(&self, docs: &[PathBuf]) -> Result<(), BackendError> {
        if !self.cache_dir.is_dir() {
            tracing::info!(cache = %self.cache_dir.display(), "cache not found, rebuilding");
            std::fs::create_dir_all(&self.cache_dir)?;
        }
        for pdf in docs {
            let doc_id = doc_id_of(pdf);
            let output = self.cached_xml(&doc_id);
            if output.is_file() {
                continue;
            }
            tracing::info!(doc_id = %doc_id, "running parscit");
            let text_file = tempfile::NamedTempFile::new()?;
            run_command(Command::new("pdftotext").arg(pdf).arg(text_file.path()))?;
            run_command(
                Command::new("perl")
                    .arg(&self.script)
                    .arg("-m")
                    .arg("extract_section")
                    .arg("-i")
                    .arg("raw")
                    .arg(text_file.path())
                    .arg(&output),
            )?;
        }
        Ok(())
    }
}

impl SectionExtractor for Parscit {
    fn get_sections(&self, docs: &[PathBuf]) -> Result<ExtractionResult, BackendError> {
        self.build_cache(docs)?;
        let mut sections = HashMap::new();
        for doc in docs {
            let doc_id = doc_id_of(doc);
            let content = std::fs::read_to_string(self.cached_xml(&doc_id))?;
            sections.insert(doc_id, sections_from_xml(content.as_bytes()));
        }
        Ok(sections)
    }
}

/// The text of every `<sectionHeader>` node, trimmed.
pub(crate) fn sections_from_xml<R: BufRead>(reader: R) -> Vec<String> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut in_header = false;
    let mut header_text = String::new();
    let mut sections = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"sectionHeader" {
                    in_header = true;
                    header_text.clear();
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_header {
                    header_text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"sectionHeader" && in_header {
                    in_header = false;
                    sections.push(header_text.trim().to_string());
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
