//! The name -> backend registry.
//!
//! An explicit value constructed at startup from the resolved tool
//! locations and passed to whoever resolves extractors by name; there is
//! no process-wide mutable registry.

use std::path::PathBuf;

use thiserror::Error;

use secteval_core::backend::{BackendError, SectionExtractor};

use crate::grobid::Grobid;
use crate::parscit::Parscit;
use crate::pdffigures2::PdfFigures2;

/// Resolved locations of the third-party toolchains, after the
/// CLI-flag / environment / config-file cascade.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub pdffigures2_home: Option<PathBuf>,
    pub grobid_home: Option<PathBuf>,
    pub parscit_home: Option<PathBuf>,
    /// Root for backend scratch and cache directories.
    pub cache_dir: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pdffigures2_home: None,
            grobid_home: None,
            parscit_home: None,
            cache_dir: PathBuf::from("."),
        }
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("no extractor named {name:?} (available: {available})")]
    UnknownExtractor { name: String, available: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

type Builder = fn(&ToolPaths) -> Result<Box<dyn SectionExtractor>, BackendError>;

pub struct ExtractorRegistry {
    tools: ToolPaths,
    entries: Vec<(&'static str, Builder)>,
}

fn require_home(
    home: &Option<PathBuf>,
    tool: &str,
    hint: &str,
) -> Result<PathBuf, BackendError> {
    home.clone().ok_or_else(|| BackendError::MissingTool {
        tool: tool.to_string(),
        reason: format!("home directory not configured ({hint})"),
    })
}

impl ExtractorRegistry {
    pub fn with_defaults(tools: ToolPaths) -> Self {
        let entries: Vec<(&'static str, Builder)> = vec![
            (PdfFigures2::NAME, |t| {
                let home = require_home(
                    &t.pdffigures2_home,
                    PdfFigures2::NAME,
                    "set PDFFIGURES2_HOME or tools.pdffigures2_home",
                )?;
                let scratch = t.cache_dir.join("pdffigures2_scratch");
                Ok(Box::new(PdfFigures2::new(home, scratch)?))
            }),
            (Grobid::NAME, |t| {
                let home = require_home(&t.grobid_home, Grobid::NAME, "set GROBID or tools.grobid_home")?;
                Ok(Box::new(Grobid::new(home, &t.cache_dir, false)?))
            }),
            (Grobid::NAME_NUMBERED, |t| {
                let home = require_home(&t.grobid_home, Grobid::NAME, "set GROBID or tools.grobid_home")?;
                Ok(Box::new(Grobid::new(home, &t.cache_dir, true)?))
            }),
            (Parscit::NAME, |t| {
                let home = require_home(&t.parscit_home, Parscit::NAME, "set PARSCIT or tools.parscit_home")?;
                Ok(Box::new(Parscit::new(home, &t.cache_dir)?))
            }),
        ];
        Self { tools, entries }
    }

    /// Registered names, in display order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    /// Construct the backend registered under `name`.
    pub fn build(&self, name: &str) -> Result<Box<dyn SectionExtractor>, RegistryError> {
        let builder = self
            .entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, b)| *b)
            .ok_or_else(|| RegistryError::UnknownExtractor {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;
        Ok(builder(&self.tools)?)
    }
}
