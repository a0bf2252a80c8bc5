use std::path::PathBuf;
use std::process::Command;

use secteval_core::BackendError;

pub mod grobid;
pub mod parscit;
pub mod pdffigures2;
pub mod registry;

pub use grobid::Grobid;
pub use parscit::Parscit;
pub use pdffigures2::PdfFigures2;
pub use registry::{ExtractorRegistry, RegistryError, ToolPaths};

/// Render a command for error messages and logs: program plus arguments,
/// space-joined.
pub(crate) fn render_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run an external tool to completion. A non-zero exit status is fatal
/// for the invocation and surfaces the full command line.
pub(crate) fn run_command(cmd: &mut Command) -> Result<(), BackendError> {
    let rendered = render_command(cmd);
    tracing::info!(command = %rendered, "invoking extractor tool");
    let status = cmd.status()?;
    if !status.success() {
        return Err(BackendError::CommandFailed {
            status: status.code().unwrap_or(-1),
            command: rendered,
        });
    }
    Ok(())
}

/// Join PDF paths into the comma-separated list the pdffigures2 CLI takes.
pub(crate) fn join_paths(docs: &[PathBuf]) -> String {
    docs.iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(",")
}
