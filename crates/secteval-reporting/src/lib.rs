pub mod export;

pub use export::{ExportError, ExportFormat, export_results};
