//! The two report pipelines behind a single [`ReportBuilder`] capability.

pub mod direct;
pub mod output;
pub mod template;

pub use direct::DirectLayoutBuilder;
pub use template::TemplateReportBuilder;

use crate::error::ReportError;
use crate::record::Record;
use std::path::{Path, PathBuf};

/// Title used when a report is not about a single client.
pub const REPORT_TITLE: &str = "Client Report";

/// Produces a finished PDF for a list of records.
pub trait ReportBuilder {
    /// Renders the report into an in-memory PDF.
    fn render(&self, records: &[Record]) -> Result<Vec<u8>, ReportError>;

    /// Renders the report and writes it to `destination`, replacing any
    /// existing file. Nothing is written if rendering fails.
    fn build(&self, records: &[Record], destination: &Path) -> Result<PathBuf, ReportError> {
        let bytes = self.render(records)?;
        output::write_atomically(destination, &bytes)?;
        Ok(destination.to_path_buf())
    }
}

/// Which pipeline produces a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Document composed in code.
    Direct,
    /// XHTML template filled with values and converted.
    Template,
}
