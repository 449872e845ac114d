//! Entry points that pick a pipeline, resolve where the PDF goes and run it.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::record::Record;
use crate::report::{DirectLayoutBuilder, Pipeline, ReportBuilder, TemplateReportBuilder};
use crate::store::RecordStore;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Default file prefix for the full client report.
pub const DEFAULT_REPORT_PREFIX: &str = "ClientReport";

/// Where a report is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Used verbatim.
    Path(PathBuf),
    /// Written as `{output_dir}/{prefix}.pdf`.
    Prefix(String),
}

impl From<PathBuf> for Destination {
    fn from(path: PathBuf) -> Self {
        Destination::Path(path)
    }
}

impl From<&Path> for Destination {
    fn from(path: &Path) -> Self {
        Destination::Path(path.to_path_buf())
    }
}

impl From<String> for Destination {
    fn from(prefix: String) -> Self {
        Destination::Prefix(prefix)
    }
}

impl From<&str> for Destination {
    fn from(prefix: &str) -> Self {
        Destination::Prefix(prefix.to_string())
    }
}

/// `ClientReport_HTML_20241210.pdf`
pub fn default_template_report_file_name(date: NaiveDate) -> String {
    format!("ClientReport_HTML_{}.pdf", date.format("%Y%m%d"))
}

pub struct ReportDriver<S: RecordStore> {
    store: S,
    config: ReportConfig,
    generated_at: Option<NaiveDateTime>,
}

impl<S: RecordStore> ReportDriver<S> {
    pub fn new(store: S, config: ReportConfig) -> Self {
        Self { store, config, generated_at: None }
    }

    /// Pins the timestamp printed in every report this driver produces.
    pub fn with_timestamp(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn builder(&self, pipeline: Pipeline) -> Box<dyn ReportBuilder> {
        log::debug!("Using the {:?} pipeline", pipeline);
        match pipeline {
            Pipeline::Direct => {
                let builder = DirectLayoutBuilder::new(&self.config);
                Box::new(match self.generated_at {
                    Some(at) => builder.with_timestamp(at),
                    None => builder,
                })
            }
            Pipeline::Template => {
                let builder = TemplateReportBuilder::new(&self.config);
                Box::new(match self.generated_at {
                    Some(at) => builder.with_timestamp(at),
                    None => builder,
                })
            }
        }
    }

    /// Tabular report of `records` written to `destination`.
    pub fn generate_tabular_report(
        &self,
        records: &[Record],
        destination: impl Into<Destination>,
    ) -> Result<PathBuf, ReportError> {
        let path = self.resolve(destination.into())?;
        let written = self.builder(Pipeline::Direct).build(records, &path)?;
        log::info!("Client report with {} record(s) written to {}", records.len(), written.display());
        Ok(written)
    }

    pub fn generate_client_report(&self, records: &[Record]) -> Result<PathBuf, ReportError> {
        self.generate_tabular_report(records, DEFAULT_REPORT_PREFIX)
    }

    /// Report for one client, named after them.
    pub fn generate_single_client_report(&self, record: &Record) -> Result<PathBuf, ReportError> {
        self.generate_tabular_report(std::slice::from_ref(record), record.name.as_str())
    }

    /// Template report over every record in the store.
    pub fn generate_template_report(&self, destination: &Path) -> Result<(), ReportError> {
        let records = self.store.load_all()?;
        self.builder(Pipeline::Template).build(&records, destination)?;
        log::info!("Template report with {} record(s) written to {}", records.len(), destination.display());
        Ok(())
    }

    fn resolve(&self, destination: Destination) -> Result<PathBuf, ReportError> {
        match destination {
            Destination::Path(path) => Ok(path),
            Destination::Prefix(prefix) => {
                std::fs::create_dir_all(&self.config.output_dir)?;
                let file_name: String = prefix
                    .chars()
                    .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
                    .collect();
                Ok(self.config.output_dir.join(format!("{}.pdf", file_name)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(dir: &Path) -> ReportDriver<Vec<Record>> {
        let config = ReportConfig { output_dir: dir.join("out"), ..ReportConfig::default() };
        ReportDriver::new(Vec::new(), config)
    }

    #[test]
    fn template_file_name_uses_compact_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 10).unwrap();
        assert_eq!(default_template_report_file_name(date), "ClientReport_HTML_20241210.pdf");
    }

    #[test]
    fn prefixes_resolve_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(dir.path());
        let path = driver.resolve("Jane Smith".into()).unwrap();
        assert_eq!(path, dir.path().join("out").join("Jane Smith.pdf"));
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn path_separators_in_prefixes_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = driver(dir.path()).resolve("a/b\\c".into()).unwrap();
        assert_eq!(path.file_name().unwrap(), "a_b_c.pdf");
    }

    #[test]
    fn explicit_paths_are_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("elsewhere.pdf");
        assert_eq!(driver(dir.path()).resolve(target.clone().into()).unwrap(), target);
    }
}
