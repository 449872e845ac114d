//! Client account-balance PDF reports.
//!
//! Two pipelines produce the report: [`report::DirectLayoutBuilder`] composes
//! the document in code, [`report::TemplateReportBuilder`] fills an XHTML
//! template and converts it. [`driver::ReportDriver`] ties them to a
//! [`store::RecordStore`] and the output directory.

pub mod config;
pub mod driver;
pub mod error;
pub mod format;
pub mod layout_engine;
pub mod markup;
pub mod record;
pub mod report;
pub mod store;
pub mod theme;

pub use config::{ConfigError, ReportConfig};
pub use driver::{Destination, ReportDriver, default_template_report_file_name};
pub use error::ReportError;
pub use format::{format_amount, format_currency};
pub use record::{Record, total_balance};
pub use report::{DirectLayoutBuilder, Pipeline, ReportBuilder, TemplateReportBuilder};
pub use store::{RecordStore, SqliteRecordStore, StoreError, sample_records};
pub use theme::Theme;
