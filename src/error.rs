use crate::config::ConfigError;
use crate::markup::ConversionError;
use crate::store::StoreError;
use client_report_render::RenderError;
use std::path::PathBuf;
use thiserror::Error;

/// Every way producing a report can fail.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Report asset not found: {}", path.display())]
    AssetNotFound { path: PathBuf },

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Template conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Total balance exceeds the representable range")]
    TotalOverflow,
}
