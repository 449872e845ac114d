use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::format::{format_amount, format_currency, short_timestamp};
use crate::layout_engine::LayoutEngine;
use crate::markup::{ConversionContext, convert};
use crate::record::{Record, total_balance};
use crate::report::{REPORT_TITLE, ReportBuilder};
use crate::theme::Theme;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Local, NaiveDateTime};
use client_report_render::LopdfRenderer;
use client_report_types::{LaidOutDocument, PageLayout};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const LOGO_PLACEHOLDER: &str = "{logo-placeholder}";
pub const CLIENT_TABLE_PLACEHOLDER: &str = "{client-table}";
pub const TOTAL_CLIENTS_PLACEHOLDER: &str = "{total-clients}";
pub const TOTAL_BALANCE_PLACEHOLDER: &str = "{total-balance}";
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Builds the client report by filling an XHTML template and converting it.
#[derive(Debug, Clone)]
pub struct TemplateReportBuilder {
    page: PageLayout,
    theme: Theme,
    template_path: PathBuf,
    logo_path: PathBuf,
    generated_at: Option<NaiveDateTime>,
}

impl TemplateReportBuilder {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            page: config.page,
            theme: config.theme,
            template_path: config.template_path.clone(),
            logo_path: config.logo_path.clone(),
            generated_at: None,
        }
    }

    pub fn with_timestamp(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// The `<table>` listing every client. Field values are XML-escaped.
    pub fn client_table_fragment(records: &[Record]) -> String {
        let mut html = String::from("<table><tr><th>Name</th><th>Email</th><th>Phone</th><th>Balance</th></tr>");
        for record in records {
            html.push_str("<tr><td>");
            html.push_str(&escape_xml(&record.name));
            html.push_str("</td><td>");
            html.push_str(&escape_xml(&record.email_address));
            html.push_str("</td><td>");
            html.push_str(&escape_xml(&record.phone_number));
            html.push_str("</td><td style=\"text-align: right\">");
            html.push_str(&escape_xml(&format_currency(record.balance)));
            html.push_str("</td></tr>");
        }
        html.push_str("</table>");
        html
    }

    /// Replaces every occurrence of each token with its value. Tokens
    /// without a value are left untouched.
    pub fn substitute_placeholders(template: &str, values: &[(&str, &str)]) -> String {
        values
            .iter()
            .fold(template.to_string(), |filled, (token, value)| filled.replace(*token, value))
    }

    /// The template with all placeholders filled in. The client table goes in
    /// last so placeholder tokens inside record values stay literal.
    pub fn fill(&self, records: &[Record]) -> Result<String, ReportError> {
        let template = read_asset(&self.template_path, |path| ReportError::TemplateNotFound { path })?;
        let template = String::from_utf8(template)
            .map_err(|e| ReportError::Io(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        let table = Self::client_table_fragment(records);
        let total_clients = records.len().to_string();
        let total = total_balance(records).ok_or(ReportError::TotalOverflow)?;
        let total = format_amount(total);

        let logo = read_asset(&self.logo_path, |path| ReportError::AssetNotFound { path })?;
        let logo = STANDARD.encode(logo);

        let generated_at = self.generated_at.unwrap_or_else(|| Local::now().naive_local());
        let timestamp = short_timestamp(&generated_at);

        Ok(Self::substitute_placeholders(
            &template,
            &[
                (LOGO_PLACEHOLDER, logo.as_str()),
                (TOTAL_CLIENTS_PLACEHOLDER, total_clients.as_str()),
                (TOTAL_BALANCE_PLACEHOLDER, total.as_str()),
                (TIMESTAMP_PLACEHOLDER, timestamp.as_str()),
                (CLIENT_TABLE_PLACEHOLDER, table.as_str()),
            ],
        ))
    }

    pub fn layout(&self, records: &[Record]) -> Result<LaidOutDocument, ReportError> {
        let markup = self.fill(records)?;
        let context = ConversionContext { theme: self.theme, ..ConversionContext::default() };
        let elements = convert(&markup, &context)?;
        let mut engine = LayoutEngine::new(self.page);
        engine.layout_elements(elements);
        let document = engine.into_document(Some(REPORT_TITLE.to_string()));
        log::debug!("Template report laid out on {} page(s)", document.pages.len());
        Ok(document)
    }

    pub fn render(&self, records: &[Record]) -> Result<Vec<u8>, ReportError> {
        let document = self.layout(records)?;
        Ok(LopdfRenderer::new().render(&document)?)
    }
}

impl ReportBuilder for TemplateReportBuilder {
    fn render(&self, records: &[Record]) -> Result<Vec<u8>, ReportError> {
        TemplateReportBuilder::render(self, records)
    }
}

/// Reads a required file, mapping "not found" to `missing(path)`.
fn read_asset(path: &Path, missing: impl FnOnce(PathBuf) -> ReportError) -> Result<Vec<u8>, ReportError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => missing(path.to_path_buf()),
        _ => ReportError::Io(e),
    })
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
