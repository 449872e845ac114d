use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::format::{format_currency, long_timestamp};
use crate::layout_engine::{
    ContainerElement, ImageElement, LayoutElement, LayoutEngine, TableCell, TableElement, TableRow,
};
use crate::record::{Record, total_balance};
use crate::report::{REPORT_TITLE, ReportBuilder};
use crate::theme::Theme;
use chrono::{Local, NaiveDateTime};
use client_report_render::{LopdfRenderer, decode_image};
use client_report_types::{
    Border, Color, ComputedStyle, ImageResource, LaidOutDocument, Margins, PageLayout, TextAlign,
    VerticalAlign,
};
use std::path::PathBuf;
use std::sync::Arc;

const COLUMN_HEADERS: [&str; 7] = [
    "Name",
    "Address",
    "Account Number",
    "Balance",
    "Email Address",
    "Phone Number",
    "Last Transaction",
];
const LOGO_WIDTH: f32 = 100.0;
const BLANK_LINE: f32 = 14.4;

/// Builds the tabular client report directly from layout primitives.
#[derive(Debug, Clone)]
pub struct DirectLayoutBuilder {
    page: PageLayout,
    theme: Theme,
    logo_path: PathBuf,
    generated_at: Option<NaiveDateTime>,
}

impl DirectLayoutBuilder {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            page: config.page,
            theme: config.theme,
            logo_path: config.logo_path.clone(),
            generated_at: None,
        }
    }

    /// Pins the "Generated on" timestamp instead of using the local clock.
    pub fn with_timestamp(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// `Client Report - {name}` for exactly one record, `Client Report` otherwise.
    pub fn title(records: &[Record]) -> String {
        match records {
            [only] => format!("{} - {}", REPORT_TITLE, only.name),
            _ => REPORT_TITLE.to_string(),
        }
    }

    pub fn compose(&self, records: &[Record]) -> Result<Vec<LayoutElement>, ReportError> {
        let generated_at = self.generated_at.unwrap_or_else(|| Local::now().naive_local());
        let mut elements = vec![
            self.header_banner(&Self::title(records)),
            LayoutElement::Spacer(BLANK_LINE),
            LayoutElement::text(
                format!("Generated on: {}", long_timestamp(&generated_at)),
                ComputedStyle::default().font_size(10.0).italic(),
            ),
            LayoutElement::Spacer(BLANK_LINE),
            LayoutElement::Table(self.data_table(records)),
        ];
        if !records.is_empty() {
            let total = total_balance(records).ok_or(ReportError::TotalOverflow)?;
            elements.push(LayoutElement::Table(self.totals_band(total)));
        }
        Ok(elements)
    }

    pub fn layout(&self, records: &[Record]) -> Result<LaidOutDocument, ReportError> {
        let elements = self.compose(records)?;
        let mut engine = LayoutEngine::new(self.page);
        engine.layout_elements(elements);
        let document = engine.into_document(Some(Self::title(records)));
        log::debug!("Laid out {} record(s) on {} page(s)", records.len(), document.pages.len());
        Ok(document)
    }

    pub fn render(&self, records: &[Record]) -> Result<Vec<u8>, ReportError> {
        let document = self.layout(records)?;
        Ok(LopdfRenderer::new().render(&document)?)
    }

    /// The logo, or `None` when it is missing or unreadable. The report is
    /// still produced without it.
    fn load_logo(&self) -> Option<Arc<ImageResource>> {
        let bytes = match std::fs::read(&self.logo_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Logo {} not available, leaving header blank: {}", self.logo_path.display(), e);
                return None;
            }
        };
        match decode_image("logo", &bytes) {
            Ok(resource) => Some(Arc::new(resource)),
            Err(e) => {
                log::warn!("Logo {} could not be decoded, leaving header blank: {}", self.logo_path.display(), e);
                None
            }
        }
    }

    /// Blue banner with the logo on the left and the title on the right.
    fn header_banner(&self, title: &str) -> LayoutElement {
        let cell_style = ComputedStyle::default().vertical_align(VerticalAlign::Middle);

        let mut logo_cell = TableCell::new(cell_style.clone().padding(Margins { right: 10.0, ..Margins::default() }));
        if let Some(resource) = self.load_logo() {
            logo_cell = logo_cell.with(LayoutElement::Image(ImageElement {
                resource,
                style: ComputedStyle::default().width(LOGO_WIDTH),
            }));
        }
        let title_cell = TableCell::new(cell_style.padding(Margins { left: 20.0, ..Margins::default() })).with(
            LayoutElement::text(title, ComputedStyle::default().font_size(24.0).color(Color::WHITE)),
        );

        LayoutElement::Container(ContainerElement {
            children: vec![LayoutElement::Table(TableElement {
                column_widths: vec![1.0, 3.0],
                header_rows: vec![],
                rows: vec![TableRow { cells: vec![logo_cell, title_cell] }],
                style: ComputedStyle::default(),
            })],
            style: ComputedStyle::default()
                .background(self.theme.header_background)
                .padding(Margins::all(20.0)),
        })
    }

    fn data_table(&self, records: &[Record]) -> TableElement {
        let cell_style = ComputedStyle::default()
            .font_size(10.0)
            .padding(Margins::all(5.0))
            .border(Border::thin(Color::BLACK));
        let text_style = ComputedStyle::default().font_size(10.0);

        let header = TableRow {
            cells: COLUMN_HEADERS
                .iter()
                .map(|label| {
                    TableCell::new(cell_style.clone().background(self.theme.header_background)).with(
                        LayoutElement::text(
                            *label,
                            text_style.clone().bold().color(Color::WHITE).align(TextAlign::Center),
                        ),
                    )
                })
                .collect(),
        };

        let rows = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let background = self.theme.row_color(i);
                let cell = |value: String, align: TextAlign| {
                    TableCell::new(cell_style.clone().background(background))
                        .with(LayoutElement::text(value, text_style.clone().align(align)))
                };
                TableRow {
                    cells: vec![
                        cell(record.name.clone(), TextAlign::Left),
                        cell(record.address.clone(), TextAlign::Left),
                        cell(record.account_number.clone(), TextAlign::Left),
                        cell(format_currency(record.balance), TextAlign::Right),
                        cell(record.email_address.clone(), TextAlign::Left),
                        cell(record.phone_number.clone(), TextAlign::Left),
                        cell(record.last_transaction_date.clone(), TextAlign::Left),
                    ],
                }
            })
            .collect();

        TableElement {
            column_widths: vec![],
            header_rows: vec![header],
            rows,
            style: ComputedStyle::default(),
        }
    }

    fn totals_band(&self, total: rust_decimal::Decimal) -> TableElement {
        let cell_style = ComputedStyle::default()
            .background(self.theme.totals_background)
            .padding(Margins::all(10.0));
        let text_style = ComputedStyle::default().font_size(12.0).color(Color::WHITE);

        TableElement {
            column_widths: vec![5.0, 2.0],
            header_rows: vec![],
            rows: vec![TableRow {
                cells: vec![
                    TableCell::new(cell_style.clone()).with(LayoutElement::text("Total Balance", text_style.clone())),
                    TableCell::new(cell_style)
                        .with(LayoutElement::text(format_currency(total), text_style.align(TextAlign::Right))),
                ],
            }],
            style: ComputedStyle::default().margin(Margins { top: 10.0, ..Margins::default() }),
        }
    }
}

impl ReportBuilder for DirectLayoutBuilder {
    fn render(&self, records: &[Record]) -> Result<Vec<u8>, ReportError> {
        DirectLayoutBuilder::render(self, records)
    }
}
