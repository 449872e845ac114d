//! Flow layout and pagination.
//!
//! Elements are stacked top to bottom inside the page margins. Text breaks
//! between lines, tables break between rows (repeating their header rows on
//! every page they continue onto) and everything else moves to the next page
//! whole when it does not fit.

use client_report_types::{
    ComputedStyle, ImageResource, LaidOutDocument, Page, PageLayout, PositionedContent,
    PositionedElement, Rect, TextAlign, TextLine, VerticalAlign,
};
use std::sync::Arc;

const EPSILON: f32 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutElement {
    Text(TextElement),
    Image(ImageElement),
    Table(TableElement),
    Container(ContainerElement),
    /// Vertical whitespace in points.
    Spacer(f32),
}

impl LayoutElement {
    pub fn text(content: impl Into<String>, style: ComputedStyle) -> Self {
        LayoutElement::Text(TextElement { content: content.into(), style })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextElement {
    pub content: String,
    pub style: ComputedStyle,
}

/// An image drawn at `style.width` (or its pixel width), never wider than the
/// space available. Height follows the aspect ratio.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageElement {
    pub resource: Arc<ImageResource>,
    pub style: ComputedStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableElement {
    /// Relative column weights. Empty means equal columns.
    pub column_widths: Vec<f32>,
    pub header_rows: Vec<TableRow>,
    pub rows: Vec<TableRow>,
    pub style: ComputedStyle,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub content: Vec<LayoutElement>,
    pub style: ComputedStyle,
    pub colspan: usize,
}

impl TableCell {
    pub fn new(style: ComputedStyle) -> Self {
        Self { content: Vec::new(), style, colspan: 1 }
    }

    pub fn with(mut self, element: LayoutElement) -> Self {
        self.content.push(element);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerElement {
    pub children: Vec<LayoutElement>,
    pub style: ComputedStyle,
}

pub struct LayoutEngine {
    pub page_layout: PageLayout,
    pub current_page: usize,
    pub current_y: f32,
    pub current_x: f32,
    current_width: f32,
    pub pages: Vec<Page>,
}

impl LayoutEngine {
    pub fn new(page_layout: PageLayout) -> Self {
        LayoutEngine {
            page_layout,
            current_page: 1,
            current_y: page_layout.margins.top,
            current_x: page_layout.margins.left,
            current_width: page_layout.content_width(),
            pages: vec![Page::new(1)],
        }
    }

    pub fn layout_elements(&mut self, elements: Vec<LayoutElement>) {
        for element in elements {
            self.layout_element(element);
        }
    }

    /// Finishes layout. Trailing blank pages are dropped, but a document always
    /// keeps at least one page.
    pub fn into_document(mut self, title: Option<String>) -> LaidOutDocument {
        while self.pages.len() > 1 && self.pages.last().is_some_and(|p| p.elements.is_empty()) {
            self.pages.pop();
        }
        LaidOutDocument { title, page_layout: self.page_layout, pages: self.pages }
    }

    fn layout_element(&mut self, element: LayoutElement) {
        match element {
            LayoutElement::Text(text) => self.layout_text(text),
            LayoutElement::Table(table) => self.layout_table(table),
            LayoutElement::Container(container) if !is_decorated(&container.style) => {
                self.layout_container(container)
            }
            LayoutElement::Spacer(height) => self.layout_spacer(height),
            other => self.layout_atomic(&other),
        }
    }

    fn layout_text(&mut self, text: TextElement) {
        let style = &text.style;
        let width = self.current_width - style.margin.horizontal();
        let lines = wrap_text(&text.content, style, width - style.padding.horizontal());
        let mut line_cursor = 0;

        while line_cursor < lines.len() {
            let required_space_for_first_line =
                style.margin.vertical() + style.padding.vertical() + style.line_height;
            if self.needs_page_break(required_space_for_first_line) && !self.page_is_pristine() {
                self.new_page();
                continue;
            }

            let available_space = self.page_layout.content_bottom() - self.current_y;
            let space_for_lines =
                available_space - style.margin.vertical() - style.padding.vertical();
            let lines_that_fit = ((space_for_lines + 0.001) / style.line_height).floor().max(1.0) as usize;
            let num_lines_to_draw = (lines.len() - line_cursor).min(lines_that_fit);

            let chunk = &lines[line_cursor..line_cursor + num_lines_to_draw];
            let x = self.current_x + style.margin.left;
            let y = self.current_y + style.margin.top;
            let positioned = position_text(chunk, style, x, y, width);

            self.current_y += positioned.height + style.margin.vertical();
            self.add_element(positioned);
            line_cursor += num_lines_to_draw;

            if line_cursor < lines.len() {
                self.new_page();
            }
        }
    }

    fn layout_table(&mut self, table: TableElement) {
        let style = &table.style;
        let x = self.current_x + style.margin.left;
        let widths = resolve_column_widths(&table, self.current_width - style.margin.horizontal());

        // Keep the header together with the first body row.
        let header_height: f32 = table
            .header_rows
            .iter()
            .map(|row| place_row(row, &widths, x, 0.0).1)
            .sum();
        let first_row_height = table
            .rows
            .first()
            .map_or(0.0, |row| place_row(row, &widths, x, 0.0).1);
        if self.needs_page_break(style.margin.top + header_height + first_row_height)
            && !self.page_is_pristine()
        {
            self.new_page();
        }

        self.current_y += style.margin.top;
        self.place_rows(&table.header_rows, &widths, x);

        for row in &table.rows {
            let (mut elements, mut height) = place_row(row, &widths, x, self.current_y);
            if self.needs_page_break(height) && !self.page_is_pristine() {
                self.new_page();
                self.place_rows(&table.header_rows, &widths, x);
                (elements, height) = place_row(row, &widths, x, self.current_y);
            }
            self.add_elements(elements);
            self.current_y += height;
        }

        self.current_y += style.margin.bottom;
    }

    fn place_rows(&mut self, rows: &[TableRow], widths: &[f32], x: f32) {
        for row in rows {
            let (elements, height) = place_row(row, widths, x, self.current_y);
            self.add_elements(elements);
            self.current_y += height;
        }
    }

    /// Flows the children of an undecorated container so they can span pages.
    fn layout_container(&mut self, container: ContainerElement) {
        let style = &container.style;
        let saved_x = self.current_x;
        let saved_width = self.current_width;

        self.current_y += style.margin.top + style.padding.top;
        self.current_x += style.margin.left + style.padding.left;
        self.current_width -= style.margin.horizontal() + style.padding.horizontal();

        for child in container.children {
            self.layout_element(child);
        }

        self.current_x = saved_x;
        self.current_width = saved_width;
        self.current_y += style.padding.bottom + style.margin.bottom;
    }

    fn layout_spacer(&mut self, height: f32) {
        // Whitespace never starts a page of its own.
        self.current_y = (self.current_y + height).min(self.page_layout.content_bottom());
    }

    /// Places an element that must not be split across pages.
    fn layout_atomic(&mut self, element: &LayoutElement) {
        let (mut elements, mut height) =
            place_block(element, self.current_x, self.current_y, self.current_width);
        if self.needs_page_break(height) && !self.page_is_pristine() {
            self.new_page();
            (elements, height) =
                place_block(element, self.current_x, self.current_y, self.current_width);
        }
        self.add_elements(elements);
        self.current_y += height;
    }

    fn needs_page_break(&self, required_height: f32) -> bool {
        self.current_y + required_height > self.page_layout.content_bottom() + EPSILON
    }

    fn page_is_pristine(&self) -> bool {
        self.pages.last().is_none_or(|p| p.elements.is_empty())
            && self.current_y <= self.page_layout.margins.top + EPSILON
    }

    fn new_page(&mut self) {
        self.current_page += 1;
        self.pages.push(Page::new(self.current_page));
        self.current_y = self.page_layout.margins.top;
        log::debug!("Starting page {}", self.current_page);
    }

    fn add_element(&mut self, element: PositionedElement) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn add_elements(&mut self, elements: Vec<PositionedElement>) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.extend(elements);
        }
    }
}

fn is_decorated(style: &ComputedStyle) -> bool {
    style.background_color.is_some() || style.border.is_some()
}

/// Breaks `text` into lines no wider than `max_width` using the style's font
/// metrics. Explicit `\n` always starts a new line; a word wider than the
/// line is broken between characters.
pub fn wrap_text(text: &str, style: &ComputedStyle, max_width: f32) -> Vec<String> {
    let font = style.font();
    let fits = |s: &str| max_width <= 0.0 || font.text_width(s, style.font_size) <= max_width + EPSILON;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            let test_line = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            if fits(&test_line) {
                current_line = test_line;
                continue;
            }
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            if fits(word) {
                current_line = word.to_string();
                continue;
            }
            for c in word.chars() {
                current_line.push(c);
                if !fits(&current_line) && current_line.chars().count() > 1 {
                    current_line.pop();
                    lines.push(std::mem::replace(&mut current_line, c.to_string()));
                }
            }
        }
        lines.push(current_line);
    }
    lines
}

fn position_text(lines: &[String], style: &ComputedStyle, x: f32, y: f32, width: f32) -> PositionedElement {
    let font = style.font();
    let content_x = x + style.padding.left;
    let content_width = width - style.padding.horizontal();
    let text_lines = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let line_width = font.text_width(line, style.font_size);
            let offset = match style.text_align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((content_width - line_width) / 2.0).max(0.0),
                TextAlign::Right => (content_width - line_width).max(0.0),
            };
            TextLine {
                text: line.clone(),
                x: content_x + offset,
                y: y + style.padding.top + i as f32 * style.line_height,
                width: line_width,
            }
        })
        .collect();

    PositionedElement {
        x,
        y,
        width,
        height: lines.len() as f32 * style.line_height + style.padding.vertical(),
        content: PositionedContent::Text { lines: text_lines },
        style: style.clone(),
    }
}

fn decoration_box(style: &ComputedStyle, bounds: Rect) -> PositionedElement {
    PositionedElement {
        x: bounds.x,
        y: bounds.y,
        width: bounds.width,
        height: bounds.height,
        content: PositionedContent::Box,
        style: style.clone(),
    }
}

fn resolve_column_widths(table: &TableElement, width: f32) -> Vec<f32> {
    let columns = table
        .header_rows
        .iter()
        .chain(&table.rows)
        .map(|row| row.cells.iter().map(|c| c.colspan.max(1)).sum::<usize>())
        .max()
        .unwrap_or(0)
        .max(table.column_widths.len());
    if columns == 0 {
        return Vec::new();
    }

    let weights: Vec<f32> = (0..columns)
        .map(|i| table.column_widths.get(i).copied().filter(|w| *w > 0.0).unwrap_or(1.0))
        .collect();
    let total: f32 = weights.iter().sum();
    weights.iter().map(|w| width * w / total).collect()
}

/// Places an element at `(x, y)` inside a box `width` wide without breaking
/// pages. Returns the positioned elements and the height used, margins included.
fn place_block(element: &LayoutElement, x: f32, y: f32, width: f32) -> (Vec<PositionedElement>, f32) {
    match element {
        LayoutElement::Text(text) => {
            let style = &text.style;
            let inner_width = width - style.margin.horizontal();
            let lines = wrap_text(&text.content, style, inner_width - style.padding.horizontal());
            let positioned = position_text(&lines, style, x + style.margin.left, y + style.margin.top, inner_width);
            let height = positioned.height + style.margin.vertical();
            (vec![positioned], height)
        }
        LayoutElement::Image(image) => {
            let positioned = place_image(image, x, y, width);
            let height = positioned.height + image.style.margin.vertical();
            (vec![positioned], height)
        }
        LayoutElement::Spacer(height) => (Vec::new(), *height),
        LayoutElement::Container(container) => {
            let style = &container.style;
            let inner_x = x + style.margin.left + style.padding.left;
            let inner_width = width - style.margin.horizontal() - style.padding.horizontal();
            let top = y + style.margin.top;
            let mut cursor = top + style.padding.top;
            let mut placed = Vec::new();
            for child in &container.children {
                let (elements, height) = place_block(child, inner_x, cursor, inner_width);
                placed.extend(elements);
                cursor += height;
            }
            let height = cursor - top + style.padding.bottom;
            if is_decorated(style) {
                let bounds = Rect::new(x + style.margin.left, top, width - style.margin.horizontal(), height);
                placed.insert(0, decoration_box(style, bounds));
            }
            (placed, height + style.margin.vertical())
        }
        LayoutElement::Table(table) => {
            let style = &table.style;
            let table_x = x + style.margin.left;
            let widths = resolve_column_widths(table, width - style.margin.horizontal());
            let mut cursor = y + style.margin.top;
            let mut placed = Vec::new();
            for row in table.header_rows.iter().chain(&table.rows) {
                let (elements, height) = place_row(row, &widths, table_x, cursor);
                placed.extend(elements);
                cursor += height;
            }
            (placed, cursor - y + style.margin.bottom)
        }
    }
}

fn place_image(image: &ImageElement, x: f32, y: f32, width: f32) -> PositionedElement {
    let style = &image.style;
    let available = (width - style.margin.horizontal()).max(0.0);
    let image_width = style
        .width
        .unwrap_or(image.resource.width_px as f32)
        .min(available);
    let image_height = image_width * image.resource.aspect_ratio();
    let offset = match style.text_align {
        TextAlign::Left => 0.0,
        TextAlign::Center => (available - image_width) / 2.0,
        TextAlign::Right => available - image_width,
    };
    let bounds = Rect::new(x + style.margin.left + offset, y + style.margin.top, image_width, image_height);

    PositionedElement {
        x: bounds.x,
        y: bounds.y,
        width: bounds.width,
        height: bounds.height,
        content: PositionedContent::Image { resource: image.resource.clone(), bounds },
        style: style.clone(),
    }
}

/// Places one table row. Every cell is stretched to the height of the
/// tallest one; cell content is offset for vertical alignment afterwards.
fn place_row(row: &TableRow, widths: &[f32], x: f32, y: f32) -> (Vec<PositionedElement>, f32) {
    struct PlacedCell<'a> {
        cell: &'a TableCell,
        x: f32,
        width: f32,
        content: Vec<PositionedElement>,
        content_height: f32,
    }

    let mut column = 0;
    let mut cell_x = x;
    let mut row_height = 0.0f32;
    let mut cells = Vec::with_capacity(row.cells.len());

    for cell in &row.cells {
        let span = cell.colspan.max(1);
        let cell_width: f32 = widths.iter().skip(column).take(span).sum();
        column += span;

        let padding = cell.style.padding;
        let top = y + padding.top;
        let mut cursor = top;
        let mut content = Vec::new();
        for child in &cell.content {
            let (elements, height) =
                place_block(child, cell_x + padding.left, cursor, cell_width - padding.horizontal());
            content.extend(elements);
            cursor += height;
        }
        let content_height = cursor - top;
        row_height = row_height.max(content_height + padding.vertical());

        cells.push(PlacedCell { cell, x: cell_x, width: cell_width, content, content_height });
        cell_x += cell_width;
    }
    let row_height = row_height.max(1.0);

    let mut placed = Vec::new();
    for PlacedCell { cell, x, width, mut content, content_height } in cells {
        if is_decorated(&cell.style) {
            placed.push(decoration_box(&cell.style, Rect::new(x, y, width, row_height)));
        }
        if cell.style.vertical_align == VerticalAlign::Middle {
            let slack = row_height - cell.style.padding.vertical() - content_height;
            if slack > EPSILON {
                content.iter_mut().for_each(|el| shift_down(el, slack / 2.0));
            }
        }
        placed.extend(content);
    }
    (placed, row_height)
}

fn shift_down(element: &mut PositionedElement, dy: f32) {
    element.y += dy;
    match &mut element.content {
        PositionedContent::Box => {}
        PositionedContent::Text { lines } => lines.iter_mut().for_each(|line| line.y += dy),
        PositionedContent::Image { bounds, .. } => bounds.y += dy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_report_types::{Border, Color, ImageData, Margins};

    fn cell(text: &str) -> TableCell {
        let style = ComputedStyle::default()
            .font_size(10.0)
            .padding(Margins::all(5.0))
            .border(Border::thin(Color::BLACK));
        TableCell::new(style.clone()).with(LayoutElement::text(text, style.padding(Margins::default())))
    }

    fn table(header: &[&str], rows: usize) -> TableElement {
        TableElement {
            column_widths: vec![],
            header_rows: vec![TableRow { cells: header.iter().map(|h| cell(h)).collect() }],
            rows: (0..rows)
                .map(|i| TableRow { cells: vec![cell(&format!("row {}", i)), cell("x")] })
                .collect(),
            style: ComputedStyle::default(),
        }
    }

    fn texts(page: &Page) -> Vec<String> {
        page.elements.iter().filter_map(PositionedElement::text).collect()
    }

    #[test]
    fn wrap_breaks_between_words() {
        let style = ComputedStyle::default().font_size(10.0);
        let lines = wrap_text("alpha beta gamma delta", &style, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "alpha beta gamma delta");
    }

    #[test]
    fn wrap_breaks_long_words_by_character() {
        let style = ComputedStyle::default().font_size(10.0);
        let lines = wrap_text("m.chang@email.com", &style, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "m.chang@email.com");
        assert!(lines.iter().all(|l| style.font().text_width(l, 10.0) <= 30.0 + EPSILON));
    }

    #[test]
    fn explicit_newlines_are_kept() {
        let style = ComputedStyle::default();
        assert_eq!(wrap_text("a\n\nb", &style, 500.0), vec!["a", "", "b"]);
        assert_eq!(wrap_text("", &style, 500.0), vec![""]);
    }

    #[test]
    fn table_header_repeats_on_every_page() {
        let mut engine = LayoutEngine::new(PageLayout::default());
        engine.layout_elements(vec![LayoutElement::Table(table(&["Name", "Value"], 80))]);
        let doc = engine.into_document(None);

        assert!(doc.pages.len() > 1);
        for page in &doc.pages {
            let page_texts = texts(page);
            assert_eq!(&page_texts[..2], &["Name".to_string(), "Value".to_string()]);
        }
        let body_rows: usize = doc
            .pages
            .iter()
            .map(|p| texts(p).iter().filter(|t| t.starts_with("row ")).count())
            .sum();
        assert_eq!(body_rows, 80);
    }

    #[test]
    fn rows_are_never_split() {
        let layout = PageLayout::default();
        let mut engine = LayoutEngine::new(layout);
        engine.layout_elements(vec![LayoutElement::Table(table(&["Name", "Value"], 120))]);
        for element in engine.into_document(None).elements() {
            assert!(element.y + element.height <= layout.content_bottom() + EPSILON);
        }
    }

    #[test]
    fn table_that_does_not_fit_moves_whole() {
        let mut engine = LayoutEngine::new(PageLayout::default());
        engine.layout_elements(vec![LayoutElement::Spacer(760.0)]);
        let band = TableElement {
            column_widths: vec![5.0, 2.0],
            header_rows: vec![],
            rows: vec![TableRow { cells: vec![cell("Total Balance"), cell("$1.00")] }],
            style: ComputedStyle::default().margin(Margins { top: 10.0, ..Margins::default() }),
        };
        engine.layout_elements(vec![LayoutElement::Table(band)]);
        let doc = engine.into_document(None);
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(texts(&doc.pages[1]), vec!["Total Balance", "$1.00"]);
    }

    #[test]
    fn spacer_never_creates_a_page() {
        let mut engine = LayoutEngine::new(PageLayout::default());
        engine.layout_elements(vec![LayoutElement::Spacer(2000.0)]);
        assert_eq!(engine.into_document(None).pages.len(), 1);
    }

    #[test]
    fn column_weights_split_the_width() {
        let t = TableElement {
            column_widths: vec![1.0, 3.0],
            header_rows: vec![],
            rows: vec![TableRow { cells: vec![cell("a"), cell("b")] }],
            style: ComputedStyle::default(),
        };
        assert_eq!(resolve_column_widths(&t, 400.0), vec![100.0, 300.0]);
    }

    #[test]
    fn middle_aligned_cells_are_centered() {
        let resource = Arc::new(ImageResource {
            key: "logo".into(),
            width_px: 100,
            height_px: 100,
            data: ImageData::Rgb8(vec![0; 100 * 100 * 3]),
        });
        let middle = ComputedStyle::default().vertical_align(VerticalAlign::Middle);
        let row = TableRow {
            cells: vec![
                TableCell::new(middle.clone()).with(LayoutElement::Image(ImageElement {
                    resource,
                    style: ComputedStyle::default().width(100.0),
                })),
                TableCell::new(middle).with(LayoutElement::text("Title", ComputedStyle::default().font_size(20.0))),
            ],
        };
        let (placed, height) = place_row(&row, &[100.0, 300.0], 0.0, 0.0);
        assert_eq!(height, 100.0);
        let title = placed.iter().find(|e| e.text().is_some()).unwrap();
        assert!((title.y - (100.0 - 24.0) / 2.0).abs() < 0.01);
    }

    #[test]
    fn right_aligned_text_ends_at_the_content_edge() {
        let style = ComputedStyle::default().align(TextAlign::Right);
        let el = position_text(&["$10.00".to_string()], &style, 0.0, 0.0, 200.0);
        let PositionedContent::Text { lines } = &el.content else { panic!("not text") };
        assert!((lines[0].x + lines[0].width - 200.0).abs() < 0.01);
    }
}
