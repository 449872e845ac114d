//! Conversion of filled XHTML report templates into layout elements.
//!
//! Only the subset of XHTML that report templates use is understood: block
//! containers, headings, paragraphs, tables, inline `data:` images and a few
//! inline CSS properties. Anything else is flattened to its text.

use crate::layout_engine::{
    ContainerElement, ImageElement, LayoutElement, TableCell, TableElement, TableRow,
};
use crate::theme::Theme;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use client_report_render::{RenderError, decode_image};
use client_report_types::{
    Border, Color, ComputedStyle, FontStyle, FontWeight, Margins, TextAlign, VerticalAlign,
};
use roxmltree::{Node, ParsingOptions};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Markup is not well-formed XHTML: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Invalid data URI in <img>: {0}")]
    InvalidDataUri(String),

    #[error("Inline image could not be decoded: {0}")]
    Image(#[from] RenderError),
}

/// Styling inputs for a conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionContext {
    pub theme: Theme,
    pub base_style: ComputedStyle,
}

/// Parses `markup` and converts its body into layout elements.
pub fn convert(markup: &str, context: &ConversionContext) -> Result<Vec<LayoutElement>, ConversionError> {
    let options = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
    let document = roxmltree::Document::parse_with_options(markup, options)?;
    let root = document.root_element();
    let body = root.descendants().find(|n| n.is_element() && tag(*n) == "body");

    let mut converter = Converter { context, image_count: 0 };
    let elements = match body {
        Some(body) => {
            let style = apply_css(context.base_style.clone(), body.attribute("style"));
            converter.convert_children(body, &style)?
        }
        None if tag(root) == "html" => {
            let style = apply_css(context.base_style.clone(), root.attribute("style"));
            converter.convert_children(root, &style)?
        }
        // A fragment: the root element is itself content.
        None => converter.convert_block(root, &context.base_style)?.into_iter().collect(),
    };
    log::debug!("Converted markup into {} top-level element(s)", elements.len());
    Ok(elements)
}

struct Converter<'a> {
    context: &'a ConversionContext,
    image_count: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Skip,
    Block,
    Inline,
}

fn kind(node: Node) -> Kind {
    if node.is_text() {
        return Kind::Inline;
    }
    if !node.is_element() {
        return Kind::Skip;
    }
    match tag(node).as_str() {
        "head" | "style" | "script" | "title" | "meta" | "link" => Kind::Skip,
        "span" | "strong" | "b" | "em" | "i" | "a" | "small" | "u" => Kind::Inline,
        _ => Kind::Block,
    }
}

fn tag(node: Node) -> String {
    node.tag_name().name().to_ascii_lowercase()
}

impl Converter<'_> {
    /// Converts the children of a block. Consecutive inline content is
    /// gathered into one anonymous paragraph.
    fn convert_children(&mut self, parent: Node, style: &ComputedStyle) -> Result<Vec<LayoutElement>, ConversionError> {
        let mut elements = Vec::new();
        let mut inline_run: Vec<Node> = Vec::new();

        for child in parent.children() {
            match kind(child) {
                Kind::Skip => {}
                Kind::Inline => inline_run.push(child),
                Kind::Block => {
                    self.flush_inline(&mut inline_run, style, &mut elements);
                    if let Some(element) = self.convert_block(child, style)? {
                        elements.push(element);
                    }
                }
            }
        }
        self.flush_inline(&mut inline_run, style, &mut elements);
        Ok(elements)
    }

    fn flush_inline(&self, run: &mut Vec<Node>, style: &ComputedStyle, out: &mut Vec<LayoutElement>) {
        if run.is_empty() {
            return;
        }
        let text = inline_text(run);
        let style = inline_style(run, style.clone());
        run.clear();
        if !text.trim().is_empty() {
            out.push(LayoutElement::text(text, style.margin(Margins::default()).padding(Margins::default())));
        }
    }

    fn convert_block(&mut self, node: Node, inherited: &ComputedStyle) -> Result<Option<LayoutElement>, ConversionError> {
        let name = tag(node);
        let inheritable = inherit(inherited);
        let element = match name.as_str() {
            "h1" | "h2" | "h3" | "h4" | "p" => {
                let defaults = match name.as_str() {
                    "h1" => inheritable.font_size(24.0).bold().margin(Margins { bottom: 12.0, ..Margins::default() }),
                    "h2" => inheritable.font_size(18.0).bold().margin(Margins { bottom: 10.0, ..Margins::default() }),
                    "h3" | "h4" => inheritable.font_size(14.0).bold().margin(Margins { bottom: 8.0, ..Margins::default() }),
                    _ => inheritable.margin(Margins { bottom: 8.0, ..Margins::default() }),
                };
                let style = apply_css(defaults, node.attribute("style"));
                let children: Vec<Node> = node.children().filter(|c| kind(*c) != Kind::Skip).collect();
                if children.iter().any(|c| kind(*c) == Kind::Block) {
                    let nested = self.convert_children(node, &style)?;
                    LayoutElement::Container(ContainerElement { children: nested, style: block_box(&style) })
                } else {
                    let style = inline_style(&children, style);
                    LayoutElement::text(inline_text(&children), style)
                }
            }
            "br" => LayoutElement::Spacer(inherited.line_height),
            "hr" => {
                let style = inheritable
                    .margin(Margins { top: 6.0, bottom: 6.0, ..Margins::default() })
                    .background(Color::gray(189));
                LayoutElement::Container(ContainerElement {
                    children: vec![LayoutElement::Spacer(1.0)],
                    style: apply_css(style, node.attribute("style")),
                })
            }
            "img" => match self.convert_image(node, &inheritable)? {
                Some(image) => image,
                None => return Ok(None),
            },
            "table" => LayoutElement::Table(self.convert_table(node, &inheritable)?),
            // html, body, div, section, header, footer, main and unknown blocks
            _ => {
                let style = apply_css(inheritable, node.attribute("style"));
                let children = self.convert_children(node, &style)?;
                if children.is_empty() && style.background_color.is_none() {
                    return Ok(None);
                }
                LayoutElement::Container(ContainerElement { children, style: block_box(&style) })
            }
        };
        Ok(Some(element))
    }

    fn convert_image(&mut self, node: Node, style: &ComputedStyle) -> Result<Option<LayoutElement>, ConversionError> {
        let src = node.attribute("src").unwrap_or_default();
        let Some(payload) = src.strip_prefix("data:") else {
            log::warn!("Skipping <img> with unsupported source '{}'", truncate(src));
            return Ok(None);
        };
        let (media, data) = payload
            .split_once(',')
            .ok_or_else(|| ConversionError::InvalidDataUri(truncate(src)))?;
        if !media.ends_with(";base64") {
            return Err(ConversionError::InvalidDataUri(truncate(src)));
        }
        let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ConversionError::InvalidDataUri(e.to_string()))?;

        self.image_count += 1;
        let resource = decode_image(&format!("inline-{}", self.image_count), &bytes)?;

        let mut style = apply_css(style.clone().margin(Margins::default()), node.attribute("style"));
        if let Some(width) = node.attribute("width").and_then(parse_length) {
            style.width = Some(width);
        }
        Ok(Some(LayoutElement::Image(ImageElement { resource: Arc::new(resource), style })))
    }

    fn convert_table(&mut self, node: Node, inherited: &ComputedStyle) -> Result<TableElement, ConversionError> {
        let theme = self.context.theme;
        let table_style = apply_css(
            inherited.clone().font_size(10.0).margin(Margins { bottom: 10.0, ..Margins::default() }),
            node.attribute("style"),
        );
        let cell_base = inherit(&table_style)
            .padding(Margins::all(5.0))
            .border(Border::thin(Color::gray(189)));

        let mut header_rows = Vec::new();
        let mut rows = Vec::new();
        let mut column_widths = Vec::new();

        for (row_node, in_head) in table_rows(node) {
            let cells: Vec<Node> = row_node
                .children()
                .filter(|c| c.is_element() && matches!(tag(*c).as_str(), "td" | "th"))
                .collect();
            if cells.is_empty() {
                continue;
            }
            let is_header = in_head || cells.iter().all(|c| tag(*c) == "th");
            let row_background = css_value(row_node.attribute("style"), "background-color").and_then(parse_color);
            let background = if is_header {
                theme.header_background
            } else {
                row_background.unwrap_or_else(|| theme.row_color(rows.len()))
            };

            if column_widths.is_empty() {
                column_widths = cells
                    .iter()
                    .map(|c| {
                        c.attribute("width")
                            .or_else(|| css_value(c.attribute("style"), "width"))
                            .and_then(parse_weight)
                            .unwrap_or(0.0)
                    })
                    .collect();
            }

            let mut row = TableRow::default();
            for cell_node in cells {
                let mut style = cell_base.clone().background(background);
                if is_header || tag(cell_node) == "th" {
                    style = style.bold().align(TextAlign::Center);
                    if is_header {
                        style = style.color(Color::WHITE);
                    }
                }
                let style = apply_css(style, cell_node.attribute("style"));
                let text_style = inherit(&style);
                let content = self.convert_children(cell_node, &text_style)?;
                let colspan = cell_node
                    .attribute("colspan")
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .unwrap_or(1);
                row.cells.push(TableCell { content, style, colspan });
            }

            if is_header {
                header_rows.push(row);
            } else {
                rows.push(row);
            }
        }

        if column_widths.iter().all(|w| *w <= 0.0) {
            column_widths.clear();
        }
        Ok(TableElement { column_widths, header_rows, rows, style: block_box(&table_style) })
    }
}

/// Rows of a table in document order, flagged when they sit in `<thead>`.
fn table_rows<'a, 'input>(table: Node<'a, 'input>) -> Vec<(Node<'a, 'input>, bool)> {
    let mut rows = Vec::new();
    for child in table.children().filter(|c| c.is_element()) {
        match tag(child).as_str() {
            "tr" => rows.push((child, false)),
            section @ ("thead" | "tbody" | "tfoot") => {
                let in_head = section == "thead";
                rows.extend(
                    child
                        .children()
                        .filter(|c| c.is_element() && tag(*c) == "tr")
                        .map(|tr| (tr, in_head)),
                );
            }
            _ => {}
        }
    }
    rows
}

/// Text properties passed from a block to its children. Box properties are not.
fn inherit(style: &ComputedStyle) -> ComputedStyle {
    ComputedStyle {
        font_size: style.font_size,
        font_weight: style.font_weight,
        font_style: style.font_style,
        line_height: style.line_height,
        text_align: style.text_align,
        color: style.color,
        ..ComputedStyle::default()
    }
}

/// Container styles keep box properties only; text style lives on the children.
fn block_box(style: &ComputedStyle) -> ComputedStyle {
    ComputedStyle {
        margin: style.margin,
        padding: style.padding,
        background_color: style.background_color,
        border: style.border,
        width: style.width,
        ..ComputedStyle::default()
    }
}

/// Flattens inline nodes to text. Whitespace collapses as in HTML and `<br/>`
/// becomes a line break.
fn inline_text(nodes: &[Node]) -> String {
    fn collect(node: Node, out: &mut String) {
        if node.is_text() {
            // Source line breaks are plain whitespace; only <br/> breaks a line.
            out.extend(node.text().unwrap_or_default().chars().map(|c| if c == '\n' { ' ' } else { c }));
        } else if node.is_element() {
            match tag(node).as_str() {
                "br" => out.push('\n'),
                "head" | "style" | "script" => {}
                _ => node.children().for_each(|c| collect(c, out)),
            }
        }
    }

    let mut raw = String::new();
    for node in nodes {
        collect(*node, &mut raw);
    }
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// When a run consists of a single styled inline element (for example
/// `<strong>Total</strong>`), its style applies to the whole run.
fn inline_style(nodes: &[Node], style: ComputedStyle) -> ComputedStyle {
    let meaningful: Vec<&Node> = nodes
        .iter()
        .filter(|n| !(n.is_text() && n.text().is_none_or(|t| t.trim().is_empty())))
        .collect();
    let [only] = meaningful.as_slice() else {
        return style;
    };
    if !only.is_element() {
        return style;
    }
    let style = match tag(**only).as_str() {
        "strong" | "b" => style.bold(),
        "em" | "i" => style.italic(),
        _ => style,
    };
    let style = apply_css(style, only.attribute("style"));
    let children: Vec<Node> = only.children().collect();
    inline_style(&children, style)
}

fn css_value<'a>(css: Option<&'a str>, property: &str) -> Option<&'a str> {
    css?.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim().eq_ignore_ascii_case(property).then(|| value.trim())
    })
}

/// Applies the supported subset of an inline `style` attribute.
fn apply_css(mut style: ComputedStyle, css: Option<&str>) -> ComputedStyle {
    let Some(css) = css else {
        return style;
    };
    for declaration in css.split(';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        match name.as_str() {
            "background-color" | "background" => {
                if let Some(color) = parse_color(value) {
                    style.background_color = Some(color);
                }
            }
            "color" => {
                if let Some(color) = parse_color(value) {
                    style.color = color;
                }
            }
            "font-size" => {
                if let Some(size) = parse_length(value) {
                    style = style.font_size(size);
                }
            }
            "font-weight" => {
                style.font_weight = match value.to_ascii_lowercase().as_str() {
                    "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                    _ => FontWeight::Regular,
                }
            }
            "font-style" => {
                style.font_style = match value.to_ascii_lowercase().as_str() {
                    "italic" | "oblique" => FontStyle::Italic,
                    _ => FontStyle::Normal,
                }
            }
            "text-align" => match value.to_ascii_lowercase().as_str() {
                "center" => style.text_align = TextAlign::Center,
                "right" | "end" => style.text_align = TextAlign::Right,
                "left" | "start" => style.text_align = TextAlign::Left,
                _ => {}
            },
            "vertical-align" => {
                if value.eq_ignore_ascii_case("middle") {
                    style.vertical_align = VerticalAlign::Middle;
                }
            }
            "padding" => {
                if let Some(padding) = parse_box(value) {
                    style.padding = padding;
                }
            }
            "margin" => {
                if let Some(margin) = parse_box(value) {
                    style.margin = margin;
                }
            }
            "margin-top" => style.margin.top = parse_length(value).unwrap_or(style.margin.top),
            "margin-bottom" => style.margin.bottom = parse_length(value).unwrap_or(style.margin.bottom),
            "width" => {
                if let Some(width) = parse_length(value) {
                    style.width = Some(width);
                }
            }
            "border" if value.eq_ignore_ascii_case("none") || value == "0" => style.border = None,
            other => log::debug!("Ignoring unsupported CSS property '{}'", other),
        }
    }
    style
}

/// A CSS length in points. Percentages are not lengths.
fn parse_length(s: &str) -> Option<f32> {
    let s = s.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(v) = s.strip_suffix("pt") {
        (v, 1.0)
    } else if let Some(v) = s.strip_suffix("px") {
        (v, 0.75)
    } else if let Some(v) = s.strip_suffix("in") {
        (v, 72.0)
    } else if let Some(v) = s.strip_suffix("cm") {
        (v, 28.35)
    } else if let Some(v) = s.strip_suffix("mm") {
        (v, 2.835)
    } else {
        // Unitless values are taken as pixels, as HTML attributes are.
        (s.as_str(), 0.75)
    };
    number.trim().parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v * scale)
}

/// A column width as a relative weight: `25%` and `120px` both work.
fn parse_weight(s: &str) -> Option<f32> {
    match s.trim().strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f32>().ok().filter(|v| *v > 0.0),
        None => parse_length(s),
    }
}

/// `padding`/`margin` shorthand with one to four values.
fn parse_box(s: &str) -> Option<Margins> {
    let values: Vec<f32> = s.split_whitespace().map(parse_length).collect::<Option<_>>()?;
    let (top, right, bottom, left) = match values.as_slice() {
        [all] => (*all, *all, *all, *all),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l] => (*t, *r, *b, *l),
        _ => return None,
    };
    Some(Margins { top, right, bottom, left })
}

fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim().to_ascii_lowercase();
    if s.starts_with('#') {
        return s.parse().ok();
    }
    if let Some(args) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<u8> = args.split(',').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
        return match parts.as_slice() {
            [r, g, b] => Some(Color::rgb(*r, *g, *b)),
            _ => None,
        };
    }
    match s.as_str() {
        "black" => Some(Color::BLACK),
        "white" => Some(Color::WHITE),
        "gray" | "grey" => Some(Color::gray(128)),
        "lightgray" | "lightgrey" => Some(Color::gray(211)),
        "red" => Some(Color::rgb(255, 0, 0)),
        "green" => Some(Color::rgb(0, 128, 0)),
        "blue" => Some(Color::rgb(0, 0, 255)),
        "navy" => Some(Color::rgb(0, 0, 128)),
        _ => None,
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(40).collect()
}
