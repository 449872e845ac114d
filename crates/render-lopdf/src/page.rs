//! Drawing of positioned elements into a single page content stream.

use crate::error::RenderError;
use crate::writer::to_win_ansi;
use client_report_types::{
    BuiltinFont, Color, ImageResource, PositionedContent, PositionedElement, Rect, TextLine,
};
use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};
use std::collections::HashMap;

#[derive(Default, Clone, PartialEq)]
struct PageRenderState {
    font: Option<BuiltinFont>,
    font_size: f32,
    fill_color: Option<Color>,
}

/// Converts layout coordinates (top-left origin) into PDF operations
/// (bottom-left origin) for one page.
pub(crate) struct PageContext<'a> {
    page_height: f32,
    content: Content,
    state: PageRenderState,
    image_names: &'a HashMap<String, String>,
}

impl<'a> PageContext<'a> {
    pub fn new(page_height: f32, image_names: &'a HashMap<String, String>) -> Self {
        Self {
            page_height,
            content: Content { operations: vec![] },
            state: PageRenderState::default(),
            image_names,
        }
    }

    pub fn finish(self) -> Content {
        self.content
    }

    pub fn draw_element(&mut self, el: &PositionedElement) -> Result<(), RenderError> {
        self.draw_background_and_borders(el);
        match &el.content {
            PositionedContent::Box => {}
            PositionedContent::Text { lines } => {
                if !lines.is_empty() {
                    self.draw_text(lines, el);
                }
            }
            PositionedContent::Image { resource, bounds } => self.draw_image(resource, bounds)?,
        }
        Ok(())
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.content.operations.push(Operation::new(operator, operands));
    }

    fn draw_background_and_borders(&mut self, el: &PositionedElement) {
        let style = &el.style;
        let x = el.x;
        let y = self.page_height - (el.y + el.height);
        if let Some(bg) = style.background_color {
            let [r, g, b] = bg.to_unit_rgb();
            self.push("rg", vec![r.into(), g.into(), b.into()]);
            self.push("re", vec![x.into(), y.into(), el.width.into(), el.height.into()]);
            self.push("f", vec![]);
            // The cached fill colour no longer matches the graphics state.
            self.state.fill_color = Some(bg);
        }
        if let Some(border) = style.border.filter(|b| b.width > 0.0) {
            let [r, g, b] = border.color.to_unit_rgb();
            self.push("w", vec![border.width.into()]);
            self.push("RG", vec![r.into(), g.into(), b.into()]);
            self.push("re", vec![x.into(), y.into(), el.width.into(), el.height.into()]);
            self.push("S", vec![]);
        }
    }

    fn set_font(&mut self, font: BuiltinFont, size: f32) {
        if self.state.font != Some(font) || self.state.font_size != size {
            self.push(
                "Tf",
                vec![Object::Name(font.resource_name().as_bytes().to_vec()), size.into()],
            );
            self.state.font = Some(font);
            self.state.font_size = size;
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color != Some(color) {
            let [r, g, b] = color.to_unit_rgb();
            self.push("rg", vec![r.into(), g.into(), b.into()]);
            self.state.fill_color = Some(color);
        }
    }

    fn draw_text(&mut self, lines: &[TextLine], el: &PositionedElement) {
        let style = &el.style;
        // Font state does not survive ET.
        self.state.font = None;
        self.push("BT", vec![]);
        self.set_font(style.font(), style.font_size);
        self.set_fill_color(style.color);
        let leading = (style.line_height - style.font_size).max(0.0) / 2.0;
        for line in lines.iter().filter(|l| !l.text.is_empty()) {
            let baseline_y = line.y + leading + style.font_size * 0.8;
            let pdf_y = self.page_height - baseline_y;
            // Tm sets an absolute position so lines need no relative bookkeeping.
            self.push(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), line.x.into(), pdf_y.into()],
            );
            self.push(
                "Tj",
                vec![Object::String(to_win_ansi(&line.text), StringFormat::Literal)],
            );
        }
        self.push("ET", vec![]);
    }

    fn draw_image(&mut self, resource: &ImageResource, bounds: &Rect) -> Result<(), RenderError> {
        let name = self.image_names.get(&resource.key).ok_or_else(|| {
            RenderError::Other(format!("Image '{}' was not registered", resource.key))
        })?;
        let y = self.page_height - bounds.bottom();
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![
                bounds.width.into(),
                0.into(),
                0.into(),
                bounds.height.into(),
                bounds.x.into(),
                y.into(),
            ],
        );
        self.push("Do", vec![Object::Name(name.as_bytes().to_vec())]);
        self.push("Q", vec![]);
        Ok(())
    }
}
