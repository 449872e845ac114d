use crate::error::RenderError;
use crate::images::image_xobject;
use crate::page::PageContext;
use crate::writer::PdfWriter;
use client_report_types::{BuiltinFont, LaidOutDocument, PositionedContent};
use lopdf::{Dictionary, Object, dictionary};
use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};

/// Renders a [`LaidOutDocument`] to PDF using the standard Helvetica fonts.
#[derive(Debug, Clone)]
pub struct LopdfRenderer {
    version: String,
}

impl Default for LopdfRenderer {
    fn default() -> Self {
        Self { version: "1.7".to_string() }
    }
}

impl LopdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the document into an in-memory PDF.
    pub fn render(&self, document: &LaidOutDocument) -> Result<Vec<u8>, RenderError> {
        let cursor = self.render_to(document, Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    pub fn render_to<W: Write + Seek>(
        &self,
        document: &LaidOutDocument,
        writer: W,
    ) -> Result<W, RenderError> {
        let mut pdf = PdfWriter::new(writer, &self.version, Self::font_dictionary())?;
        if let Some(title) = &document.title {
            pdf.set_title(title);
        }

        // Each distinct image is embedded once and shared by every page.
        let mut image_names: HashMap<String, String> = HashMap::new();
        for element in document.elements() {
            if let PositionedContent::Image { resource, .. } = &element.content
                && !image_names.contains_key(&resource.key)
            {
                let name = format!("Im{}", image_names.len() + 1);
                pdf.add_xobject(&name, image_xobject(resource));
                image_names.insert(resource.key.clone(), name);
            }
        }

        let (page_width, page_height) = document.page_layout.size.dimensions_pt();
        for page in &document.pages {
            let mut ctx = PageContext::new(page_height, &image_names);
            for element in &page.elements {
                ctx.draw_element(element)?;
            }
            let content_id = pdf.buffer_content_stream(ctx.finish())?;
            let page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pdf.pages_id,
                "MediaBox" => vec![0.0.into(), 0.0.into(), page_width.into(), page_height.into()],
                "Contents" => content_id,
                "Resources" => pdf.resources_id,
            };
            let page_id = pdf.buffer_object(page_dict.into());
            pdf.push_page_id(page_id);
        }
        log::debug!(
            "Rendered {} page(s) with {} embedded image(s)",
            document.pages.len(),
            image_names.len()
        );

        Ok(pdf.finish()?)
    }

    fn font_dictionary() -> Dictionary {
        let mut fonts = Dictionary::new();
        for font in BuiltinFont::ALL {
            let font_dict = dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.postscript_name(),
                "Encoding" => "WinAnsiEncoding",
            };
            fonts.set(font.resource_name().as_bytes(), Object::Dictionary(font_dict));
        }
        fonts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_report_types::{
        ComputedStyle, ImageData, ImageResource, Page, PageLayout, PositionedElement, Rect,
        TextLine,
    };
    use lopdf::content::Content;
    use std::sync::Arc;

    fn text_element(text: &str, y: f32) -> PositionedElement {
        PositionedElement {
            x: 36.0,
            y,
            width: 200.0,
            height: 14.4,
            content: PositionedContent::Text {
                lines: vec![TextLine { text: text.to_string(), x: 36.0, y, width: 50.0 }],
            },
            style: ComputedStyle::default(),
        }
    }

    fn page_strings(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> Vec<String> {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first())
            .filter_map(|obj| obj.as_str().ok())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    #[test]
    fn renders_pages_that_lopdf_can_read_back() {
        let document = LaidOutDocument {
            title: Some("Client Report".into()),
            page_layout: PageLayout::default(),
            pages: vec![
                Page { number: 1, elements: vec![text_element("Hello (world)", 36.0)] },
                Page { number: 2, elements: vec![text_element("Second", 36.0)] },
            ],
        };
        let bytes = LopdfRenderer::new().render(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(page_strings(&doc, pages[&1]), vec!["Hello (world)"]);
        assert_eq!(page_strings(&doc, pages[&2]), vec!["Second"]);
    }

    #[test]
    fn shared_image_is_embedded_once() {
        let resource = Arc::new(ImageResource {
            key: "logo".into(),
            width_px: 2,
            height_px: 1,
            data: ImageData::Rgb8(vec![255; 6]),
        });
        let image = |y: f32| PositionedElement {
            x: 36.0,
            y,
            width: 100.0,
            height: 50.0,
            content: PositionedContent::Image {
                resource: resource.clone(),
                bounds: Rect::new(36.0, y, 100.0, 50.0),
            },
            style: ComputedStyle::default(),
        };
        let document = LaidOutDocument {
            title: None,
            page_layout: PageLayout::default(),
            pages: vec![
                Page { number: 1, elements: vec![image(36.0)] },
                Page { number: 2, elements: vec![image(36.0)] },
            ],
        };
        let bytes = LopdfRenderer::new().render(&document).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let image_count = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| {
                stream.dict.get(b"Subtype").and_then(|s| s.as_name()).ok() == Some(b"Image".as_slice())
            })
            .count();
        assert_eq!(image_count, 1);
    }
}
