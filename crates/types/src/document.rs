use crate::geometry::{PageLayout, Rect};
use crate::style::ComputedStyle;
use std::sync::Arc;

/// Pixel data of an image ready to be embedded in a PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Baseline JPEG stream, embedded as-is.
    Jpeg { bytes: Vec<u8>, grayscale: bool },
    /// Uncompressed 8-bit RGB samples, row-major.
    Rgb8(Vec<u8>),
}

/// A decoded image shared by every element that draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    /// Identifies the image within a document so it is embedded once.
    pub key: String,
    pub width_px: u32,
    pub height_px: u32,
    pub data: ImageData,
}

impl ImageResource {
    /// Height divided by width; `1.0` for degenerate images.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width_px == 0 {
            1.0
        } else {
            self.height_px as f32 / self.width_px as f32
        }
    }
}

/// One line of text, already wrapped and aligned. `y` is the top of the line box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionedContent {
    /// Background and borders only.
    Box,
    Text { lines: Vec<TextLine> },
    Image { resource: Arc<ImageResource>, bounds: Rect },
}

/// A box placed on a page. Coordinates are in points from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedElement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub content: PositionedContent,
    pub style: ComputedStyle,
}

impl PositionedElement {
    /// The text carried by this element, lines joined with `\n`.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            PositionedContent::Text { lines } => Some(
                lines
                    .iter()
                    .map(|line| line.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub number: usize,
    pub elements: Vec<PositionedElement>,
}

impl Page {
    pub fn new(number: usize) -> Self {
        Self { number, elements: Vec::new() }
    }
}

/// The output of layout: every page with its positioned elements.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub title: Option<String>,
    pub page_layout: PageLayout,
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn elements(&self) -> impl Iterator<Item = &PositionedElement> {
        self.pages.iter().flat_map(|page| page.elements.iter())
    }

    /// All text of the document in drawing order.
    pub fn texts(&self) -> Vec<String> {
        self.elements().filter_map(PositionedElement::text).collect()
    }
}
