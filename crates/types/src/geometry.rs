use serde::{Deserialize, Serialize};

/// An axis-aligned box in points, measured from the top-left corner of the page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Margins {
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub right: f32,
    #[serde(default)]
    pub bottom: f32,
    #[serde(default)]
    pub left: f32,
}

impl Margins {
    pub const fn all(value: f32) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f32,
        height: f32,
    },
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Page geometry shared by every page of a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageLayout {
    pub size: PageSize,
    pub margins: Margins,
}

impl Default for PageLayout {
    /// A4 with half-inch margins.
    fn default() -> Self {
        PageLayout {
            size: PageSize::A4,
            margins: Margins::all(36.0),
        }
    }
}

impl PageLayout {
    pub fn content_width(&self) -> f32 {
        self.size.dimensions_pt().0 - self.margins.horizontal()
    }

    pub fn page_height(&self) -> f32 {
        self.size.dimensions_pt().1
    }

    /// The y coordinate below which content may not be placed.
    pub fn content_bottom(&self) -> f32 {
        self.page_height() - self.margins.bottom
    }
}
