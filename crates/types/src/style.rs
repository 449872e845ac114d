use crate::color::Color;
use crate::font::BuiltinFont;
use crate::geometry::Margins;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: Color,
}

impl Border {
    pub const fn thin(color: Color) -> Self {
        Self { width: 0.5, color }
    }
}

/// Fully resolved style of a laid-out element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub line_height: f32,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub color: Color,
    pub margin: Margins,
    pub padding: Margins,
    pub width: Option<f32>,
    pub background_color: Option<Color>,
    pub border: Option<Border>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        ComputedStyle {
            font_size: 12.0,
            font_weight: FontWeight::Regular,
            font_style: FontStyle::Normal,
            line_height: 14.4,
            text_align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            color: Color::BLACK,
            margin: Margins::default(),
            padding: Margins::default(),
            width: None,
            background_color: None,
            border: None,
        }
    }
}

impl ComputedStyle {
    /// Sets the font size and keeps the line height at 1.2em.
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self.line_height = size * 1.2;
        self
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = FontWeight::Bold;
        self
    }

    pub fn italic(mut self) -> Self {
        self.font_style = FontStyle::Italic;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.text_align = align;
        self
    }

    pub fn vertical_align(mut self, align: VerticalAlign) -> Self {
        self.vertical_align = align;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn padding(mut self, padding: Margins) -> Self {
        self.padding = padding;
        self
    }

    pub fn margin(mut self, margin: Margins) -> Self {
        self.margin = margin;
        self
    }

    pub fn border(mut self, border: Border) -> Self {
        self.border = Some(border);
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn font(&self) -> BuiltinFont {
        BuiltinFont::for_style(self.font_weight, self.font_style)
    }
}
