pub mod color;
pub mod document;
pub mod font;
pub mod geometry;
pub mod style;

pub use color::Color;
pub use document::{
    ImageData, ImageResource, LaidOutDocument, Page, PositionedContent, PositionedElement,
    TextLine,
};
pub use font::{BuiltinFont, win_ansi_byte};
pub use geometry::{Margins, PageLayout, PageSize, Rect};
pub use style::{Border, ComputedStyle, FontStyle, FontWeight, TextAlign, VerticalAlign};
