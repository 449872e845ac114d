//! The standard PDF Type1 fonts used by reports, with their advance widths.
//!
//! Reports only use the Helvetica family, which every PDF viewer ships, so no
//! font program is embedded. Widths come from the Adobe core font metrics and
//! are expressed in 1/1000 em.

use crate::style::{FontStyle, FontWeight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

const FALLBACK_WIDTH: u16 = 556;

// Advance widths for the printable ASCII range (0x20..=0x7E).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// WinAnsi code points 0x80..=0x9F that differ from Latin-1, with their
// regular and bold advance widths.
#[rustfmt::skip]
const WIN_ANSI_EXTRAS: [(char, u8, u16, u16); 27] = [
    ('\u{20AC}', 0x80, 556, 556), ('\u{201A}', 0x82, 222, 278), ('\u{0192}', 0x83, 556, 556),
    ('\u{201E}', 0x84, 333, 500), ('\u{2026}', 0x85, 1000, 1000), ('\u{2020}', 0x86, 556, 556),
    ('\u{2021}', 0x87, 556, 556), ('\u{02C6}', 0x88, 333, 333), ('\u{2030}', 0x89, 1000, 1000),
    ('\u{0160}', 0x8A, 667, 667), ('\u{2039}', 0x8B, 333, 333), ('\u{0152}', 0x8C, 1000, 1000),
    ('\u{017D}', 0x8E, 611, 611), ('\u{2018}', 0x91, 222, 278), ('\u{2019}', 0x92, 222, 278),
    ('\u{201C}', 0x93, 333, 500), ('\u{201D}', 0x94, 333, 500), ('\u{2022}', 0x95, 350, 350),
    ('\u{2013}', 0x96, 556, 556), ('\u{2014}', 0x97, 1000, 1000), ('\u{02DC}', 0x98, 333, 333),
    ('\u{2122}', 0x99, 1000, 1000), ('\u{0161}', 0x9A, 500, 556), ('\u{203A}', 0x9B, 333, 333),
    ('\u{0153}', 0x9C, 944, 944), ('\u{017E}', 0x9E, 500, 500), ('\u{0178}', 0x9F, 667, 667),
];

/// The WinAnsiEncoding byte for `c`, if the encoding has a glyph for it.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x00..=0x7F | 0xA0..=0xFF => Some(c as u8),
        _ => WIN_ANSI_EXTRAS.iter().find(|(ch, ..)| *ch == c).map(|(_, byte, ..)| *byte),
    }
}

impl BuiltinFont {
    pub const ALL: [BuiltinFont; 4] = [
        BuiltinFont::Helvetica,
        BuiltinFont::HelveticaBold,
        BuiltinFont::HelveticaOblique,
        BuiltinFont::HelveticaBoldOblique,
    ];

    pub fn for_style(weight: FontWeight, style: FontStyle) -> Self {
        match (weight, style) {
            (FontWeight::Regular, FontStyle::Normal) => BuiltinFont::Helvetica,
            (FontWeight::Bold, FontStyle::Normal) => BuiltinFont::HelveticaBold,
            (FontWeight::Regular, FontStyle::Italic) => BuiltinFont::HelveticaOblique,
            (FontWeight::Bold, FontStyle::Italic) => BuiltinFont::HelveticaBoldOblique,
        }
    }

    pub fn postscript_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::HelveticaOblique => "Helvetica-Oblique",
            BuiltinFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Name under which the font is registered in the page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F1",
            BuiltinFont::HelveticaBold => "F2",
            BuiltinFont::HelveticaOblique => "F3",
            BuiltinFont::HelveticaBoldOblique => "F4",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            BuiltinFont::Helvetica | BuiltinFont::HelveticaOblique => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold | BuiltinFont::HelveticaBoldOblique => {
                &HELVETICA_BOLD_WIDTHS
            }
        }
    }

    pub fn char_width(self, c: char) -> u16 {
        match c {
            ' '..='~' => self.widths()[c as usize - 0x20],
            _ => WIN_ANSI_EXTRAS
                .iter()
                .find(|(ch, ..)| *ch == c)
                .map(|&(_, _, regular, bold)| match self {
                    BuiltinFont::Helvetica | BuiltinFont::HelveticaOblique => regular,
                    BuiltinFont::HelveticaBold | BuiltinFont::HelveticaBoldOblique => bold,
                })
                .unwrap_or(FALLBACK_WIDTH),
        }
    }

    /// Width of `text` in points when set at `font_size`.
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * font_size / 1000.0
    }
}
