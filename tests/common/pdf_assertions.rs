use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object};

// WinAnsi bytes 0x80..=0x9F, indexed from 0x80. Undefined slots map to U+FFFD.
#[rustfmt::skip]
const WIN_ANSI_HIGH: [char; 32] = [
    '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}', '\u{017D}', '\u{FFFD}',
    '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
];

/// Decode a WinAnsi string operand
fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => WIN_ANSI_HIGH[usize::from(b - 0x80)],
            _ => b as char,
        })
        .collect()
}

/// Follows a reference to the dictionary it names, or returns an inline one.
fn resolve_dict<'a>(doc: &'a LopdfDocument, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        other => other.as_dict().ok(),
    }
}

/// Strings shown by `Tj` operators on a page, in drawing order
pub fn page_text_fragments(doc: &LopdfDocument, page_num: u32) -> Vec<String> {
    let pages = doc.get_pages();
    let Some(page_id) = pages.get(&page_num) else {
        return Vec::new();
    };
    let Ok(data) = doc.get_page_content(*page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&data) else {
        return Vec::new();
    };
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| op.operands.first())
        .filter_map(|obj| obj.as_str().ok())
        .map(decode_win_ansi)
        .collect()
}

/// Extract all text content from a PDF document, one line per fragment
pub fn extract_text(doc: &LopdfDocument) -> String {
    let mut text = String::new();
    for page_num in 1..=doc.get_pages().len() as u32 {
        for fragment in page_text_fragments(doc, page_num) {
            text.push_str(&fragment);
            text.push('\n');
        }
    }
    text
}

/// Fill colours (`rg` operands) set on a page
pub fn page_fill_colors(doc: &LopdfDocument, page_num: u32) -> Vec<[f32; 3]> {
    let pages = doc.get_pages();
    let Some(page_id) = pages.get(&page_num) else {
        return Vec::new();
    };
    let Some(content) = doc
        .get_page_content(*page_id)
        .ok()
        .and_then(|data| Content::decode(&data).ok())
    else {
        return Vec::new();
    };
    content
        .operations
        .iter()
        .filter(|op| op.operator == "rg" && op.operands.len() == 3)
        .filter_map(|op| {
            let channel = |i: usize| op.operands[i].as_float().ok();
            Some([channel(0)?, channel(1)?, channel(2)?])
        })
        .collect()
}

/// Names of the base fonts in every page's `Resources/Font` dictionary
pub fn extract_font_names(doc: &LopdfDocument) -> Vec<String> {
    let mut fonts = Vec::new();
    for page_id in doc.get_pages().values() {
        let Some(font_dict) = doc
            .get_dictionary(*page_id)
            .ok()
            .and_then(|page| page.get(b"Resources").ok())
            .and_then(|resources| resolve_dict(doc, resources))
            .and_then(|resources| resources.get(b"Font").ok())
            .and_then(|fonts| resolve_dict(doc, fonts))
        else {
            continue;
        };
        for (_, font) in font_dict.iter() {
            if let Some(name) = resolve_dict(doc, font)
                .and_then(|font| font.get(b"BaseFont").ok())
                .and_then(|name| name.as_name().ok())
            {
                fonts.push(String::from_utf8_lossy(name).into_owned());
            }
        }
    }
    fonts.sort();
    fonts.dedup();
    fonts
}

/// Number of image XObjects in the file
pub fn count_images(doc: &LopdfDocument) -> usize {
    doc.objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| matches!(stream.dict.get(b"Subtype").and_then(|s| s.as_name()), Ok(b"Image")))
        .count()
}

/// The Info dictionary's title, if any
pub fn document_title(doc: &LopdfDocument) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let title = doc.get_dictionary(info).ok()?.get(b"Title").ok()?.as_str().ok()?;
    Some(decode_win_ansi(title))
}

/// Get page dimensions (width, height) in points
pub fn get_page_dimensions(doc: &LopdfDocument, page_num: u32) -> Option<(f32, f32)> {
    let pages = doc.get_pages();
    let page_id = pages.get(&page_num)?;
    let page_dict = doc.get_object(*page_id).ok()?.as_dict().ok()?;
    let arr = page_dict.get(b"MediaBox").ok()?.as_array().ok()?;
    if arr.len() < 4 {
        return None;
    }
    let width = arr[2].as_float().ok()? - arr[0].as_float().ok()?;
    let height = arr[3].as_float().ok()? - arr[1].as_float().ok()?;
    Some((width, height))
}

// ============================================================================
// Fluent Assertion Macros
// ============================================================================

/// Assert that PDF contains specific text
#[macro_export]
macro_rules! assert_pdf_contains_text {
    ($pdf:expr, $text:expr) => {
        let extracted = $crate::common::pdf_assertions::extract_text(&$pdf.doc);
        assert!(
            extracted.contains($text),
            "PDF should contain '{}', but extracted text was:\n{}",
            $text,
            extracted
        );
    };
}

/// Assert that PDF does NOT contain specific text
#[macro_export]
macro_rules! assert_pdf_not_contains_text {
    ($pdf:expr, $text:expr) => {
        let extracted = $crate::common::pdf_assertions::extract_text(&$pdf.doc);
        assert!(
            !extracted.contains($text),
            "PDF should NOT contain '{}', but it was found in:\n{}",
            $text,
            extracted
        );
    };
}

/// Assert the number of pages in a PDF
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $count:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $pdf.page_count()
        );
    };
}

/// Assert minimum number of pages
#[macro_export]
macro_rules! assert_pdf_min_pages {
    ($pdf:expr, $min:expr) => {
        assert!(
            $pdf.page_count() >= $min,
            "Expected at least {} pages, got {}",
            $min,
            $pdf.page_count()
        );
    };
}

/// Assert that PDF contains a font matching a pattern
#[macro_export]
macro_rules! assert_pdf_has_font {
    ($pdf:expr, $pattern:expr) => {
        let fonts = $crate::common::pdf_assertions::extract_font_names(&$pdf.doc);
        assert!(
            fonts.iter().any(|f| f.contains($pattern)),
            "PDF should contain font matching '{}', fonts found: {:?}",
            $pattern,
            fonts
        );
    };
}

/// Assert page dimensions within tolerance
#[macro_export]
macro_rules! assert_pdf_page_size {
    ($pdf:expr, $page:expr, $width:expr, $height:expr) => {
        let dims = $crate::common::pdf_assertions::get_page_dimensions(&$pdf.doc, $page);
        assert!(dims.is_some(), "Could not get dimensions for page {}", $page);
        let (w, h) = dims.unwrap();
        assert!(
            (w - $width).abs() < 1.0,
            "Page {} width expected ~{}, got {}",
            $page,
            $width,
            w
        );
        assert!(
            (h - $height).abs() < 1.0,
            "Page {} height expected ~{}, got {}",
            $page,
            $height,
            h
        );
    };
}
